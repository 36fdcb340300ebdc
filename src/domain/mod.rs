mod bucket;
mod calendar;
mod money;
mod order;
mod window;

pub use bucket::*;
pub use calendar::*;
pub use money::*;
pub use order::*;
pub use window::*;
