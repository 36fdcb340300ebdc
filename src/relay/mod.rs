// Cross-context relay: the privileged agent obtains past-orders payloads
// (ambient capture or on-demand fetch) and posts them on the document bus,
// where the consumer picks them up.

mod agent;
mod bus;
mod capture;
mod consumer;
mod message;
mod session;
mod transport;

pub use agent::*;
pub use bus::*;
pub use capture::*;
pub use consumer::*;
pub use message::*;
pub use session::*;
pub use transport::*;
