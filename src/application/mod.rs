// Application layer - use cases on top of the domain types.
// The aggregation engine is pure; the relay (crate::relay) feeds it payloads.

pub mod analysis;
pub mod error;
pub mod reporting;

pub use analysis::*;
pub use error::*;
pub use reporting::*;
