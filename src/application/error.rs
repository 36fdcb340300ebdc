use thiserror::Error;

use crate::relay::TransportError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid evaluation instant '{0}': expected RFC 3339 (e.g. 2024-06-20T12:00:00+05:30)")]
    InvalidInstant(String),

    #[error("Invalid output format '{format}'. Valid formats: {valid}")]
    InvalidFormat { format: String, valid: &'static str },

    #[error("Relay bus closed before any orders were delivered")]
    BusClosed,

    #[error("Host page request failed: {0}")]
    HostRequest(#[from] TransportError),
}
