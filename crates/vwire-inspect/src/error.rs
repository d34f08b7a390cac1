use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while reading input or writing reports.
///
/// Decode failures are not errors here: they become part of the report.
#[derive(Debug, Error)]
pub enum InspectError {
    /// An input line or argument is not valid hexadecimal.
    #[error("invalid hex in {input}: {reason}")]
    InvalidHex { input: String, reason: String },

    /// Writing a report failed.
    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),

    /// A report could not be serialized to JSON.
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    /// The listen socket could not be bound.
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
