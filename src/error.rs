//! Error types for packfs
//!
//! Construction and loading go through [`Error`]. The overlay's dispatch
//! operations return `std::io::Result` instead, so a failure on a virtual
//! path has the same shape as the real filesystem operation it overlays.

use thiserror::Error;

/// Crate-level result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing or loading the overlay
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The packager's resource payload was not present at startup. There is
    /// no degraded mode without a manifest.
    #[error("packed resource layout missing: {0}")]
    LayoutMissing(String),

    /// The resource payload was present but not decodable
    #[error("malformed resource payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The container file could not be located
    #[error("container file unavailable: {0}")]
    Container(String),
}
