//! Library error types

use thiserror::Error;

/// Errors raised while configuring a capture
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// The entry buffer must hold at least one entry
    #[error("invalid buffer capacity {0}: must be at least 1")]
    InvalidCapacity(usize),
}
