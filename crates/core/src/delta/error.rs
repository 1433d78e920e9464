//! Delta error types.

use thiserror::Error;

/// Delta generation errors.
///
/// These are never fatal to a request; the resolver falls back to the full
/// attachment.
#[derive(Debug, Error)]
pub enum DeltaError {
    /// The encoder failed on this source/target pair.
    #[error("delta encoding failed: {0}")]
    Encoding(String),
}

impl DeltaError {
    /// Create an encoding error.
    #[must_use]
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }
}
