//! Attachment error types.

use thiserror::Error;

use syncgate_shared::AppError;

use crate::storage::StorageError;

/// Attachment operation errors.
///
/// Everything except [`AttachmentError::Storage`] and
/// [`AttachmentError::Repository`] is caused by the request body and is
/// reported back to the client as a validation failure.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// The `_attachments` property is not a map of metadata records.
    #[error("invalid _attachments: {0}")]
    InvalidAttachments(String),

    /// A non-stub attachment carries neither inline data nor a digest.
    #[error("missing data of attachment {0:?}")]
    MissingData(String),

    /// A stub attachment has no positive `revpos`.
    #[error("missing/invalid revpos in stub attachment {0:?}")]
    InvalidRevpos(String),

    /// A stub attachment can't be resolved through its parent and has no digest.
    #[error("missing digest in stub attachment {0:?}")]
    MissingDigest(String),

    /// Inline data could not be decoded.
    #[error("invalid attachment data: {0}")]
    InvalidData(String),

    /// Content store operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Revision tree lookup failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl AttachmentError {
    /// Create an invalid attachments map error.
    #[must_use]
    pub fn invalid_attachments(msg: impl Into<String>) -> Self {
        Self::InvalidAttachments(msg.into())
    }

    /// Create an invalid data error.
    #[must_use]
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Whether the error was caused by the caller's input.
    #[must_use]
    pub fn is_malformed_input(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Repository(_))
    }
}

impl From<AttachmentError> for AppError {
    fn from(err: AttachmentError) -> Self {
        match err {
            AttachmentError::Storage(StorageError::NotFound { key }) => {
                Self::NotFound(format!("attachment {key}"))
            }
            AttachmentError::Storage(storage_err) => Self::ExternalService(storage_err.to_string()),
            AttachmentError::Repository(msg) => Self::Database(msg),
            malformed => Self::Validation(malformed.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_input_classification() {
        assert!(AttachmentError::invalid_attachments("not a map").is_malformed_input());
        assert!(AttachmentError::MissingData("a.txt".into()).is_malformed_input());
        assert!(AttachmentError::InvalidRevpos("a.txt".into()).is_malformed_input());
        assert!(AttachmentError::MissingDigest("a.txt".into()).is_malformed_input());
        assert!(AttachmentError::invalid_data("bad base64").is_malformed_input());
        assert!(!AttachmentError::repository("down").is_malformed_input());
        assert!(!AttachmentError::Storage(StorageError::operation("down")).is_malformed_input());
    }

    #[test]
    fn test_into_app_error() {
        let err: AppError = AttachmentError::MissingData("a.txt".into()).into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Validation error: missing data of attachment \"a.txt\"");

        let err: AppError = AttachmentError::Storage(StorageError::not_found("k")).into();
        assert_eq!(err.status_code(), 404);

        let err: AppError = AttachmentError::Storage(StorageError::operation("io")).into();
        assert_eq!(err.error_code(), "EXTERNAL_SERVICE_ERROR");

        let err: AppError = AttachmentError::repository("timeout").into();
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }
}
