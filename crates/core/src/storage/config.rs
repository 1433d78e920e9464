//! Storage configuration types.

use syncgate_shared::{StorageProvider, StorageSettings};

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Prefix of attachment blob addresses.
    pub attachment_namespace: String,
    /// Prefix of revision body addresses.
    pub revision_namespace: String,
}

impl StorageConfig {
    /// Default prefix isolating attachment blobs from documents.
    pub const DEFAULT_ATTACHMENT_NAMESPACE: &'static str = "_sync:att:";
    /// Default prefix of stored revision bodies.
    pub const DEFAULT_REVISION_NAMESPACE: &'static str = "_sync:rev:";

    /// Create a new storage config with default namespaces.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            attachment_namespace: Self::DEFAULT_ATTACHMENT_NAMESPACE.to_string(),
            revision_namespace: Self::DEFAULT_REVISION_NAMESPACE.to_string(),
        }
    }

    /// Create a config from the application settings.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(settings.provider.clone()).with_attachment_namespace(&settings.namespace)
    }

    /// Set the attachment namespace.
    #[must_use]
    pub fn with_attachment_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.attachment_namespace = namespace.into();
        self
    }

    /// Set the revision namespace.
    #[must_use]
    pub fn with_revision_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.revision_namespace = namespace.into();
        self
    }
}
