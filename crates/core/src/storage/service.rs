//! Storage service implementation using Apache OpenDAL.

use opendal::{ErrorKind, Operator, services};
use tracing::debug;

use syncgate_shared::StorageProvider;

use super::ContentStore;
use super::config::StorageConfig;
use super::error::StorageError;
use crate::attachment::{AttachmentError, Body};
use crate::revision::RevisionTree;

/// Blob and revision storage backed by an OpenDAL operator.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::Memory => {
                let builder = services::Memory::default();

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Address of the stored body of a revision.
    ///
    /// Format: `{revision_namespace}{doc_id}:{rev_id}`
    #[must_use]
    pub fn revision_address(&self, doc_id: &str, rev_id: &str) -> String {
        format!("{}{doc_id}:{rev_id}", self.config.revision_namespace)
    }

    /// Persist the body of a revision so later revisions can inherit from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the body can't be serialized or written.
    pub async fn put_revision_body(
        &self,
        doc_id: &str,
        rev_id: &str,
        body: &Body,
    ) -> Result<(), StorageError> {
        let address = self.revision_address(doc_id, rev_id);
        let json = serde_json::to_vec(body)
            .map_err(|e| StorageError::corrupt(address.clone(), e.to_string()))?;

        self.operator
            .write(&object_path(&address), json)
            .await
            .map_err(|e| StorageError::from_opendal(&address, &e))?;
        debug!(doc_id, rev_id, "stored revision body");
        Ok(())
    }

    /// Check if an object exists at `address`.
    pub async fn exists(&self, address: &str) -> bool {
        self.operator
            .exists(&object_path(address))
            .await
            .unwrap_or(false)
    }

    /// Prefix of attachment blob addresses.
    #[must_use]
    pub fn attachment_namespace(&self) -> &str {
        &self.config.attachment_namespace
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

impl ContentStore for StorageService {
    async fn get_raw(&self, address: &str) -> Result<Vec<u8>, StorageError> {
        let buffer = self
            .operator
            .read(&object_path(address))
            .await
            .map_err(|e| StorageError::from_opendal(address, &e))?;
        Ok(buffer.to_vec())
    }

    async fn put_raw(&self, address: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = object_path(address);

        // Content-addressed entries never change once written.
        let exists = self
            .operator
            .exists(&path)
            .await
            .map_err(|e| StorageError::from_opendal(address, &e))?;
        if exists {
            debug!(address, "object already stored");
            return Ok(());
        }

        self.operator
            .write(&path, data.to_vec())
            .await
            .map_err(|e| StorageError::from_opendal(address, &e))?;
        Ok(())
    }
}

impl RevisionTree for StorageService {
    async fn get_revision_body(
        &self,
        doc_id: &str,
        rev_id: &str,
    ) -> Result<Option<Body>, AttachmentError> {
        let address = self.revision_address(doc_id, rev_id);
        let buffer = match self.operator.read(&object_path(&address)).await {
            Ok(buffer) => buffer,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AttachmentError::repository(e.to_string())),
        };

        let value: serde_json::Value = serde_json::from_slice(&buffer.to_vec())
            .map_err(|e| AttachmentError::repository(format!("revision {address}: {e}")))?;
        Body::from_value(value)
            .map(Some)
            .map_err(|e| AttachmentError::repository(format!("revision {address}: {e}")))
    }
}

/// Map a store address to a flat object path.
///
/// Base64 keys may contain `/`, which object stores treat as a directory
/// separator; `%` is escaped first so the mapping stays reversible.
fn object_path(address: &str) -> String {
    address.replace('%', "%25").replace('/', "%2F")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn memory_service() -> StorageService {
        StorageService::from_config(StorageConfig::new(StorageProvider::Memory))
            .expect("should create service")
    }

    #[test]
    fn test_object_path() {
        assert_eq!(object_path("_sync:att:sha1-abc="), "_sync:att:sha1-abc=");
        assert_eq!(object_path("_sync:att:sha1-a/b+c="), "_sync:att:sha1-a%2Fb+c=");
        assert_eq!(object_path("a%2Fb"), "a%252Fb");
        assert_ne!(object_path("a/b"), object_path("a%2Fb"));
    }

    #[test]
    fn test_revision_address() {
        let service = memory_service();
        assert_eq!(service.revision_address("doc1", "2-abc"), "_sync:rev:doc1:2-abc");
        assert_eq!(service.provider_name(), "memory");
        assert_eq!(service.attachment_namespace(), "_sync:att:");
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let service = memory_service();
        service
            .put_raw("_sync:att:sha1-a/b=", b"payload")
            .await
            .expect("write succeeds");

        assert!(service.exists("_sync:att:sha1-a/b=").await);
        let data = service
            .get_raw("_sync:att:sha1-a/b=")
            .await
            .expect("read succeeds");
        assert_eq!(data, b"payload");
    }

    #[tokio::test]
    async fn test_put_existing_address_is_noop() {
        let service = memory_service();
        service.put_raw("k", b"first").await.expect("write succeeds");
        service.put_raw("k", b"first").await.expect("rewrite succeeds");
        assert_eq!(service.get_raw("k").await.expect("read succeeds"), b"first");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let service = memory_service();
        let err = service.get_raw("_sync:att:missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "object not found: _sync:att:missing");
    }

    #[tokio::test]
    async fn test_revision_body_round_trip() {
        let service = memory_service();
        let body = Body::from_value(json!({
            "title": "trip",
            "_attachments": {"a.txt": {"stub": true, "digest": "sha1-x", "revpos": 1}}
        }))
        .expect("valid body");

        service
            .put_revision_body("doc1", "1-abc", &body)
            .await
            .expect("write succeeds");

        let loaded = service
            .get_revision_body("doc1", "1-abc")
            .await
            .expect("read succeeds");
        assert_eq!(loaded, Some(body));
    }

    #[tokio::test]
    async fn test_missing_revision_is_none() {
        let service = memory_service();
        let loaded = service
            .get_revision_body("doc1", "9-zzz")
            .await
            .expect("lookup succeeds");
        assert!(loaded.is_none());
    }
}
