//! Delta resolution.
//!
//! Chooses between sending an attachment whole or as a delta against one of
//! the revisions the client already has. Cached outcomes are consulted before
//! anything is fetched, so repeated reads of the same pair cost one lookup.

use std::sync::Arc;

use tracing::debug;

use super::cache::{CachedDelta, DeltaCache};
use super::codec::DeltaCodec;
use crate::attachment::{AttachmentError, ContentKey};
use crate::storage::ContentStore;

/// Bytes to send for an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    /// Full content, or a delta if `delta_source` is set.
    pub data: Vec<u8>,
    /// Blob the delta is relative to.
    pub delta_source: Option<ContentKey>,
}

impl ResolvedAttachment {
    fn full(data: Vec<u8>) -> Self {
        Self {
            data,
            delta_source: None,
        }
    }

    fn delta(data: Vec<u8>, source: &ContentKey) -> Self {
        Self {
            data,
            delta_source: Some(source.clone()),
        }
    }
}

/// Resolves attachment bytes through the content store, the delta cache and
/// the delta codec.
pub struct DeltaResolver<S, C, X> {
    store: Arc<S>,
    cache: Arc<C>,
    codec: Arc<X>,
    namespace: String,
}

impl<S, C, X> DeltaResolver<S, C, X>
where
    S: ContentStore,
    C: DeltaCache,
    X: DeltaCodec,
{
    /// Create a resolver reading blobs stored under `namespace`.
    pub fn new(store: Arc<S>, cache: Arc<C>, codec: Arc<X>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            cache,
            codec,
            namespace: namespace.into(),
        }
    }

    /// Namespace blob addresses are formed with.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Fetch the full blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the blob is missing or can't be read.
    pub async fn get_attachment(&self, key: &ContentKey) -> Result<Vec<u8>, AttachmentError> {
        let data = self
            .store
            .get_raw(&key.storage_address(&self.namespace))
            .await?;
        Ok(data)
    }

    /// Bytes to send for `target`, as a delta against one of `sources` if
    /// that pays off.
    ///
    /// `sources` is ordered most preferred first. Missing or unusable
    /// candidates are skipped; only the target itself has to exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the target blob can't be fetched.
    pub async fn resolve(
        &self,
        target: &ContentKey,
        sources: &[ContentKey],
    ) -> Result<ResolvedAttachment, AttachmentError> {
        for source in sources {
            match self.cache.get(source, target).await {
                CachedDelta::Delta(delta) => {
                    debug!(target = %target, source = %source, "using cached delta");
                    return Ok(ResolvedAttachment::delta(delta, source));
                }
                CachedDelta::NotWorthIt => {
                    debug!(target = %target, source = %source, "delta known not worth using");
                    return Ok(ResolvedAttachment::full(self.get_attachment(target).await?));
                }
                CachedDelta::Miss => {}
            }
        }

        let target_data = self.get_attachment(target).await?;

        for source in sources {
            let source_data = match self.get_attachment(source).await {
                Ok(data) => data,
                Err(e) => {
                    debug!(source = %source, error = %e, "delta source unavailable, skipping");
                    continue;
                }
            };

            match self
                .codec
                .generate(source, &source_data, target, &target_data)
                .await
            {
                Ok(Some(delta)) => return Ok(ResolvedAttachment::delta(delta, source)),
                Ok(None) => break,
                Err(e) => {
                    debug!(source = %source, error = %e, "delta generation failed, skipping");
                }
            }
        }

        Ok(ResolvedAttachment::full(target_data))
    }
}
