//! Attachment ingestion.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::error::AttachmentError;
use super::key::ContentKey;
use super::types::{AttachmentMeta, Body};
use crate::revision::RevisionTree;
use crate::storage::ContentStore;

/// Stores the attachments of new revisions.
///
/// Inline data is written to the content store and replaced by a stub; stubs
/// are resolved against the parent revision so unchanged attachments are
/// carried forward without touching the store.
pub struct AttachmentService<S, R> {
    store: Arc<S>,
    revisions: Arc<R>,
    namespace: String,
}

impl<S: ContentStore, R: RevisionTree> AttachmentService<S, R> {
    /// Create a service writing blobs under `namespace`.
    #[must_use]
    pub fn new(store: Arc<S>, revisions: Arc<R>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            revisions,
            namespace: namespace.into(),
        }
    }

    /// Parse a raw revision body and store its attachments.
    ///
    /// A malformed `_attachments` property is rejected before anything is
    /// written.
    ///
    /// # Errors
    ///
    /// See [`AttachmentService::store_attachments`].
    pub async fn ingest(
        &self,
        doc_id: &str,
        raw: Value,
        generation: u64,
        parent_rev: Option<&str>,
    ) -> Result<Body, AttachmentError> {
        let mut body = Body::from_value(raw)?;
        self.store_attachments(doc_id, &mut body, generation, parent_rev)
            .await?;
        Ok(body)
    }

    /// Store the attachments of revision `generation` of `doc_id`, rewriting
    /// `body` so that every attachment is a stub.
    ///
    /// `parent_rev` is looked up at most once, and only if some attachment
    /// is a stub.
    ///
    /// # Errors
    ///
    /// Returns a malformed-input error for undecodable data, a stub without
    /// a valid `revpos`, or a stub that neither the parent nor its own
    /// `digest` resolves. Store and revision tree failures are propagated.
    pub async fn store_attachments(
        &self,
        doc_id: &str,
        body: &mut Body,
        generation: u64,
        parent_rev: Option<&str>,
    ) -> Result<(), AttachmentError> {
        let Some(attachments) = body.attachments_mut() else {
            return Ok(());
        };

        let mut parent: Option<Option<Body>> = None;

        for (name, meta) in attachments.iter_mut() {
            if meta.data.is_some() {
                *meta = self.store_inline(doc_id, name, meta, generation).await?;
                continue;
            }

            if !meta.is_stub() {
                return Err(AttachmentError::MissingData(name.clone()));
            }
            if meta.revpos.is_none_or(|revpos| revpos == 0) {
                return Err(AttachmentError::InvalidRevpos(name.clone()));
            }

            if parent.is_none() {
                let fetched = match parent_rev {
                    Some(rev_id) => self.revisions.get_revision_body(doc_id, rev_id).await?,
                    None => None,
                };
                parent = Some(fetched);
            }

            let inherited = parent
                .as_ref()
                .and_then(Option::as_ref)
                .and_then(|body| body.attachment(name));
            match inherited {
                Some(record) => *meta = record.clone(),
                None if meta.digest.is_none() => {
                    return Err(AttachmentError::MissingDigest(name.clone()));
                }
                None => {}
            }
        }

        Ok(())
    }

    /// Write the inline data of `meta` and return the stub replacing it.
    async fn store_inline(
        &self,
        doc_id: &str,
        name: &str,
        meta: &AttachmentMeta,
        generation: u64,
    ) -> Result<AttachmentMeta, AttachmentError> {
        let Some(data) = &meta.data else {
            return Err(AttachmentError::MissingData(name.to_string()));
        };
        let raw = data.decode()?;
        let key = ContentKey::for_data(&raw);
        let raw_len = u64::try_from(raw.len()).unwrap_or(u64::MAX);

        self.store
            .put_raw(&key.storage_address(&self.namespace), &raw)
            .await?;
        debug!(doc_id, attachment = name, key = %key, size = raw_len, "stored attachment");

        let mut stub = AttachmentMeta::stub(key, generation);
        stub.content_type.clone_from(&meta.content_type);
        if let Some(encoding) = &meta.encoding {
            stub.encoding = Some(encoding.clone());
            stub.encoded_length = Some(raw_len);
            stub.length = meta.length;
        } else {
            stub.length = Some(raw_len);
        }
        Ok(stub)
    }
}
