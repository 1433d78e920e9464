//! Finding the attachments of a revision that need to be sent.

use std::collections::BTreeMap;

use super::handle::Attachment;
use super::key::ContentKey;
use super::types::Body;

/// Handles for the attachments of `body` changed at or after `min_revpos`.
///
/// `body` should be a [`Body::mutable_attachments_copy`] of the stored
/// revision: the handles borrow its records and mutate them as data is
/// loaded. Records without a `revpos`, or with one below `min_revpos`, are
/// left out since the client already has them.
///
/// `delta_sources` maps attachment names to a blob the client is known to
/// have; a handle whose name is in it gets that blob as its only delta
/// candidate.
pub fn find_attachments<'b>(
    body: &'b mut Body,
    min_revpos: u64,
    delta_sources: &BTreeMap<String, ContentKey>,
) -> Vec<Attachment<'b>> {
    let Some(attachments) = body.attachments_mut() else {
        return Vec::new();
    };

    attachments
        .iter_mut()
        .filter(|(_, meta)| meta.revpos.is_some_and(|revpos| revpos >= min_revpos))
        .map(|(name, meta)| {
            let sources = delta_sources.get(name).cloned().into_iter().collect();
            Attachment::new(name.clone(), meta).with_delta_sources(sources)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::AttachmentMeta;
    use crate::delta::{DeltaResolver, NoDelta};
    use crate::storage::{ContentStore, StorageConfig, StorageService};
    use serde_json::json;
    use std::sync::Arc;
    use syncgate_shared::StorageProvider;

    const NAMESPACE: &str = "_sync:att:";

    fn body() -> Body {
        Body::from_value(json!({
            "_attachments": {
                "old.txt": {"stub": true, "digest": "sha1-old", "revpos": 1},
                "new.txt": {"stub": true, "digest": "sha1-new", "revpos": 3},
                "newer.txt": {"stub": true, "digest": "sha1-newer", "revpos": 4},
                "unversioned.txt": {"stub": true, "digest": "sha1-x"}
            }
        }))
        .expect("valid body")
    }

    fn names(handles: &[Attachment<'_>]) -> Vec<String> {
        handles.iter().map(|a| a.name().to_string()).collect()
    }

    #[test]
    fn test_filters_by_revpos() {
        let mut copy = body().mutable_attachments_copy();
        let handles = find_attachments(&mut copy, 3, &BTreeMap::new());
        assert_eq!(names(&handles), ["new.txt", "newer.txt"]);
    }

    #[test]
    fn test_min_revpos_zero_keeps_versioned_records() {
        let mut copy = body().mutable_attachments_copy();
        let handles = find_attachments(&mut copy, 0, &BTreeMap::new());
        assert_eq!(names(&handles), ["new.txt", "newer.txt", "old.txt"]);
    }

    #[test]
    fn test_delta_sources_seed_candidates() {
        let mut copy = body().mutable_attachments_copy();
        let sources = BTreeMap::from([("new.txt".to_string(), ContentKey::new("sha1-prev"))]);
        let handles = find_attachments(&mut copy, 3, &sources);

        let new = handles.iter().find(|a| a.name() == "new.txt").expect("found");
        assert_eq!(new.possible_delta_sources(), [ContentKey::new("sha1-prev")]);
        let newer = handles.iter().find(|a| a.name() == "newer.txt").expect("found");
        assert!(newer.possible_delta_sources().is_empty());
    }

    #[test]
    fn test_body_without_attachments() {
        let mut copy = Body::default();
        assert!(find_attachments(&mut copy, 0, &BTreeMap::new()).is_empty());
    }

    #[tokio::test]
    async fn test_loading_mutates_only_the_copy() {
        let store = Arc::new(
            StorageService::from_config(StorageConfig::new(StorageProvider::Memory))
                .expect("should create service"),
        );
        let key = ContentKey::for_data(b"newest");
        store
            .put_raw(&key.storage_address(NAMESPACE), b"newest")
            .await
            .expect("write succeeds");
        let resolver = DeltaResolver::new(store, Arc::new(NoDelta), Arc::new(NoDelta), NAMESPACE);

        let mut original = Body::default();
        original.set_attachment("a.bin", AttachmentMeta::stub(key, 5));

        let mut copy = original.mutable_attachments_copy();
        for mut handle in find_attachments(&mut copy, 5, &BTreeMap::new()) {
            handle.load_data(&resolver, true).await.expect("loads");
            handle.set_follows().expect("raw data");
        }

        assert!(original.attachment("a.bin").is_some_and(AttachmentMeta::is_stub));
        let loaded = copy.attachment("a.bin").expect("present");
        assert!(loaded.is_follows());
        assert!(!loaded.is_stub());
        assert!(loaded.data.is_none());
    }
}
