//! Access to the revision tree of a document.

use std::future::Future;

use crate::attachment::{AttachmentError, Body};

/// Looks up stored revision bodies.
///
/// This trait is implemented by whatever keeps document history; the
/// attachment subsystem only needs to read a parent revision's body.
pub trait RevisionTree: Send + Sync {
    /// Body of revision `rev_id` of document `doc_id`, if it is still available.
    fn get_revision_body(
        &self,
        doc_id: &str,
        rev_id: &str,
    ) -> impl Future<Output = Result<Option<Body>, AttachmentError>> + Send;
}

/// Generation number of a `"{generation}-{suffix}"` revision ID.
///
/// Returns `None` if the ID is malformed or the generation is zero.
#[must_use]
pub fn generation_of(rev_id: &str) -> Option<u64> {
    let (generation, suffix) = rev_id.split_once('-')?;
    if suffix.is_empty() {
        return None;
    }
    generation.parse::<u64>().ok().filter(|g| *g > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_of() {
        assert_eq!(generation_of("1-abc"), Some(1));
        assert_eq!(generation_of("42-0f3e"), Some(42));
    }

    #[test]
    fn test_generation_of_malformed() {
        assert_eq!(generation_of("abc"), None);
        assert_eq!(generation_of("0-abc"), None);
        assert_eq!(generation_of("-abc"), None);
        assert_eq!(generation_of("3-"), None);
        assert_eq!(generation_of("x-abc"), None);
    }
}
