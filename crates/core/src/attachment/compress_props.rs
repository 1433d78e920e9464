//! Property-based tests for the compressibility classifier.

use proptest::prelude::*;

use super::compress::{is_compressible, rules};
use super::types::AttachmentMeta;

fn meta(content_type: Option<String>, encoding: Option<String>) -> AttachmentMeta {
    AttachmentMeta {
        content_type,
        encoding,
        ..AttachmentMeta::default()
    }
}

proptest! {
    /// A non-empty encoding always wins.
    #[test]
    fn prop_encoded_never_compressible(
        name in "[a-z]{1,12}(\\.[a-z0-9]{1,4})?",
        content_type in proptest::option::of("[a-z]{1,10}/[a-z+.-]{1,16}"),
        encoding in "[a-z]{1,8}",
    ) {
        prop_assert!(!is_compressible(&name, &meta(content_type, Some(encoding)), false));
    }

    /// A selected delta source always wins.
    #[test]
    fn prop_delta_never_compressible(
        name in "[a-z]{1,12}(\\.[a-z0-9]{1,4})?",
        content_type in proptest::option::of("[a-z]{1,10}/[a-z+.-]{1,16}"),
    ) {
        prop_assert!(!is_compressible(&name, &meta(content_type, None), true));
    }

    /// Media file extensions are never compressible, whatever the type says.
    #[test]
    fn prop_media_extension_not_compressible(
        stem in "[a-zA-Z0-9_-]{1,16}",
        ext in prop::sample::select(vec!["jpg", "JPEG", "png", "gif", "mp3", "mp4", "zip", "tgz", "7z"]),
        content_type in proptest::option::of("text/[a-z]{1,8}"),
    ) {
        let name = format!("{stem}.{ext}");
        prop_assert!(rules().filename_uncompressible(&name));
        prop_assert!(!is_compressible(&name, &meta(content_type, None), false));
    }

    /// Text types without a zip format in them are compressible.
    #[test]
    fn prop_text_types_compressible(subtype in "[a-y]{1,10}") {
        let content_type = format!("text/{subtype}");
        prop_assert!(rules().content_type_compressible(&content_type));
    }

    /// The classifier is a pure function of its inputs.
    #[test]
    fn prop_classification_is_stable(
        name in "[a-z]{1,12}(\\.[a-z0-9]{1,4})?",
        content_type in proptest::option::of("[a-z]{1,10}/[a-z+.-]{1,16}"),
    ) {
        let meta = meta(content_type, None);
        prop_assert_eq!(
            is_compressible(&name, &meta, false),
            is_compressible(&name, &meta, false)
        );
    }
}
