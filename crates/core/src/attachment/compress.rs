//! Compressibility heuristics.
//!
//! Decides from metadata alone whether an attachment is worth delta
//! encoding. Unknown content is assumed compressible.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::AttachmentMeta;

/// Patterns used to classify attachments.
pub struct CompressionRules {
    compressed_types: Regex,
    good_types: Regex,
    bad_types: Regex,
    bad_filenames: Regex,
}

impl CompressionRules {
    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            compressed_types: Regex::new(r"(?i)\bg?zip\b")?,
            good_types: Regex::new(r"(?i)(^text)|(xml\b)|(\b(html|json|yaml)\b)")?,
            bad_types: Regex::new(r"(?i)^(audio|image|video)/")?,
            bad_filenames: Regex::new(
                r"(?i)\.(zip|t?gz|rar|7z|jpe?g|png|gif|svgz|mp3|m4a|ogg|wav|aiff|mp4|mov|avi|theora)$",
            )?,
        })
    }

    /// Whether a MIME type suggests compressible content.
    #[must_use]
    pub fn content_type_compressible(&self, content_type: &str) -> bool {
        if self.compressed_types.is_match(content_type) {
            false
        } else if self.good_types.is_match(content_type) {
            true
        } else {
            !self.bad_types.is_match(content_type)
        }
    }

    /// Whether a file name has an extension of already-compressed media.
    #[must_use]
    pub fn filename_uncompressible(&self, name: &str) -> bool {
        self.bad_filenames.is_match(name)
    }

    /// Whether the attachment `name` described by `meta` is compressible.
    ///
    /// Encoded content and content already selected as a delta never are.
    #[must_use]
    pub fn is_compressible(&self, name: &str, meta: &AttachmentMeta, delta_selected: bool) -> bool {
        if meta.encoding.as_deref().is_some_and(|e| !e.is_empty()) || delta_selected {
            return false;
        }
        if self.filename_uncompressible(name) {
            return false;
        }
        meta.content_type
            .as_deref()
            .is_none_or(|content_type| self.content_type_compressible(content_type))
    }
}

/// Shared rule set; the patterns are constant.
static RULES: Lazy<CompressionRules> =
    Lazy::new(|| CompressionRules::build().expect("compression patterns are valid"));

/// The process-wide rule set.
#[must_use]
pub fn rules() -> &'static CompressionRules {
    &RULES
}

/// Shorthand for [`CompressionRules::is_compressible`] on the shared rules.
#[must_use]
pub fn is_compressible(name: &str, meta: &AttachmentMeta, delta_selected: bool) -> bool {
    RULES.is_compressible(name, meta, delta_selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn typed(content_type: Option<&str>) -> AttachmentMeta {
        AttachmentMeta {
            content_type: content_type.map(str::to_string),
            ..AttachmentMeta::default()
        }
    }

    #[rstest]
    #[case("photo", Some("image/jpeg"), false)]
    #[case("notes", Some("text/plain"), true)]
    #[case("logo", Some("image/svg+xml"), true)]
    #[case("page", Some("text/html; charset=utf-8"), true)]
    #[case("data", Some("application/json"), true)]
    #[case("config", Some("application/x-yaml"), true)]
    #[case("feed", Some("application/atom+xml"), true)]
    #[case("archive", Some("application/zip"), false)]
    #[case("archive", Some("application/gzip"), false)]
    #[case("archive", Some("application/x-gzip"), false)]
    #[case("song", Some("audio/mpeg"), false)]
    #[case("clip", Some("VIDEO/mp4"), false)]
    #[case("blob", Some("application/octet-stream"), true)]
    #[case("blob", None, true)]
    #[case("movie.mp4", None, false)]
    #[case("movie.MP4", Some("text/plain"), false)]
    #[case("backup.tar.gz", None, false)]
    #[case("backup.tgz", None, false)]
    #[case("icon.svgz", Some("image/svg+xml"), false)]
    #[case("readme.txt", None, true)]
    #[case("photo.jpeg.txt", None, true)]
    fn test_classification(
        #[case] name: &str,
        #[case] content_type: Option<&str>,
        #[case] expected: bool,
    ) {
        assert_eq!(is_compressible(name, &typed(content_type), false), expected);
    }

    #[test]
    fn test_encoded_content_not_compressible() {
        let meta = AttachmentMeta {
            encoding: Some("gzip".into()),
            ..typed(Some("text/plain"))
        };
        assert!(!is_compressible("notes.txt", &meta, false));
    }

    #[test]
    fn test_empty_encoding_ignored() {
        let meta = AttachmentMeta {
            encoding: Some(String::new()),
            ..typed(Some("text/plain"))
        };
        assert!(is_compressible("notes.txt", &meta, false));
    }

    #[test]
    fn test_selected_delta_not_compressible() {
        assert!(!is_compressible("notes.txt", &typed(Some("text/plain")), true));
    }
}
