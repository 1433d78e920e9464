//! Per-request attachment handles.

use http::header::{CONTENT_DISPOSITION, CONTENT_ENCODING, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use super::compress;
use super::error::AttachmentError;
use super::key::ContentKey;
use super::types::{AttachmentData, AttachmentMeta};
use crate::delta::{DeltaCache, DeltaCodec, DeltaResolver};
use crate::storage::ContentStore;

/// Header naming the blob a delta-encoded body is relative to.
pub static X_DELTA_SOURCE: HeaderName = HeaderName::from_static("x-delta-source");

/// `Content-Encoding` of delta-encoded bodies.
pub const ZDELTA_ENCODING: &str = "zdelta";

/// One attachment of a revision being read.
///
/// Borrows its metadata record from the body copy it was found in, so
/// loading data or switching to an out-of-band part updates that copy and
/// nothing else. Handles live for one request and are never shared.
#[derive(Debug)]
pub struct Attachment<'b> {
    name: String,
    meta: &'b mut AttachmentMeta,
    following_data: Option<Vec<u8>>,
    possible_delta_sources: Vec<ContentKey>,
    delta_source: Option<ContentKey>,
}

impl<'b> Attachment<'b> {
    /// Wrap the record of attachment `name`.
    pub fn new(name: impl Into<String>, meta: &'b mut AttachmentMeta) -> Self {
        Self {
            name: name.into(),
            meta,
            following_data: None,
            possible_delta_sources: Vec::new(),
            delta_source: None,
        }
    }

    /// Set the blobs a delta may be computed against, most preferred first.
    #[must_use]
    pub fn with_delta_sources(mut self, sources: Vec<ContentKey>) -> Self {
        self.possible_delta_sources = sources;
        self
    }

    /// Attachment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying metadata record.
    pub fn meta(&self) -> &AttachmentMeta {
        self.meta
    }

    /// MIME type, if known.
    pub fn content_type(&self) -> Option<&str> {
        self.meta.content_type.as_deref()
    }

    /// Content key of the attachment.
    pub fn key(&self) -> Option<&ContentKey> {
        self.meta.digest.as_ref()
    }

    /// Candidate delta sources, most preferred first.
    pub fn possible_delta_sources(&self) -> &[ContentKey] {
        &self.possible_delta_sources
    }

    /// The delta source the loaded data is relative to.
    pub fn delta_source(&self) -> Option<&ContentKey> {
        self.delta_source.as_ref()
    }

    /// Headers describing the attachment's bytes.
    ///
    /// With `full` set the headers describe a whole response body, otherwise
    /// a MIME part of a multipart response.
    pub fn headers(&self, full: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Some(source) = &self.delta_source {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static(ZDELTA_ENCODING));
            self.insert(&mut headers, X_DELTA_SOURCE.clone(), source.as_str());
        } else if let Some(encoding) = self.meta.encoding.as_deref() {
            self.insert(&mut headers, CONTENT_ENCODING, encoding);
        }

        if full {
            if let Some(content_type) = self.content_type() {
                self.insert(&mut headers, CONTENT_TYPE, content_type);
            }
        } else {
            let disposition = format!("attachment; filename={:?}", self.name);
            self.insert(&mut headers, CONTENT_DISPOSITION, &disposition);
        }

        headers
    }

    fn insert(&self, headers: &mut HeaderMap, name: HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(e) => {
                warn!(
                    attachment = %self.name,
                    header = %name,
                    error = %e,
                    "skipping invalid header value"
                );
            }
        }
    }

    /// Bytes resolved so far, without doing any I/O.
    ///
    /// An out-of-band buffer takes precedence over inline data. Inline base64
    /// text that was never decoded does not count.
    pub fn data(&self) -> Option<&[u8]> {
        self.following_data
            .as_deref()
            .or_else(|| self.meta.data.as_ref().and_then(AttachmentData::raw))
    }

    /// The attachment's bytes, loading them through `resolver` if needed.
    ///
    /// Delta candidates are only considered when `delta_ok` is set and the
    /// content is compressible. The loaded bytes are cached inline in the
    /// record, which stops being a stub; `zdeltasrc` names the delta source if
    /// one was used.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::MissingDigest`] if the record has no digest,
    /// or a storage error if the blob can't be fetched.
    pub async fn load_data<S, C, X>(
        &mut self,
        resolver: &DeltaResolver<S, C, X>,
        delta_ok: bool,
    ) -> Result<&[u8], AttachmentError>
    where
        S: ContentStore,
        C: DeltaCache,
        X: DeltaCodec,
    {
        if self.data().is_none() {
            let key = self
                .key()
                .cloned()
                .ok_or_else(|| AttachmentError::MissingDigest(self.name.clone()))?;
            let use_delta =
                delta_ok && !self.possible_delta_sources.is_empty() && self.compressible();
            let sources: &[ContentKey] = if use_delta {
                &self.possible_delta_sources
            } else {
                &[]
            };

            let resolved = resolver.resolve(&key, sources).await?;

            self.meta.data = Some(AttachmentData::Raw(resolved.data));
            self.meta.stub = None;
            if let Some(source) = &resolved.delta_source {
                self.meta.zdeltasrc = Some(source.clone());
            }
            self.possible_delta_sources = resolved.delta_source.iter().cloned().collect();
            self.delta_source = resolved.delta_source;
        }

        Ok(self.data().unwrap_or_default())
    }

    /// Whether the bytes travel as a separate MIME part.
    pub fn follows(&self) -> bool {
        self.meta.is_follows()
    }

    /// Move inline data out of the record into an out-of-band part.
    ///
    /// Does nothing if the record has no inline data.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::InvalidData`] if inline base64 text doesn't
    /// decode; the record is left unchanged.
    pub fn set_follows(&mut self) -> Result<(), AttachmentError> {
        let Some(data) = &self.meta.data else {
            return Ok(());
        };
        let bytes = data.decode()?.into_owned();

        self.meta.data = None;
        self.following_data = Some(bytes);
        self.meta.zdeltasrc = None;
        self.meta.follows = Some(true);
        Ok(())
    }

    /// Whether the attachment is worth compressing.
    pub fn compressible(&self) -> bool {
        compress::is_compressible(&self.name, self.meta, self.delta_source.is_some())
    }
}
