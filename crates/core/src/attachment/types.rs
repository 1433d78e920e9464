//! Attachment metadata records and the revision bodies that own them.

use std::borrow::Cow;
use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::AttachmentError;
use super::key::ContentKey;

/// Attachments of a revision, keyed by attachment name.
pub type AttachmentMap = BTreeMap<String, AttachmentMeta>;

/// Inline attachment bytes.
///
/// JSON bodies carry base64 text; bytes loaded from the store are kept
/// decoded. Both serialize as base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum AttachmentData {
    /// Decoded bytes.
    Raw(Vec<u8>),
    /// Base64 text as received.
    Base64(String),
}

impl AttachmentData {
    /// Returns the decoded bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::InvalidData`] if base64 text does not decode.
    pub fn decode(&self) -> Result<Cow<'_, [u8]>, AttachmentError> {
        match self {
            Self::Raw(bytes) => Ok(Cow::Borrowed(bytes)),
            Self::Base64(text) => STANDARD
                .decode(text)
                .map(Cow::Owned)
                .map_err(|e| AttachmentError::invalid_data(e.to_string())),
        }
    }

    /// Decoded bytes, if no decoding is needed to get them.
    #[must_use]
    pub fn raw(&self) -> Option<&[u8]> {
        match self {
            Self::Raw(bytes) => Some(bytes),
            Self::Base64(_) => None,
        }
    }
}

impl TryFrom<Value> for AttachmentData {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(Self::Base64(text)),
            other => Err(format!(
                "invalid attachment data (type {})",
                json_type_name(&other)
            )),
        }
    }
}

impl From<AttachmentData> for Value {
    fn from(data: AttachmentData) -> Self {
        match data {
            AttachmentData::Raw(bytes) => Value::String(STANDARD.encode(bytes)),
            AttachmentData::Base64(text) => Value::String(text),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Metadata record of one attachment, embedded in a revision body.
///
/// Unknown fields are kept in `extra` so they survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    /// Content key of the stored blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<ContentKey>,
    /// Generation at which the content last changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revpos: Option<u64>,
    /// The record carries no inline bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stub: Option<bool>,
    /// The bytes travel as a separate MIME part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follows: Option<bool>,
    /// Inline bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AttachmentData>,
    /// MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Content encoding of the stored bytes, e.g. `gzip`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Decoded length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    /// Length of the stored (encoded) bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_length: Option<u64>,
    /// Delta source of `data`, if `data` is a delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zdeltasrc: Option<ContentKey>,
    /// Fields this version does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AttachmentMeta {
    /// Normalized stub pointing at stored content.
    #[must_use]
    pub fn stub(digest: ContentKey, revpos: u64) -> Self {
        Self {
            digest: Some(digest),
            revpos: Some(revpos),
            stub: Some(true),
            ..Self::default()
        }
    }

    /// Whether `stub` is set to true.
    #[must_use]
    pub fn is_stub(&self) -> bool {
        self.stub == Some(true)
    }

    /// Whether `follows` is set to true.
    #[must_use]
    pub fn is_follows(&self) -> bool {
        self.follows == Some(true)
    }
}

/// One revision of a document.
///
/// The body owns the metadata records of its attachments; handles only
/// borrow them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(
        rename = "_attachments",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    attachments: Option<AttachmentMap>,
    #[serde(flatten)]
    properties: Map<String, Value>,
}

impl Body {
    /// Parses a JSON document body.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::InvalidAttachments`] if the body is not an
    /// object, or if `_attachments` is not a map of metadata records.
    pub fn from_value(value: Value) -> Result<Self, AttachmentError> {
        if !value.is_object() {
            return Err(AttachmentError::invalid_attachments(
                "document body is not an object",
            ));
        }
        serde_json::from_value(value).map_err(|e| AttachmentError::invalid_attachments(e.to_string()))
    }

    /// Serializes the body back to JSON.
    #[must_use]
    pub fn to_value(&self) -> Value {
        // Map keys are always strings, so this can't fail.
        serde_json::to_value(self).unwrap_or_default()
    }

    /// The attachment map, if the body has one.
    #[must_use]
    pub fn attachments(&self) -> Option<&AttachmentMap> {
        self.attachments.as_ref()
    }

    /// Mutable access to the attachment map.
    pub fn attachments_mut(&mut self) -> Option<&mut AttachmentMap> {
        self.attachments.as_mut()
    }

    /// Metadata of one attachment.
    #[must_use]
    pub fn attachment(&self, name: &str) -> Option<&AttachmentMeta> {
        self.attachments.as_ref()?.get(name)
    }

    /// Adds or replaces an attachment record, creating the map if needed.
    pub fn set_attachment(&mut self, name: impl Into<String>, meta: AttachmentMeta) {
        self.attachments
            .get_or_insert_with(AttachmentMap::new)
            .insert(name.into(), meta);
    }

    /// The digests of all attachments, keyed by attachment name.
    ///
    /// Attachments without a digest are left out.
    #[must_use]
    pub fn attachment_digests(&self) -> BTreeMap<String, ContentKey> {
        self.attachments
            .iter()
            .flatten()
            .filter_map(|(name, meta)| Some((name.clone(), meta.digest.clone()?)))
            .collect()
    }

    /// A copy whose attachment records may be mutated without affecting `self`.
    #[must_use]
    pub fn mutable_attachments_copy(&self) -> Self {
        self.clone()
    }

    /// A document property other than `_attachments`.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Sets a document property other than `_attachments`.
    pub fn set_property(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }
}

impl TryFrom<Value> for Body {
    type Error = AttachmentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}
