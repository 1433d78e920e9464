//! Attachments of document revisions.
//!
//! Attachment bytes live in a content-addressed store; revision bodies only
//! carry metadata records pointing at them. This module provides:
//! - Content keys (`sha1-` + base64 digest) and their store addresses
//! - The metadata model of revision bodies
//! - Ingestion of new revisions (inline data stored, stubs inherited)
//! - Discovery of the attachments a reader needs and per-request handles
//!   that load them, as deltas where that pays off
//!
//! # Reading a revision
//!
//! ```text
//! stored body ──mutable_attachments_copy──▶ copy
//!                                             │ find_attachments(min_revpos)
//!                                             ▼
//!                               [Attachment<'_>] ──load_data──▶ DeltaResolver
//! ```

mod compress;
mod discovery;
mod error;
mod handle;
mod key;
mod service;
mod types;

#[cfg(test)]
mod compress_props;
#[cfg(test)]
mod key_props;

pub use compress::{CompressionRules, is_compressible, rules as compression_rules};
pub use discovery::find_attachments;
pub use error::AttachmentError;
pub use handle::{Attachment, X_DELTA_SOURCE, ZDELTA_ENCODING};
pub use key::ContentKey;
pub use service::AttachmentService;
pub use types::{AttachmentData, AttachmentMap, AttachmentMeta, Body};
