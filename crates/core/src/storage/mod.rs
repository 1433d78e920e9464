//! Content-addressed blob storage using Apache OpenDAL.
//!
//! This module provides the content store the attachment subsystem writes
//! blobs to, with support for:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem (development only)
//! - Memory (tests only)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                             │
//! │                   (Unified Storage API)                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ get_raw("_sync:att:sha1-…")   │ op.read(object_path(address))   │
//! │ put_raw("_sync:att:sha1-…")   │ op.exists(..) then op.write(..) │
//! │ get_revision_body(doc, rev)   │ op.read("_sync:rev:doc:rev")    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod service;

use std::future::Future;

pub use config::StorageConfig;
pub use error::StorageError;
pub use service::StorageService;

/// Raw key-value access to the shared blob store.
///
/// Addresses are namespace-prefixed content keys. Entries are immutable, so
/// implementations must treat a write to an existing address as a no-op or a
/// harmless overwrite.
pub trait ContentStore: Send + Sync {
    /// Read the bytes stored at `address`.
    ///
    /// Returns [`StorageError::NotFound`] if nothing is stored there.
    fn get_raw(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Vec<u8>, StorageError>> + Send;

    /// Store `data` at `address`.
    fn put_raw(
        &self,
        address: &str,
        data: &[u8],
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}
