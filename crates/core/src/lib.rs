//! Attachment subsystem of the Syncgate document sync gateway.
//!
//! This crate contains the attachment logic with ZERO web dependencies. The
//! content store, revision tree and delta codec are reached through traits;
//! OpenDAL and Moka backed implementations are included.
//!
//! # Modules
//!
//! - `attachment` - Content keys, metadata, ingestion, discovery and handles
//! - `delta` - Delta cache, generation policy and resolution
//! - `revision` - Revision tree access
//! - `storage` - Content-addressed blob storage

pub mod attachment;
pub mod delta;
pub mod revision;
pub mod storage;
