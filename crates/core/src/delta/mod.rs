//! Delta compression of attachments against earlier versions.
//!
//! The delta algorithm itself is pluggable ([`DeltaEncoder`]); this module
//! decides when a delta is looked up, generated, accepted or skipped.
//!
//! # Modules
//!
//! - `cache` - Cached delta results, including negative entries
//! - `codec` - Generation policy wrapped around an encoder
//! - `resolver` - Cache-first, generate-second resolution of an attachment

pub mod cache;
pub mod codec;
pub mod error;
pub mod resolver;

pub use cache::{CachedDelta, DeltaCache, MemoryDeltaCache};
pub use codec::{CachingDeltaCodec, DeltaCodec, DeltaEncoder, DeltaPolicy, NoDelta};
pub use error::DeltaError;
pub use resolver::{DeltaResolver, ResolvedAttachment};
