//! Delta generation policy.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use syncgate_shared::DeltaSettings;

use super::cache::{CachedDelta, DeltaCache, MemoryDeltaCache};
use super::error::DeltaError;
use crate::attachment::ContentKey;

/// Generates deltas between two blobs.
///
/// Implementations populate the delta cache as a side effect.
pub trait DeltaCodec: Send + Sync {
    /// Delta turning `source` into `target`.
    ///
    /// Returns `Ok(None)` if a delta is not worth using for this pair, and an
    /// error if this pair could not be encoded at all.
    fn generate(
        &self,
        source_key: &ContentKey,
        source: &[u8],
        target_key: &ContentKey,
        target: &[u8],
    ) -> impl Future<Output = Result<Option<Vec<u8>>, DeltaError>> + Send;
}

/// A delta algorithm.
pub trait DeltaEncoder: Send + Sync {
    /// Encode `target` relative to `source`.
    fn encode(&self, source: &[u8], target: &[u8]) -> Result<Vec<u8>, DeltaError>;
}

/// When a delta is attempted and when it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaPolicy {
    /// Targets smaller than this are sent whole.
    pub min_attachment_size: u64,
    /// A delta must be smaller than this percentage of the target.
    pub max_delta_percent: u64,
}

impl DeltaPolicy {
    /// Default minimum target size: 1KB.
    pub const DEFAULT_MIN_ATTACHMENT_SIZE: u64 = 1024;
    /// Default maximum delta size: 80% of the target.
    pub const DEFAULT_MAX_DELTA_PERCENT: u64 = 80;

    /// Policy from the application settings.
    #[must_use]
    pub fn from_settings(settings: &DeltaSettings) -> Self {
        Self {
            min_attachment_size: settings.min_attachment_size,
            max_delta_percent: settings.max_delta_percent,
        }
    }

    /// Whether a delta should be computed for a target of `target_len` bytes.
    #[must_use]
    pub fn should_attempt(&self, target_len: usize) -> bool {
        to_u64(target_len) >= self.min_attachment_size
    }

    /// Whether a delta of `delta_len` bytes is worth sending instead of the target.
    #[must_use]
    pub fn accepts(&self, delta_len: usize, target_len: usize) -> bool {
        delta_len > 0
            && to_u64(delta_len).saturating_mul(100)
                < to_u64(target_len).saturating_mul(self.max_delta_percent)
    }
}

impl Default for DeltaPolicy {
    fn default() -> Self {
        Self {
            min_attachment_size: Self::DEFAULT_MIN_ATTACHMENT_SIZE,
            max_delta_percent: Self::DEFAULT_MAX_DELTA_PERCENT,
        }
    }
}

fn to_u64(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Delta codec that applies a [`DeltaPolicy`] and records every decision in a
/// [`MemoryDeltaCache`].
pub struct CachingDeltaCodec<E> {
    encoder: E,
    cache: Arc<MemoryDeltaCache>,
    policy: DeltaPolicy,
}

impl<E: DeltaEncoder> CachingDeltaCodec<E> {
    /// Create a codec writing into `cache`.
    #[must_use]
    pub fn new(encoder: E, cache: Arc<MemoryDeltaCache>, policy: DeltaPolicy) -> Self {
        Self {
            encoder,
            cache,
            policy,
        }
    }

    /// The policy in effect.
    #[must_use]
    pub fn policy(&self) -> DeltaPolicy {
        self.policy
    }
}

impl<E: DeltaEncoder> DeltaCodec for CachingDeltaCodec<E> {
    async fn generate(
        &self,
        source_key: &ContentKey,
        source: &[u8],
        target_key: &ContentKey,
        target: &[u8],
    ) -> Result<Option<Vec<u8>>, DeltaError> {
        if !self.policy.should_attempt(target.len()) {
            debug!(target = %target_key, size = target.len(), "attachment too small for delta");
            self.cache.insert_not_worth_it(source_key, target_key);
            return Ok(None);
        }

        let delta = self.encoder.encode(source, target).inspect_err(|e| {
            warn!(
                source = %source_key,
                target = %target_key,
                error = %e,
                "delta encoding failed"
            );
        })?;

        if self.policy.accepts(delta.len(), target.len()) {
            debug!(
                source = %source_key,
                target = %target_key,
                delta_size = delta.len(),
                target_size = target.len(),
                "generated delta"
            );
            self.cache.insert_delta(source_key, target_key, &delta);
            Ok(Some(delta))
        } else {
            debug!(
                source = %source_key,
                target = %target_key,
                delta_size = delta.len(),
                target_size = target.len(),
                "delta not worth using"
            );
            self.cache.insert_not_worth_it(source_key, target_key);
            Ok(None)
        }
    }
}

/// Delta collaborator for deployments without delta support.
///
/// Never has a cached delta and never generates one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelta;

impl DeltaCache for NoDelta {
    async fn get(&self, _source: &ContentKey, _target: &ContentKey) -> CachedDelta {
        CachedDelta::Miss
    }
}

impl DeltaCodec for NoDelta {
    async fn generate(
        &self,
        _source_key: &ContentKey,
        _source: &[u8],
        _target_key: &ContentKey,
        _target: &[u8],
    ) -> Result<Option<Vec<u8>>, DeltaError> {
        Ok(None)
    }
}
