//! Answer Cache storage traits.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CacheEntry, Fingerprint};

/// Key/value store backing the Answer Cache.
///
/// Stores only store: they never check `expires_at`. Freshness is the
/// caller's responsibility.
#[async_trait]
pub trait AnswerStore: Send + Sync {
    /// Point lookup by fingerprint.
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>>;

    /// Insert or fully overwrite the entry for its fingerprint.
    async fn put(&self, entry: CacheEntry) -> Result<()>;
}
