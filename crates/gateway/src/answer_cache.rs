//! Answer cache for repeated general questions.
//!
//! Sits in front of the inference call on the free-form text path. Store
//! failures never fail a turn: reads degrade to a miss, writes are dropped.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use contact_router_core::{
    traits::AnswerStore,
    types::{CacheEntry, Fingerprint},
};

/// How long a generated answer may be served again.
pub const DEFAULT_ANSWER_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Fingerprint-keyed answer cache over an optional store.
#[derive(Clone)]
pub struct AnswerCache {
    store: Option<Arc<dyn AnswerStore>>,
    ttl: Duration,
}

impl AnswerCache {
    /// Cache that never hits and never writes.
    pub fn disabled() -> Self {
        Self {
            store: None,
            ttl: DEFAULT_ANSWER_TTL,
        }
    }

    pub fn new(store: Option<Arc<dyn AnswerStore>>) -> Self {
        Self {
            store,
            ttl: DEFAULT_ANSWER_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Fetch a fresh entry. Expired entries count as absent.
    pub async fn lookup(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        let store = self.store.as_ref()?;

        match store.get(fingerprint).await {
            Ok(Some(entry)) if entry.is_fresh(Utc::now()) => Some(entry),
            Ok(Some(entry)) => {
                tracing::debug!(
                    fingerprint = %fingerprint,
                    expired_at = %entry.expires_at,
                    "Ignoring expired cache entry"
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(fingerprint = %fingerprint, error = %e, "Answer cache read failed");
                None
            }
        }
    }

    /// Store `answer` for `fingerprint`, replacing any previous entry.
    pub async fn remember(&self, fingerprint: &Fingerprint, question: &str, answer: &str) {
        let Some(store) = self.store.as_ref() else {
            return;
        };

        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::hours(24));
        let entry = CacheEntry::new(fingerprint.clone(), question, answer, ttl, Utc::now());

        if let Err(e) = store.put(entry).await {
            tracing::warn!(fingerprint = %fingerprint, error = %e, "Answer cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contact_router_core::mocks::MockAnswerStore;

    #[tokio::test]
    async fn test_disabled_cache_is_inert() {
        let cache = AnswerCache::disabled();
        let fp = Fingerprint::of("store hours?");

        cache.remember(&fp, "store hours?", "9 to 5").await;
        assert!(!cache.is_enabled());
        assert!(cache.lookup(&fp).await.is_none());
    }

    #[tokio::test]
    async fn test_remember_then_lookup() {
        let store = Arc::new(MockAnswerStore::new());
        let cache = AnswerCache::new(Some(store.clone()));
        let fp = Fingerprint::of("Store Hours?");

        cache.remember(&fp, "Store Hours?", "9 to 5").await;

        let entry = cache.lookup(&Fingerprint::of("  store hours?  ")).await.unwrap();
        assert_eq!(entry.answer, "9 to 5");
        assert_eq!(store.puts(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let store = Arc::new(MockAnswerStore::new());
        let fp = Fingerprint::of("refund policy");
        let now = Utc::now();
        store.seed(CacheEntry::new(
            fp.clone(),
            "refund policy",
            "30 days",
            chrono::Duration::hours(24),
            now - chrono::Duration::hours(25),
        ));

        let cache = AnswerCache::new(Some(store));
        assert!(cache.lookup(&fp).await.is_none());
    }

    #[tokio::test]
    async fn test_store_failures_are_swallowed() {
        let store = Arc::new(MockAnswerStore::failing());
        let cache = AnswerCache::new(Some(store.clone()));
        let fp = Fingerprint::of("hello");

        assert!(cache.lookup(&fp).await.is_none());
        cache.remember(&fp, "hello", "hi").await;
        assert_eq!(store.puts(), 1);
    }
}
