//! In-memory answer store implementation using DashMap.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use contact_router_core::{
    traits::AnswerStore,
    types::{CacheEntry, Fingerprint},
    Result,
};

/// In-memory answer store using DashMap for concurrent access.
///
/// Expired entries are dropped on the next write; until then the reader
/// filters them.
#[derive(Debug, Default)]
pub struct InMemoryAnswerStore {
    data: DashMap<Fingerprint, CacheEntry>,
}

impl InMemoryAnswerStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Get the number of stored entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl AnswerStore for InMemoryAnswerStore {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>> {
        Ok(self.data.get(fingerprint).map(|r| r.value().clone()))
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        let now = Utc::now();
        self.data.retain(|_, existing| existing.is_fresh(now));
        self.data.insert(entry.fingerprint.clone(), entry);
        Ok(())
    }
}
