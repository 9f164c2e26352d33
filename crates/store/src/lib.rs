#![deny(unused)]
//! Answer Cache storage backends for the contact router.
//!
//! Stores map a question fingerprint to the last answer produced for it.
//! They hold data only; expiry is enforced by the reader.

pub mod memory;
pub mod redis;

use std::sync::Arc;

use contact_router_core::{config::CacheConfig, traits::AnswerStore, Result};

pub use self::memory::InMemoryAnswerStore;
pub use self::redis::RedisAnswerStore;

/// Build the store named by the configuration.
///
/// Returns `Ok(None)` when no table is configured, which disables caching.
/// A table without a Redis URL is kept in process memory.
pub fn create_answer_store(config: &CacheConfig) -> Result<Option<Arc<dyn AnswerStore>>> {
    let Some(table) = config.table.as_deref().filter(|t| !t.is_empty()) else {
        tracing::info!("No answer cache table configured, caching disabled");
        return Ok(None);
    };

    match config.redis_url.as_deref() {
        Some(url) => {
            tracing::info!(table = %table, "Initializing Redis answer store");
            Ok(Some(Arc::new(RedisAnswerStore::new(url, table)?)))
        }
        None => {
            tracing::info!(table = %table, "Initializing in-memory answer store");
            Ok(Some(Arc::new(InMemoryAnswerStore::new())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_config(table: Option<&str>) -> CacheConfig {
        CacheConfig {
            table: table.map(str::to_string),
            redis_url: None,
            ttl_secs: 60,
        }
    }

    #[test]
    fn test_missing_table_disables_cache() {
        assert!(create_answer_store(&cache_config(None)).unwrap().is_none());
        assert!(create_answer_store(&cache_config(Some(""))).unwrap().is_none());
    }

    #[test]
    fn test_table_without_redis_uses_memory() {
        assert!(create_answer_store(&cache_config(Some("FaqCache"))).unwrap().is_some());
    }
}
