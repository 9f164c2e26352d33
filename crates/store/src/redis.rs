//! Redis implementation of AnswerStore.
//!
//! Each entry is a hash under `{table}:{fingerprint}` with the fields
//! `QuestionHash`, `Question`, `Answer` and `TTL` (expiry, epoch seconds).
//! The key itself expires at `TTL`.

use async_trait::async_trait;
use chrono::DateTime;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;

use contact_router_core::{
    traits::AnswerStore,
    types::{CacheEntry, Fingerprint},
    Error, Result,
};

const FIELD_HASH: &str = "QuestionHash";
const FIELD_QUESTION: &str = "Question";
const FIELD_ANSWER: &str = "Answer";
const FIELD_TTL: &str = "TTL";

/// Redis persistence for cached answers.
pub struct RedisAnswerStore {
    client: Client,
    table: String,
}

impl RedisAnswerStore {
    /// Create a new Redis answer store. No connection is made until first use.
    pub fn new(url: &str, table: &str) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| Error::storage(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            client,
            table: table.to_string(),
        })
    }

    fn key(&self, fingerprint: &Fingerprint) -> String {
        format!("{}:{}", self.table, fingerprint)
    }
}

/// Rebuild an entry from its hash fields. Incomplete records read as absent.
fn entry_from_fields(fingerprint: &Fingerprint, fields: &HashMap<String, String>) -> Option<CacheEntry> {
    let answer = fields.get(FIELD_ANSWER)?;
    let expires_at = fields
        .get(FIELD_TTL)
        .and_then(|ttl| ttl.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))?;

    Some(CacheEntry {
        fingerprint: fingerprint.clone(),
        question: fields.get(FIELD_QUESTION).cloned().unwrap_or_default(),
        answer: answer.clone(),
        expires_at,
    })
}

fn fields_from_entry(entry: &CacheEntry) -> Vec<(&'static str, String)> {
    vec![
        (FIELD_HASH, entry.fingerprint.to_string()),
        (FIELD_QUESTION, entry.question.clone()),
        (FIELD_ANSWER, entry.answer.clone()),
        (FIELD_TTL, entry.expires_at.timestamp().to_string()),
    ]
}

/// Replace the whole record, never merge with a previous one. Redis reaps
/// the key once the entry has expired.
fn upsert_pipeline(key: &str, entry: &CacheEntry) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .del(key)
        .hset_multiple(key, fields_from_entry(entry).as_slice())
        .expire_at(key, entry.expires_at.timestamp());
    pipe
}

#[async_trait]
impl AnswerStore for RedisAnswerStore {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>> {
        let mut conn = self.client.get_multiplexed_async_connection().await
            .map_err(|e| Error::storage(format!("Redis connection error: {}", e)))?;

        let fields: HashMap<String, String> = conn.hgetall(self.key(fingerprint)).await
            .map_err(|e| Error::storage(format!("Redis hgetall error: {}", e)))?;

        if fields.is_empty() {
            return Ok(None);
        }

        let entry = entry_from_fields(fingerprint, &fields);
        if entry.is_none() {
            tracing::warn!(fingerprint = %fingerprint, "Ignoring malformed cache record");
        }
        Ok(entry)
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await
            .map_err(|e| Error::storage(format!("Redis connection error: {}", e)))?;

        let _: () = upsert_pipeline(&self.key(&entry.fingerprint), &entry)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::storage(format!("Redis put error: {}", e)))?;

        Ok(())
    }
}
