use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

// =============================================================================
// Answer Cache Types
// =============================================================================

/// Longest question text kept alongside a cached answer.
pub const MAX_STORED_QUESTION_CHARS: usize = 1000;

/// Cache key: hex SHA-256 of the trimmed, lower-cased question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a raw utterance.
    pub fn of(utterance: &str) -> Self {
        let normalized = utterance.to_lowercase();
        let digest = Sha256::digest(normalized.trim().as_bytes());
        Self(format!("{:x}", digest))
    }

    /// Wrap an already computed digest, e.g. one read back from a store.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A previously produced general answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub question: String,
    pub answer: String,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Build an entry that expires `ttl` after `now`.
    pub fn new(
        fingerprint: Fingerprint,
        question: &str,
        answer: impl Into<String>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            fingerprint,
            question: question.chars().take(MAX_STORED_QUESTION_CHARS).collect(),
            answer: answer.into(),
            expires_at: now + ttl,
        }
    }

    /// Whether the entry may still be served at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
