//! Fingerprint-keyed analysis result cache
//!
//! Backs the fallback engine's cached-results tier. Keys are contract
//! content fingerprints; entries are immutable once written, so concurrent
//! writers only race on identical values and no locking beyond the map's
//! atomic insert is needed.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use chainaudit_core::Vulnerability;

/// One cached per-contract analysis fragment
#[derive(Debug, Clone)]
pub struct CachedAnalysis {
    pub vulnerabilities: Vec<Vulnerability>,
    pub warnings: Vec<String>,
    pub inserted_at: DateTime<Utc>,
}

pub struct ResultCache {
    entries: DashMap<String, CachedAnalysis>,
    ttl: Duration,
}

impl ResultCache {
    /// TTL in seconds (default tier configuration uses 600)
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Insert a fragment. First write wins; entries never mutate.
    pub fn put(&self, fingerprint: String, vulnerabilities: Vec<Vulnerability>, warnings: Vec<String>) {
        self.entries.entry(fingerprint).or_insert_with(|| CachedAnalysis {
            vulnerabilities,
            warnings,
            inserted_at: Utc::now(),
        });
    }

    /// Non-expired lookup
    pub fn get(&self, fingerprint: &str) -> Option<CachedAnalysis> {
        let entry = self.entries.get(fingerprint)?;
        if Utc::now() - entry.inserted_at > self.ttl {
            return None;
        }
        Some(entry.clone())
    }

    /// Drop expired entries
    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.entries.retain(|_, entry| now - entry.inserted_at <= self.ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
