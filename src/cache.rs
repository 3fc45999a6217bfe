//! Result cache.
//!
//! TTL- and size-bounded store keyed by content identity. Expired entries are
//! evicted lazily on read. When an insert pushes the cache past its bound, the
//! oldest fifth of the entries (by insertion order) is dropped in one pass.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::options::CacheOptions;
use crate::result::ExtractedContent;

/// A cached extraction result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub content: ExtractedContent,
    pub inserted_at: Instant,
    /// Number of successful reads.
    pub access_count: u64,
    /// Monotonic insertion sequence; breaks `Instant` ties.
    seq: u64,
}

/// TTL/size-bounded result cache.
#[derive(Debug)]
pub struct ResultCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
    next_seq: u64,
}

impl ResultCache {
    #[must_use]
    pub fn new(options: &CacheOptions) -> Self {
        Self::with_limits(options.ttl(), options.max_entries)
    }

    /// A cache with explicit limits. `max_entries` is at least 1.
    #[must_use]
    pub fn with_limits(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
            next_seq: 0,
        }
    }

    /// Look up `key` at the current time.
    pub fn get(&mut self, key: &str) -> Option<ExtractedContent> {
        self.get_at(key, Instant::now())
    }

    /// Look up `key` as of `now`. An entry older than the TTL is removed.
    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<ExtractedContent> {
        let expired = {
            let entry = self.entries.get(key)?;
            now.saturating_duration_since(entry.inserted_at) > self.ttl
        };
        if expired {
            debug!(key, "cache entry expired");
            self.entries.remove(key);
            return None;
        }
        let entry = self.entries.get_mut(key)?;
        entry.access_count += 1;
        Some(entry.content.clone())
    }

    /// Insert at the current time.
    pub fn insert(&mut self, key: impl Into<String>, content: ExtractedContent) {
        self.insert_at(key, content, Instant::now());
    }

    /// Insert as of `now`, evicting the oldest 20% when the bound is exceeded.
    ///
    /// Re-inserting an existing key replaces it and counts as a fresh insertion.
    pub fn insert_at(&mut self, key: impl Into<String>, content: ExtractedContent, now: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            key.into(),
            CacheEntry {
                content,
                inserted_at: now,
                access_count: 0,
                seq,
            },
        );

        if self.entries.len() > self.max_entries {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&mut self) {
        let count = (self.max_entries / 5).max(1);
        let mut by_age: Vec<(Instant, u64, String)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.inserted_at, entry.seq, key.clone()))
            .collect();
        by_age.sort_unstable();

        for (_, _, key) in by_age.into_iter().take(count) {
            self.entries.remove(&key);
        }
        debug!(evicted = count, remaining = self.entries.len(), "cache eviction");
    }

    /// Drop every entry older than the TTL.
    pub fn purge_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.inserted_at) <= ttl);
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Access count of an entry, without counting as an access.
    #[must_use]
    pub fn access_count(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|e| e.access_count)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
