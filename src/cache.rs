/*!
 * Transcript caching functionality.
 *
 * This module provides a bounded, time-expiring cache keyed by the
 * extraction fingerprint (video id plus requested language) to avoid
 * redundant network round trips.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

use crate::app_config::CacheConfig;
use crate::transcript::Transcript;

/// Cache key combining video id and requested language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Fingerprint {
    /// Opaque external video identifier
    video_id: String,

    /// Language the caller asked for, if any
    requested_language: Option<String>,
}

impl Fingerprint {
    fn new(video_id: &str, requested_language: Option<&str>) -> Self {
        Self {
            video_id: video_id.to_string(),
            requested_language: requested_language.map(|language| language.to_string()),
        }
    }
}

/// One cached transcript with its bookkeeping
struct CacheEntry {
    transcript: Transcript,
    inserted_at: Instant,
    last_used: u64,
}

struct CacheInner {
    entries: HashMap<Fingerprint, CacheEntry>,
    /// Monotonic recency counter, bumped on every hit and insert
    tick: u64,
    hits: usize,
    misses: usize,
}

/// Cache statistics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of live entries
    pub size: usize,
    /// Configured capacity
    pub max_entries: usize,
    /// Lookup hits since creation or the last clear
    pub hits: usize,
    /// Lookup misses since creation or the last clear
    pub misses: usize,
}

/// Bounded LRU cache for completed transcripts.
///
/// Entries older than the configured TTL are treated as absent even before
/// they are physically evicted; a hit refreshes recency; an insert beyond
/// capacity evicts the least-recently-used entry. All mutation happens
/// under a single internal lock, so a `set` is atomic from the caller's
/// perspective.
pub struct TranscriptCache {
    inner: Arc<Mutex<CacheInner>>,
    max_entries: usize,
    ttl: Duration,
}

impl TranscriptCache {
    /// Create a new cache with the given capacity and TTL settings
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: HashMap::new(),
                tick: 0,
                hits: 0,
                misses: 0,
            })),
            max_entries: config.max_entries.max(1),
            ttl: config.ttl(),
        }
    }

    /// Look up a transcript by fingerprint.
    ///
    /// Expired entries are removed here and reported as a miss.
    pub fn get(&self, video_id: &str, requested_language: Option<&str>) -> Option<Transcript> {
        let key = Fingerprint::new(video_id, requested_language);
        let mut inner = self.inner.lock();

        let expired = matches!(
            inner.entries.get(&key),
            Some(entry) if entry.inserted_at.elapsed() >= self.ttl
        );
        if expired {
            inner.entries.remove(&key);
        }

        inner.tick += 1;
        let tick = inner.tick;
        match inner.entries.get_mut(&key) {
            Some(entry) => {
                entry.last_used = tick;
                let transcript = entry.transcript.clone();
                inner.hits += 1;
                debug!(
                    "Cache hit for {} (language {:?})",
                    video_id, requested_language
                );
                Some(transcript)
            }
            None => {
                inner.misses += 1;
                debug!(
                    "Cache miss for {} (language {:?})",
                    video_id, requested_language
                );
                None
            }
        }
    }

    /// Store a transcript under its fingerprint, replacing any previous
    /// entry and evicting the least-recently-used one at capacity
    pub fn set(&self, video_id: &str, requested_language: Option<&str>, transcript: Transcript) {
        let key = Fingerprint::new(video_id, requested_language);
        let mut inner = self.inner.lock();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.max_entries {
            let evict = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(evict) = evict {
                debug!("Evicting least-recently-used cache entry {:?}", evict);
                inner.entries.remove(&evict);
            }
        }

        inner.tick += 1;
        let entry = CacheEntry {
            transcript,
            inserted_at: Instant::now(),
            last_used: inner.tick,
        };
        inner.entries.insert(key, entry);
    }

    /// Drop every entry and reset the hit/miss counters
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
        debug!("Transcript cache cleared");
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            size: inner.entries.len(),
            max_entries: self.max_entries,
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl Clone for TranscriptCache {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            max_entries: self.max_entries,
            ttl: self.ttl,
        }
    }
}
