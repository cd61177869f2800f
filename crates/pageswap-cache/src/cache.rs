//! Page Cache
//!
//! Stores raw page HTML keyed by request path, with a fixed time-to-live
//! and least-recently-used eviction once capacity is exceeded.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default time-to-live for a cached page
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default number of pages kept
pub const DEFAULT_CAPACITY: usize = 20;

/// Cached page entry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Raw page HTML
    pub html: String,
    /// Time when inserted
    pub inserted_at: Instant,
    /// Last time the entry was read or written
    pub last_accessed: Instant,
    /// Monotonic access sequence, breaks ties between equal instants
    access_seq: u64,
}

impl CacheEntry {
    /// Age of the entry at `now`
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    /// Check if entry has outlived `ttl` at `now`
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        self.age(now) > ttl
    }
}

/// In-memory navigation cache
#[derive(Debug)]
pub struct NavigationCache {
    entries: HashMap<String, CacheEntry>,
    capacity: usize,
    ttl: Duration,
    seq: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl NavigationCache {
    /// Create a new cache with limits
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            ttl,
            seq: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    /// Get a cached page, refreshing its access time
    pub fn get(&mut self, path: &str) -> Option<&str> {
        self.get_at(path, Instant::now())
    }

    /// Get a cached page as observed at `now`
    ///
    /// Expired entries are removed and reported as absent.
    pub fn get_at(&mut self, path: &str, now: Instant) -> Option<&str> {
        let expired = match self.entries.get(path) {
            Some(entry) => entry.is_expired(self.ttl, now),
            None => {
                self.misses += 1;
                return None;
            }
        };

        if expired {
            self.entries.remove(path);
            self.expirations += 1;
            self.misses += 1;
            tracing::debug!("Cache entry expired: {}", path);
            return None;
        }

        self.seq += 1;
        let seq = self.seq;
        self.hits += 1;
        let entry = self.entries.get_mut(path)?;
        entry.last_accessed = now;
        entry.access_seq = seq;
        Some(entry.html.as_str())
    }

    /// Check if a live entry exists (without updating access time)
    pub fn contains(&self, path: &str) -> bool {
        self.contains_at(path, Instant::now())
    }

    /// Check if a live entry exists at `now`
    pub fn contains_at(&self, path: &str, now: Instant) -> bool {
        self.entries
            .get(path)
            .map(|e| !e.is_expired(self.ttl, now))
            .unwrap_or(false)
    }

    /// Store a page
    pub fn set(&mut self, path: &str, html: impl Into<String>) {
        self.set_at(path, html, Instant::now());
    }

    /// Store a page as of `now`, evicting the least recently used entry on overflow
    pub fn set_at(&mut self, path: &str, html: impl Into<String>, now: Instant) {
        self.seq += 1;
        self.entries.insert(path.to_string(), CacheEntry {
            html: html.into(),
            inserted_at: now,
            last_accessed: now,
            access_seq: self.seq,
        });

        if self.entries.len() > self.capacity {
            self.purge_expired_at(now);
        }
        if self.entries.len() > self.capacity {
            self.evict_one();
        }
    }

    /// Remove a page
    pub fn remove(&mut self, path: &str) -> Option<CacheEntry> {
        self.entries.remove(path)
    }

    /// Evict the least recently accessed entry
    fn evict_one(&mut self) -> bool {
        let oldest = self.entries.iter()
            .min_by_key(|(_, e)| (e.last_accessed, e.access_seq))
            .map(|(k, _)| k.clone());

        match oldest {
            Some(key) => {
                tracing::debug!("Evicting cached page: {}", key);
                self.entries.remove(&key);
                self.evictions += 1;
                true
            }
            None => false,
        }
    }

    /// Remove all expired entries
    pub fn purge_expired(&mut self) {
        self.purge_expired_at(Instant::now());
    }

    /// Remove all entries expired at `now`
    pub fn purge_expired_at(&mut self, now: Instant) {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(ttl, now));
        self.expirations += (before - self.entries.len()) as u64;
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries (live or not yet purged)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get cache stats
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.len(),
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            expirations: self.expirations,
        }
    }
}

impl Default for NavigationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_basic() {
        let mut cache = NavigationCache::new(4, Duration::from_secs(60));

        cache.set("/about", "<main>About</main>");

        assert!(cache.contains("/about"));
        assert_eq!(cache.get("/about"), Some("<main>About</main>"));
    }

    #[test]
    fn test_cache_overwrite() {
        let mut cache = NavigationCache::new(4, Duration::from_secs(60));

        cache.set("/about", "old");
        cache.set("/about", "new");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("/about"), Some("new"));
    }

    #[test]
    fn test_contains_does_not_touch() {
        let mut cache = NavigationCache::new(2, Duration::from_secs(60));
        let t0 = Instant::now();

        cache.set_at("/a", "a", t0);
        cache.set_at("/b", "b", t0 + Duration::from_millis(1));
        assert!(cache.contains_at("/a", t0 + Duration::from_millis(2)));
        cache.set_at("/c", "c", t0 + Duration::from_millis(3));

        assert!(!cache.contains_at("/a", t0 + Duration::from_millis(4)));
        assert!(cache.contains_at("/b", t0 + Duration::from_millis(4)));
    }

    #[test]
    fn test_cache_stats() {
        let mut cache = NavigationCache::new(4, Duration::from_secs(60));

        cache.set("/a", "a");
        cache.get("/a");
        cache.get("/missing");

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_cache_clear() {
        let mut cache = NavigationCache::default();

        cache.set("/a", "a");
        cache.clear();

        assert!(!cache.contains("/a"));
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
    }
}
