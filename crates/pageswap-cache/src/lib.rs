//! pageswap Page Cache
//!
//! Session-scoped store of fetched page HTML used by navigations and
//! prefetches. Nothing is persisted across document reloads.

mod cache;

pub use cache::{CacheEntry, CacheStats, NavigationCache, DEFAULT_CAPACITY, DEFAULT_TTL};
