//! Prefetch Scheduling
//!
//! Tracks hover/focus prefetches waiting out their debounce so a pointer
//! leaving the link can cancel them, and so repeated hovers do not stack.

use pageswap_net::CancellationToken;
use std::collections::HashMap;

/// Result of a prefetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchOutcome {
    /// Filtered out, already cached, or already pending
    Skipped,
    /// Pointer left before the debounce elapsed
    Cancelled,
    /// HTML stored in the navigation cache
    Stored,
    /// Fetch failed; nothing cached
    Failed,
}

#[derive(Debug)]
struct Pending {
    id: u64,
    token: CancellationToken,
    fetching: bool,
}

/// Prefetches scheduled per path
#[derive(Debug, Default)]
pub struct PrefetchQueue {
    pending: HashMap<String, Pending>,
    next_id: u64,
}

impl PrefetchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a prefetch unless one is already pending for `path`
    pub fn schedule(&mut self, path: &str) -> Option<(u64, CancellationToken)> {
        if self.pending.contains_key(path) {
            return None;
        }
        self.next_id += 1;
        let token = CancellationToken::new();
        self.pending.insert(path.to_string(), Pending {
            id: self.next_id,
            token: token.clone(),
            fetching: false,
        });
        Some((self.next_id, token))
    }

    /// Debounce elapsed; the prefetch can no longer be cancelled by pointer-leave
    pub fn mark_fetching(&mut self, path: &str, id: u64) {
        if let Some(pending) = self.pending.get_mut(path) {
            if pending.id == id {
                pending.fetching = true;
            }
        }
    }

    /// Cancel a prefetch still waiting out its debounce
    pub fn cancel(&mut self, path: &str) -> bool {
        let waiting = self.pending.get(path).is_some_and(|p| !p.fetching);
        if waiting {
            if let Some(pending) = self.pending.remove(path) {
                pending.token.cancel();
            }
        }
        waiting
    }

    /// Forget a settled prefetch
    pub fn complete(&mut self, path: &str, id: u64) {
        if self.pending.get(path).is_some_and(|p| p.id == id) {
            self.pending.remove(path);
        }
    }

    pub fn is_pending(&self, path: &str) -> bool {
        self.pending.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
