//! Navigation Recorder
//!
//! Marks the start and end of each navigation, counts long tasks observed
//! in between, and keeps the session's record sequence.

use crate::{BudgetViolation, NavigationStats, PerformanceBudget};
use serde::Serialize;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Script tasks longer than this count as long tasks
pub const DEFAULT_LONG_TASK_THRESHOLD: Duration = Duration::from_millis(50);

/// One completed navigation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRecord {
    pub path: String,
    pub duration_ms: f64,
    pub was_cache_hit: bool,
    pub long_task_count: u32,
    /// Wall-clock completion time, milliseconds since the Unix epoch
    pub timestamp: u64,
}

/// Serializable session summary
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub stats: Option<NavigationStats>,
    pub records: Vec<PerformanceRecord>,
}

/// Open measurement window of one navigation
#[derive(Debug)]
struct NavigationWindow {
    id: u64,
    path: String,
    started: Instant,
    long_tasks: u32,
}

/// Performance recorder
#[derive(Debug)]
pub struct PerformanceRecorder {
    records: Vec<PerformanceRecord>,
    windows: Vec<NavigationWindow>,
    long_task_threshold: Duration,
    budget: PerformanceBudget,
}

impl Default for PerformanceRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_TASK_THRESHOLD, PerformanceBudget::default())
    }
}

impl PerformanceRecorder {
    pub fn new(long_task_threshold: Duration, budget: PerformanceBudget) -> Self {
        Self {
            records: Vec::new(),
            windows: Vec::new(),
            long_task_threshold,
            budget,
        }
    }

    /// Mark navigation start
    pub fn begin(&mut self, id: u64, path: &str) {
        self.begin_at(id, path, Instant::now());
    }

    /// Mark navigation start at `now`
    ///
    /// Windows of other navigations stay open: one that already committed
    /// still closes its own window, and aborted ones are discarded.
    pub fn begin_at(&mut self, id: u64, path: &str, now: Instant) {
        self.windows.retain(|w| w.id != id);
        self.windows.push(NavigationWindow {
            id,
            path: path.to_string(),
            started: now,
            long_tasks: 0,
        });
    }

    /// Feed a finished script task from the host's task observer
    ///
    /// Counted against every open navigation window.
    pub fn observe_task(&mut self, duration: Duration) {
        if duration <= self.long_task_threshold {
            return;
        }
        for window in &mut self.windows {
            window.long_tasks += 1;
        }
    }

    /// Whether any navigation window is open
    pub fn is_observing(&self) -> bool {
        !self.windows.is_empty()
    }

    /// Mark navigation end and append its record
    pub fn end(&mut self, id: u64, was_cache_hit: bool) -> Option<PerformanceRecord> {
        self.end_at(id, was_cache_hit, Instant::now())
    }

    /// Mark navigation end at `now`
    ///
    /// Returns `None` when no window is open for `id`.
    pub fn end_at(&mut self, id: u64, was_cache_hit: bool, now: Instant) -> Option<PerformanceRecord> {
        let index = self.windows.iter().position(|w| w.id == id)?;
        let window = self.windows.remove(index);

        let record = PerformanceRecord {
            path: window.path,
            duration_ms: now.saturating_duration_since(window.started).as_nanos() as f64 / 1_000_000.0,
            was_cache_hit,
            long_task_count: window.long_tasks,
            timestamp: unix_millis(),
        };
        tracing::debug!(
            "Navigation to {} took {:.1}ms (cache hit: {}, long tasks: {})",
            record.path, record.duration_ms, record.was_cache_hit, record.long_task_count
        );
        self.records.push(record.clone());

        for violation in self.check_budget() {
            tracing::warn!("Performance budget exceeded: {}", violation);
        }

        Some(record)
    }

    /// Close the window of an abandoned navigation without recording it
    pub fn discard(&mut self, id: u64) {
        if let Some(index) = self.windows.iter().position(|w| w.id == id) {
            let window = self.windows.remove(index);
            tracing::trace!("Discarded timing window for {}", window.path);
        }
    }

    /// All records, oldest first
    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    /// Aggregate stats over every recorded navigation
    pub fn stats(&self) -> Option<NavigationStats> {
        let durations: Vec<f64> = self.records.iter().map(|r| r.duration_ms).collect();
        NavigationStats::from_durations(&durations)
    }

    /// Evaluate the budget against current stats and the latest record
    pub fn check_budget(&self) -> Vec<BudgetViolation> {
        match (self.stats(), self.records.last()) {
            (Some(stats), Some(latest)) => self.budget.evaluate(&stats, latest),
            _ => Vec::new(),
        }
    }

    pub fn budget(&self) -> &PerformanceBudget {
        &self.budget
    }

    pub fn report(&self) -> PerformanceReport {
        PerformanceReport {
            stats: self.stats(),
            records: self.records.clone(),
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
