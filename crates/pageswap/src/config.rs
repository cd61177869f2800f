//! Navigation Configuration
//!
//! Tunables for caching, prefetching, transitions and budgets. All values
//! are defaults tuned for a small static site, not invariants.

use pageswap_perf::PerformanceBudget;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Navigation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Age after which a cached page counts as absent
    pub cache_ttl_ms: u64,
    /// Maximum number of cached pages
    pub cache_capacity: usize,
    /// Hover/focus delay before a prefetch fires
    pub prefetch_debounce_ms: u64,
    /// Upper bound on the wait for the exit transition to end
    pub exit_fallback_ms: u64,
    /// How long the entering class stays applied
    pub enter_duration_ms: u64,
    /// Idle-callback timeout for deferred module re-initialization
    pub idle_timeout_ms: u64,
    /// Plain timeout used when no idle callback is available
    pub deferred_delay_ms: u64,
    /// Script tasks longer than this count as long tasks
    pub long_task_threshold_ms: u64,
    pub budget: PerformanceBudget,
    pub exiting_class: String,
    pub entering_class: String,
    /// Link attribute that keeps a click on native navigation
    pub opt_out_attribute: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: 5 * 60 * 1000,
            cache_capacity: 20,
            prefetch_debounce_ms: 80,
            exit_fallback_ms: 200,
            enter_duration_ms: 500,
            idle_timeout_ms: 2000,
            deferred_delay_ms: 1,
            long_task_threshold_ms: 50,
            budget: PerformanceBudget::default(),
            exiting_class: "page-exiting".to_string(),
            entering_class: "page-entering".to_string(),
            opt_out_attribute: "data-no-swap".to_string(),
        }
    }
}

impl NavigationConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid("cache_capacity must be at least 1".into()));
        }
        if self.exiting_class.is_empty() || self.entering_class.is_empty() {
            return Err(ConfigError::Invalid("transition classes must not be empty".into()));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn prefetch_debounce(&self) -> Duration {
        Duration::from_millis(self.prefetch_debounce_ms)
    }

    pub fn exit_fallback(&self) -> Duration {
        Duration::from_millis(self.exit_fallback_ms)
    }

    pub fn enter_duration(&self) -> Duration {
        Duration::from_millis(self.enter_duration_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn deferred_delay(&self) -> Duration {
        Duration::from_millis(self.deferred_delay_ms)
    }

    pub fn long_task_threshold(&self) -> Duration {
        Duration::from_millis(self.long_task_threshold_ms)
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
