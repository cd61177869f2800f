//! pageswap Performance
//!
//! Navigation timing, long-task counting, aggregate statistics and
//! warning budgets.

mod budget;
mod recorder;
mod stats;

pub use budget::{BudgetViolation, PerformanceBudget};
pub use recorder::{PerformanceRecord, PerformanceRecorder, PerformanceReport, DEFAULT_LONG_TASK_THRESHOLD};
pub use stats::{percentile, NavigationStats};
