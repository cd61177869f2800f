//! Performance Budgets
//!
//! Optional thresholds that produce diagnostic warnings. Exceeding one never
//! affects navigation.

use crate::{NavigationStats, PerformanceRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Warning thresholds, each disabled when `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceBudget {
    pub median_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub long_tasks: Option<u32>,
}

impl PerformanceBudget {
    /// Compare aggregate stats and the latest navigation against the thresholds
    pub fn evaluate(&self, stats: &NavigationStats, latest: &PerformanceRecord) -> Vec<BudgetViolation> {
        let mut violations = Vec::new();

        if let Some(limit) = self.median_ms {
            if stats.median_ms > limit {
                violations.push(BudgetViolation::Median { actual: stats.median_ms, limit });
            }
        }
        if let Some(limit) = self.p95_ms {
            if stats.p95_ms > limit {
                violations.push(BudgetViolation::P95 { actual: stats.p95_ms, limit });
            }
        }
        if let Some(limit) = self.long_tasks {
            if latest.long_task_count > limit {
                violations.push(BudgetViolation::LongTasks {
                    path: latest.path.clone(),
                    actual: latest.long_task_count,
                    limit,
                });
            }
        }

        violations
    }

    pub fn is_empty(&self) -> bool {
        self.median_ms.is_none() && self.p95_ms.is_none() && self.long_tasks.is_none()
    }
}

/// A threshold that was exceeded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BudgetViolation {
    Median { actual: f64, limit: f64 },
    P95 { actual: f64, limit: f64 },
    LongTasks { path: String, actual: u32, limit: u32 },
}

impl fmt::Display for BudgetViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetViolation::Median { actual, limit } => {
                write!(f, "median navigation {:.1}ms exceeds {:.1}ms", actual, limit)
            }
            BudgetViolation::P95 { actual, limit } => {
                write!(f, "p95 navigation {:.1}ms exceeds {:.1}ms", actual, limit)
            }
            BudgetViolation::LongTasks { path, actual, limit } => {
                write!(f, "{} long tasks during {} (limit {})", actual, path, limit)
            }
        }
    }
}
