//! Per-behavior verdicts and run-level aggregation.
//!
//! `BehaviorResult` is written once per behavior per run by the orchestrator.
//! `RunSummary` and `RunReport` are what the summary consumer receives.

use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ExecutionStrategy;

/// Unique identifier for a single verification run.
///
/// Appears in every log line emitted while the run is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Terminal status of one behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorStatus {
    Pass,
    Fail,
    /// Never executed because a precondition did not pass.
    DependencyFailed,
}

impl fmt::Display for BehaviorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BehaviorStatus::Pass => "pass",
            BehaviorStatus::Fail => "fail",
            BehaviorStatus::DependencyFailed => "dependency_failed",
        };
        f.write_str(label)
    }
}

/// The verdict for one behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorResult {
    pub behavior_id: String,
    pub title: String,
    pub status: BehaviorStatus,
    /// Failure or skip explanation. `None` on pass.
    pub error: Option<String>,
    /// Title of the first dependency that did not pass, for `DependencyFailed`.
    pub failed_dependency: Option<String>,
    pub duration: Duration,
    /// Prerequisites re-executed for this target under the isolated-chain
    /// strategy. These never enter the shared verification context.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chain_results: Vec<BehaviorResult>,
}

impl BehaviorResult {
    pub fn pass(behavior_id: impl Into<String>, title: impl Into<String>, duration: Duration) -> Self {
        Self {
            behavior_id: behavior_id.into(),
            title: title.into(),
            status: BehaviorStatus::Pass,
            error: None,
            failed_dependency: None,
            duration,
            chain_results: Vec::new(),
        }
    }

    pub fn fail(
        behavior_id: impl Into<String>,
        title: impl Into<String>,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            behavior_id: behavior_id.into(),
            title: title.into(),
            status: BehaviorStatus::Fail,
            error: Some(error.into()),
            failed_dependency: None,
            duration,
            chain_results: Vec::new(),
        }
    }

    pub fn dependency_failed(
        behavior_id: impl Into<String>,
        title: impl Into<String>,
        failed_dependency: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            behavior_id: behavior_id.into(),
            title: title.into(),
            status: BehaviorStatus::DependencyFailed,
            error: Some(reason.into()),
            failed_dependency: Some(failed_dependency.into()),
            duration: Duration::ZERO,
            chain_results: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == BehaviorStatus::Pass
    }
}

/// Aggregate counts over all results of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub dependency_failed: usize,
    pub total: usize,
    /// `passed / total`, or 0.0 for an empty run.
    pub reward: f64,
}

impl RunSummary {
    pub fn from_results(results: &[BehaviorResult]) -> Self {
        let count = |status: BehaviorStatus| results.iter().filter(|r| r.status == status).count();
        let passed = count(BehaviorStatus::Pass);
        let total = results.len();
        let reward = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64
        };
        Self {
            passed,
            failed: count(BehaviorStatus::Fail),
            dependency_failed: count(BehaviorStatus::DependencyFailed),
            total,
            reward,
        }
    }

    /// Human-readable summary, one line per category.
    pub fn render(&self) -> String {
        format!(
            "Passed: {}\nFailed: {}\nDependency failed: {}\nTotal: {}\nReward: {:.2}",
            self.passed, self.failed, self.dependency_failed, self.total, self.reward
        )
    }
}

/// Everything a verification run hands to the summary consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub strategy: ExecutionStrategy,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One result per behavior, in execution order.
    pub results: Vec<BehaviorResult>,
    pub summary: RunSummary,
}

impl RunReport {
    pub fn result(&self, behavior_id: &str) -> Option<&BehaviorResult> {
        self.results.iter().find(|r| r.behavior_id == behavior_id)
    }
}
