//! Runtime error types for the VIGIL verification pipeline.
//!
//! Only graph-shape errors (`CycleDetected`, `DependencyNotFound`,
//! `ScenarioNotFound`) abort a run. Every other variant is contained to the
//! behavior that produced it and surfaces as a `BehaviorResult`.

use thiserror::Error;

/// The unified error type for the VIGIL runtime.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VigilError {
    /// The behavior graph contains at least one dependency cycle.
    ///
    /// Raised by the topological scheduler; no partial schedule is produced.
    #[error("dependency cycle detected among behaviors: {}", unresolved.join(", "))]
    CycleDetected { unresolved: Vec<String> },

    /// A behavior declares a dependency on an id that is not in the graph.
    #[error("behavior '{behavior}' depends on unknown behavior '{dependency}'")]
    DependencyNotFound { behavior: String, dependency: String },

    /// A dependent requested a scenario its dependency does not declare.
    #[error("behavior '{behavior}' has no scenario named '{scenario}'")]
    ScenarioNotFound { behavior: String, scenario: String },

    /// The action executor could not carry out a step.
    #[error("step execution failed: {reason}")]
    StepExecutionFailure { reason: String },

    /// A wall-clock budget elapsed before the operation finished.
    #[error("{operation} timed out after {budget_ms}ms")]
    Timeout { operation: String, budget_ms: u64 },

    /// A judge rejected or could not evaluate a condition.
    ///
    /// Caught at the oracle boundary and treated as `passed: false`.
    #[error("judge '{judge}' failed: {reason}")]
    JudgeError { judge: String, reason: String },

    /// The session driver could not reach the requested state.
    #[error("session error: {reason}")]
    SessionError { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl VigilError {
    /// True for the error kinds that abort an entire verification run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VigilError::CycleDetected { .. }
                | VigilError::DependencyNotFound { .. }
                | VigilError::ScenarioNotFound { .. }
        )
    }
}

/// Convenience alias used throughout the VIGIL crates.
pub type VigilResult<T> = Result<T, VigilError>;
