//! Per-run verification state.
//!
//! `VerificationContext` is created at the start of a run, threaded by
//! reference through every scheduling and execution function, and dropped
//! when the run report is built. Nothing here outlives one run.

use indexmap::IndexMap;
use tracing::warn;

use vigil_contracts::result::BehaviorResult;

/// Whether a behavior must be skipped because of its dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SkipDecision {
    pub skip: bool,
    /// Id of the first dependency whose recorded result is not a pass.
    pub failed_dependency: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Default)]
pub struct VerificationContext {
    /// Standalone verdicts, keyed by behavior id, in recording order.
    results: IndexMap<String, BehaviorResult>,
    /// Behaviors marked by a skip cascade, mapped to the failure that caused it.
    skipped: IndexMap<String, String>,
}

impl VerificationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the verdict for a behavior.
    ///
    /// A verdict is terminal: recording a second result for the same id is
    /// refused and returns `false`.
    pub fn record(&mut self, result: BehaviorResult) -> bool {
        if self.results.contains_key(&result.behavior_id) {
            warn!(
                behavior_id = %result.behavior_id,
                "refusing to overwrite an existing verdict"
            );
            return false;
        }
        self.results.insert(result.behavior_id.clone(), result);
        true
    }

    pub fn result(&self, behavior_id: &str) -> Option<&BehaviorResult> {
        self.results.get(behavior_id)
    }

    /// Decide whether to skip a behavior with the given dependencies.
    ///
    /// A dependency with no recorded result has not been disproven and does
    /// not cause a skip. Any recorded non-pass result does.
    pub fn should_skip<'a>(&self, dependency_ids: impl IntoIterator<Item = &'a str>) -> SkipDecision {
        for dep_id in dependency_ids {
            if let Some(result) = self.results.get(dep_id) {
                if !result.passed() {
                    return SkipDecision {
                        skip: true,
                        failed_dependency: Some(dep_id.to_string()),
                        reason: Some(format!(
                            "dependency '{}' did not pass ({})",
                            result.title, result.status
                        )),
                    };
                }
            }
        }
        SkipDecision::default()
    }

    /// Add `behavior_id` to the skip set. Returns `false` if it was already there.
    pub fn mark_skipped(&mut self, behavior_id: &str, caused_by: &str) -> bool {
        if self.skipped.contains_key(behavior_id) {
            return false;
        }
        self.skipped
            .insert(behavior_id.to_string(), caused_by.to_string());
        true
    }

    pub fn is_skipped(&self, behavior_id: &str) -> bool {
        self.skipped.contains_key(behavior_id)
    }

    /// The failed behavior whose cascade put `behavior_id` in the skip set.
    pub fn skip_cause(&self, behavior_id: &str) -> Option<&str> {
        self.skipped.get(behavior_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Consume the context, yielding results in recording order.
    pub fn into_results(self) -> Vec<BehaviorResult> {
        self.results.into_values().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use vigil_contracts::result::{BehaviorResult, BehaviorStatus};

    use super::*;

    #[test]
    fn unrecorded_dependency_does_not_skip() {
        let context = VerificationContext::new();
        let decision = context.should_skip(["sign-up"]);
        assert!(!decision.skip);
        assert!(decision.failed_dependency.is_none());
    }

    #[test]
    fn passing_dependencies_do_not_skip() {
        let mut context = VerificationContext::new();
        context.record(BehaviorResult::pass("sign-up", "Sign Up", Duration::ZERO));
        assert!(!context.should_skip(["sign-up"]).skip);
    }

    #[test]
    fn first_non_pass_dependency_is_reported() {
        let mut context = VerificationContext::new();
        context.record(BehaviorResult::pass("sign-up", "Sign Up", Duration::ZERO));
        context.record(BehaviorResult::fail(
            "create-item",
            "Create Item",
            "button missing",
            Duration::ZERO,
        ));
        context.record(BehaviorResult::dependency_failed(
            "tag-item",
            "Tag Item",
            "Create Item",
            "skipped",
        ));

        let decision = context.should_skip(["sign-up", "create-item", "tag-item"]);

        assert!(decision.skip);
        assert_eq!(decision.failed_dependency.as_deref(), Some("create-item"));
        assert!(decision.reason.unwrap().contains("Create Item"));
    }

    #[test]
    fn verdicts_are_never_overwritten() {
        let mut context = VerificationContext::new();
        assert!(context.record(BehaviorResult::pass("a", "A", Duration::ZERO)));
        assert!(!context.record(BehaviorResult::fail("a", "A", "late failure", Duration::ZERO)));

        assert_eq!(context.result("a").unwrap().status, BehaviorStatus::Pass);
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn skip_set_remembers_first_cause() {
        let mut context = VerificationContext::new();
        assert!(context.mark_skipped("delete-item", "create-item"));
        assert!(!context.mark_skipped("delete-item", "sign-up"));
        assert_eq!(context.skip_cause("delete-item"), Some("create-item"));
    }
}
