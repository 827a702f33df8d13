//! Dual-oracle check verifier for the VIGIL runtime.
//!
//! `DualOracleVerifier` implements the `CheckVerifier` trait from
//! `vigil-core`. Each Check condition is decided as follows:
//!
//! 1. **Fast path**: a quoted-text condition that holds on the visible text
//!    passes immediately. A miss is not a failure; it falls through.
//! 2. **Primary/rescue rounds**: the primary judge runs first. If it passes
//!    the rescue judge is never called. If it fails, the rescue judge gets
//!    one chance to overturn the verdict. When both fail, the verifier waits
//!    a fixed backoff and starts the next round, up to `max_rounds`.
//!
//! The extract judge is primary right after a navigation, where a
//! before/after diff compares two unrelated pages. Otherwise the diff judge
//! is primary. The round loop is raced against `check_timeout_ms`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use vigil_contracts::{
    action::{
        CheckContext, CheckOutcome, CheckResolution, Diagnostics, JudgeContext, JudgeKind,
    },
    config::OracleSettings,
    error::VigilError,
    session::PageSnapshot,
};
use vigil_core::traits::{CheckVerifier, Judge, SessionDriver};

use crate::fast_path::{classify_check, CheckKind};

/// The VIGIL check verifier.
///
/// Holds one judge of each kind. Neither judge is trusted alone: a pass from
/// either one is accepted, a failure only when both agree in every round.
pub struct DualOracleVerifier {
    diff_judge: Arc<dyn Judge>,
    extract_judge: Arc<dyn Judge>,
    settings: OracleSettings,
}

impl DualOracleVerifier {
    pub fn new(diff_judge: Arc<dyn Judge>, extract_judge: Arc<dyn Judge>, settings: OracleSettings) -> Self {
        Self {
            diff_judge,
            extract_judge,
            settings,
        }
    }

    pub fn settings(&self) -> &OracleSettings {
        &self.settings
    }

    /// The (primary, rescue) judge order for a check.
    pub fn judge_order(navigated: bool) -> (JudgeKind, JudgeKind) {
        if navigated {
            (JudgeKind::Extract, JudgeKind::Diff)
        } else {
            (JudgeKind::Diff, JudgeKind::Extract)
        }
    }

    fn judge(&self, kind: JudgeKind) -> &dyn Judge {
        match kind {
            JudgeKind::Diff => self.diff_judge.as_ref(),
            JudgeKind::Extract => self.extract_judge.as_ref(),
        }
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Ask one judge. Errors count as a failing verdict.
    async fn consult(&self, kind: JudgeKind, condition: &str, context: &JudgeContext, round: u32) -> bool {
        match self.judge(kind).evaluate(condition, context).await {
            Ok(verdict) => {
                debug!(
                    judge = %kind,
                    round,
                    passed = verdict.passed,
                    actual = %verdict.actual,
                    "judge verdict"
                );
                verdict.passed
            }
            Err(e) => {
                let err = VigilError::JudgeError {
                    judge: kind.to_string(),
                    reason: e.to_string(),
                };
                warn!(judge = %kind, round, error = %err, "judge errored; counting as fail");
                false
            }
        }
    }

    /// Run primary/rescue rounds until one judge passes or rounds run out.
    async fn run_rounds(
        &self,
        condition: &str,
        context: &CheckContext,
        driver: &dyn SessionDriver,
    ) -> CheckOutcome {
        let (primary, rescue) = Self::judge_order(context.navigated);
        let max_rounds = self.settings.max_rounds.max(1);

        for round in 1..=max_rounds {
            let current = observe(driver).await;
            let judge_context = JudgeContext {
                before: context.before.clone(),
                current,
            };

            if self.consult(primary, condition, &judge_context, round).await {
                return CheckOutcome {
                    passed: true,
                    resolution: CheckResolution::Primary { judge: primary },
                    rounds: round,
                    message: format!("passed by {primary} (primary) in round {round}"),
                };
            }

            if self.consult(rescue, condition, &judge_context, round).await {
                info!(
                    primary = %primary,
                    rescue = %rescue,
                    round,
                    "rescue judge overturned primary failure"
                );
                return CheckOutcome {
                    passed: true,
                    resolution: CheckResolution::Rescued { judge: rescue },
                    rounds: round,
                    message: format!(
                        "passed by {rescue} (rescue) after {primary} failed in round {round}; false negative mitigated"
                    ),
                };
            }

            if round < max_rounds {
                debug!(round, backoff_ms = self.settings.backoff_ms, "both judges failed; backing off");
                tokio::time::sleep(self.settings.backoff()).await;
            }
        }

        let page = observe(driver).await;
        CheckOutcome {
            passed: false,
            resolution: CheckResolution::ConfirmedFailure,
            rounds: max_rounds,
            message: format!(
                "both judges failed in all {max_rounds} rounds ({})",
                self.diagnostics(&page)
            ),
        }
    }

    fn diagnostics(&self, page: &PageSnapshot) -> Diagnostics {
        Diagnostics {
            location: page.location.clone(),
            title: page.title.clone(),
            elements: page
                .elements
                .iter()
                .take(self.settings.diagnostic_elements)
                .cloned()
                .collect(),
        }
    }
}

#[async_trait]
impl CheckVerifier for DualOracleVerifier {
    async fn verify(
        &self,
        condition: &str,
        context: &CheckContext,
        driver: &dyn SessionDriver,
    ) -> CheckOutcome {
        if let CheckKind::Deterministic(check) = classify_check(condition) {
            let page = observe(driver).await;
            if check.holds(&page) {
                debug!(condition, "check passed on quoted-text fast path");
                return CheckOutcome {
                    passed: true,
                    resolution: CheckResolution::FastPath,
                    rounds: 0,
                    message: "quoted text matched visible page text".to_string(),
                };
            }
            debug!(condition, "quoted-text fast path missed; consulting judges");
        }

        let budget = self.settings.check_timeout();
        match tokio::time::timeout(budget, self.run_rounds(condition, context, driver)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let err = VigilError::Timeout {
                    operation: "check".to_string(),
                    budget_ms: self.settings.check_timeout_ms,
                };
                warn!(condition, error = %err, "check verification timed out");
                let page = observe(driver).await;
                CheckOutcome {
                    passed: false,
                    resolution: CheckResolution::TimedOut,
                    rounds: 0,
                    message: format!("{err} ({})", self.diagnostics(&page)),
                }
            }
        }
    }
}

/// Snapshot the page, falling back to an empty observation on error.
async fn observe(driver: &dyn SessionDriver) -> PageSnapshot {
    driver.snapshot().await.unwrap_or_else(|e| {
        warn!(error = %e, "could not observe page for check");
        PageSnapshot::default()
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use vigil_contracts::{
        action::{CheckContext, CheckResolution, JudgeContext, JudgeKind, JudgeVerdict},
        config::OracleSettings,
        error::{VigilError, VigilResult},
        session::PageSnapshot,
    };
    use vigil_core::traits::{CheckVerifier, Judge, SessionDriver};

    use super::DualOracleVerifier;

    // ── Mock collaborators ───────────────────────────────────────────────────

    #[derive(Clone, Copy)]
    enum Answer {
        Pass,
        Fail,
        Error,
        /// Fail for the first N calls, then pass.
        PassFrom(usize),
        Hang,
    }

    struct CountingJudge {
        answer: Answer,
        calls: AtomicUsize,
    }

    impl CountingJudge {
        fn new(answer: Answer) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Judge for CountingJudge {
        async fn evaluate(&self, _condition: &str, _context: &JudgeContext) -> VigilResult<JudgeVerdict> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let passed = match self.answer {
                Answer::Pass => true,
                Answer::Fail => false,
                Answer::PassFrom(n) => call >= n,
                Answer::Error => {
                    return Err(VigilError::JudgeError {
                        judge: "mock".into(),
                        reason: "model unavailable".into(),
                    })
                }
                Answer::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    false
                }
            };
            Ok(JudgeVerdict {
                passed,
                actual: "observed".into(),
                reasoning: None,
            })
        }
    }

    struct StaticPage(PageSnapshot);

    impl StaticPage {
        fn new(text: &str) -> Self {
            Self(PageSnapshot {
                location: "http://app.test/items".into(),
                title: "Items".into(),
                visible_text: text.into(),
                elements: (1..=8).map(|i| format!("button {i}")).collect(),
            })
        }
    }

    #[async_trait]
    impl SessionDriver for StaticPage {
        async fn snapshot(&self) -> VigilResult<PageSnapshot> {
            Ok(self.0.clone())
        }
        async fn goto(&self, _url: &str) -> VigilResult<()> {
            Ok(())
        }
        async fn soft_navigate(&self, _path: &str) -> VigilResult<()> {
            Ok(())
        }
        async fn clear_client_state(&self) -> VigilResult<()> {
            Ok(())
        }
        async fn reload(&self) -> VigilResult<()> {
            Ok(())
        }
    }

    fn verifier(diff: &Arc<CountingJudge>, extract: &Arc<CountingJudge>) -> DualOracleVerifier {
        DualOracleVerifier::new(
            Arc::clone(diff) as Arc<dyn Judge>,
            Arc::clone(extract) as Arc<dyn Judge>,
            OracleSettings::default(),
        )
    }

    fn stayed() -> CheckContext {
        CheckContext::default()
    }

    fn navigated() -> CheckContext {
        CheckContext {
            before: None,
            navigated: true,
        }
    }

    const SEMANTIC: &str = "The new item appears in the list";

    // ── Primary/rescue selection ─────────────────────────────────────────────

    #[tokio::test]
    async fn primary_pass_never_calls_rescue() {
        let diff = CountingJudge::new(Answer::Pass);
        let extract = CountingJudge::new(Answer::Pass);
        let page = StaticPage::new("");

        let outcome = verifier(&diff, &extract).verify(SEMANTIC, &stayed(), &page).await;

        assert!(outcome.passed);
        assert_eq!(outcome.resolution, CheckResolution::Primary { judge: JudgeKind::Diff });
        assert_eq!(diff.calls(), 1);
        assert_eq!(extract.calls(), 0);
    }

    #[tokio::test]
    async fn extract_judge_is_primary_after_navigation() {
        let diff = CountingJudge::new(Answer::Pass);
        let extract = CountingJudge::new(Answer::Pass);
        let page = StaticPage::new("");

        let outcome = verifier(&diff, &extract).verify(SEMANTIC, &navigated(), &page).await;

        assert_eq!(outcome.resolution, CheckResolution::Primary { judge: JudgeKind::Extract });
        assert_eq!(extract.calls(), 1);
        assert_eq!(diff.calls(), 0);
    }

    #[tokio::test]
    async fn rescue_overturns_primary_failure() {
        let diff = CountingJudge::new(Answer::Fail);
        let extract = CountingJudge::new(Answer::Pass);
        let page = StaticPage::new("");

        let outcome = verifier(&diff, &extract).verify(SEMANTIC, &stayed(), &page).await;

        assert!(outcome.passed);
        assert_eq!(outcome.resolution, CheckResolution::Rescued { judge: JudgeKind::Extract });
        assert!(outcome.message.contains("extract judge (rescue)"), "{}", outcome.message);
        assert_eq!(outcome.rounds, 1);
    }

    #[tokio::test]
    async fn judge_errors_count_as_failures() {
        let diff = CountingJudge::new(Answer::Error);
        let extract = CountingJudge::new(Answer::Pass);
        let page = StaticPage::new("");

        let outcome = verifier(&diff, &extract).verify(SEMANTIC, &stayed(), &page).await;

        assert!(outcome.passed);
        assert_eq!(outcome.resolution, CheckResolution::Rescued { judge: JudgeKind::Extract });
    }

    // ── Retry rounds ─────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn both_failing_confirms_failure_with_one_call_per_round() {
        let diff = CountingJudge::new(Answer::Fail);
        let extract = CountingJudge::new(Answer::Error);
        let page = StaticPage::new("");

        let outcome = verifier(&diff, &extract).verify(SEMANTIC, &stayed(), &page).await;

        assert!(!outcome.passed);
        assert_eq!(outcome.resolution, CheckResolution::ConfirmedFailure);
        assert_eq!(outcome.rounds, 3);
        assert_eq!(diff.calls(), 3);
        assert_eq!(extract.calls(), 3);
        assert!(outcome.message.contains("http://app.test/items"));
        assert!(outcome.message.contains("button 5"));
        assert!(!outcome.message.contains("button 6"));
    }

    #[tokio::test(start_paused = true)]
    async fn later_round_can_pass() {
        let diff = CountingJudge::new(Answer::PassFrom(1));
        let extract = CountingJudge::new(Answer::Fail);
        let page = StaticPage::new("");

        let outcome = verifier(&diff, &extract).verify(SEMANTIC, &stayed(), &page).await;

        assert!(outcome.passed);
        assert_eq!(outcome.rounds, 2);
        assert_eq!(extract.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_judge_times_out() {
        let diff = CountingJudge::new(Answer::Hang);
        let extract = CountingJudge::new(Answer::Pass);
        let page = StaticPage::new("");

        let outcome = verifier(&diff, &extract).verify(SEMANTIC, &stayed(), &page).await;

        assert!(!outcome.passed);
        assert_eq!(outcome.resolution, CheckResolution::TimedOut);
        assert!(outcome.message.contains("timed out after 60000ms"));
        assert_eq!(extract.calls(), 0);
    }

    // ── Fast path ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn quoted_text_match_skips_judges() {
        let diff = CountingJudge::new(Answer::Fail);
        let extract = CountingJudge::new(Answer::Fail);
        let page = StaticPage::new("Your items: Buy milk");

        let outcome = verifier(&diff, &extract)
            .verify(r#"The list shows "Buy milk""#, &stayed(), &page)
            .await;

        assert!(outcome.passed);
        assert_eq!(outcome.resolution, CheckResolution::FastPath);
        assert_eq!(diff.calls() + extract.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn quoted_labels_do_not_decide_an_action_check() {
        let diff = CountingJudge::new(Answer::Fail);
        let extract = CountingJudge::new(Answer::Fail);
        // Both labels are visible but nothing was deleted.
        let page = StaticPage::new("Your items: Buy milk [Delete]");

        let outcome = verifier(&diff, &extract)
            .verify(r#"Clicking "Delete" deletes "Buy milk" from the list"#, &stayed(), &page)
            .await;

        assert!(!outcome.passed);
        assert_eq!(outcome.resolution, CheckResolution::ConfirmedFailure);
        assert_eq!(diff.calls(), 3);
        assert_eq!(extract.calls(), 3);
    }

    #[tokio::test]
    async fn quoted_text_miss_falls_through_to_judges() {
        let diff = CountingJudge::new(Answer::Pass);
        let extract = CountingJudge::new(Answer::Pass);
        let page = StaticPage::new("Your items: (rendered in a canvas)");

        let outcome = verifier(&diff, &extract)
            .verify(r#"The list shows "Buy milk""#, &stayed(), &page)
            .await;

        assert!(outcome.passed);
        assert_eq!(outcome.resolution, CheckResolution::Primary { judge: JudgeKind::Diff });
        assert_eq!(diff.calls(), 1);
    }
}
