//! The VIGIL orchestrator: turns a behavior graph into per-behavior verdicts.
//!
//! Per behavior the state machine is
//!
//!   pending → skipped (dependency_failed)
//!   pending → running → pass | fail
//!
//! A behavior is skipped, without touching the session, when it sits in the
//! cascade skip set or any direct dependency has a non-pass verdict. A failure
//! adds every transitive dependent to the skip set.
//!
//! Two strategies exist and exactly one is used per run:
//!
//! - **Continuous**: sort once, run identity behaviors in the fixed
//!   sign-up, sign-out, sign-in order, then everything else in
//!   topological order in one session.
//! - **Isolated chain**: identity behaviors as above, then for each other
//!   behavior re-run its whole dependency chain from a hard reset.
//!
//! Every behavior execution is raced against `timeouts.behavior_ms`.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use vigil_contracts::{
    action::CheckContext,
    behavior::{Behavior, BehaviorMap, Step},
    config::{ExecutionStrategy, RunConfig},
    error::{VigilError, VigilResult},
    result::{BehaviorResult, BehaviorStatus, RunId, RunReport, RunSummary},
    session::{PageSnapshot, SessionMode},
};

use crate::{
    context::VerificationContext,
    credentials::CredentialManager,
    graph::{self, DependentsIndex},
    instruction,
    session::SessionController,
    traits::{ActionExecutor, CheckVerifier, SessionDriver},
};

/// Mutable state of one run, threaded explicitly through every call.
struct RunState {
    run_id: RunId,
    context: VerificationContext,
    credentials: CredentialManager,
    dependents: DependentsIndex,
    /// Whether the shared session has had its initial hard reset.
    session_started: bool,
}

/// Drives a full verification run against one external system.
///
/// Construct one orchestrator per target system. `run` may be called
/// repeatedly; each call builds fresh run state.
pub struct Orchestrator {
    config: RunConfig,
    driver: Arc<dyn SessionDriver>,
    executor: Arc<dyn ActionExecutor>,
    verifier: Box<dyn CheckVerifier>,
    session: SessionController,
}

impl Orchestrator {
    pub fn new(
        config: RunConfig,
        driver: Arc<dyn SessionDriver>,
        executor: Arc<dyn ActionExecutor>,
        verifier: Box<dyn CheckVerifier>,
    ) -> Self {
        let session = SessionController::new(
            Arc::clone(&driver),
            Arc::clone(&executor),
            config.base_url.clone(),
            config.session.clone(),
        );
        Self {
            config,
            driver,
            executor,
            verifier,
            session,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Verify every behavior in `behaviors` and produce the run report.
    ///
    /// # Errors
    ///
    /// Only malformed graphs abort a run: `CycleDetected`,
    /// `DependencyNotFound`, and `ScenarioNotFound`. Every other failure is
    /// contained in the failing behavior's result.
    pub async fn run(&self, behaviors: &BehaviorMap) -> VigilResult<RunReport> {
        let started_at = Utc::now();
        let run_id = RunId::new();
        let strategy = self.config.strategy;

        graph::validate_graph(behaviors)?;
        let order = graph::topological_sort(behaviors)?;
        let (auth, rest) = partition_auth(&order, behaviors);

        info!(
            run_id = %run_id,
            strategy = ?strategy,
            behaviors = behaviors.len(),
            auth = auth.len(),
            "verification run starting"
        );

        let mut state = RunState {
            run_id,
            context: VerificationContext::new(),
            credentials: CredentialManager::new(self.config.credentials.clone()),
            dependents: DependentsIndex::build(behaviors),
            session_started: false,
        };

        for behavior in &auth {
            self.verify_in_session(behavior, behaviors, &mut state).await;
        }

        match strategy {
            ExecutionStrategy::Continuous => {
                for behavior in &rest {
                    self.verify_in_session(behavior, behaviors, &mut state).await;
                }
            }
            ExecutionStrategy::IsolatedChain => {
                for behavior in &rest {
                    self.verify_isolated(behavior, behaviors, &mut state).await?;
                }
            }
        }

        let results = state.context.into_results();
        let summary = RunSummary::from_results(&results);
        info!(
            run_id = %run_id,
            passed = summary.passed,
            failed = summary.failed,
            dependency_failed = summary.dependency_failed,
            "verification run complete"
        );

        Ok(RunReport {
            run_id,
            strategy,
            started_at,
            finished_at: Utc::now(),
            results,
            summary,
        })
    }

    // ── Strategies ────────────────────────────────────────────────────────────

    /// Run one behavior in the shared session (continuous strategy and the
    /// identity prefix of both strategies).
    async fn verify_in_session(&self, behavior: &Behavior, behaviors: &BehaviorMap, state: &mut RunState) {
        if let Some(skipped) = precheck(behavior, behaviors, &state.context) {
            self.finish(behavior, skipped, state);
            return;
        }

        let mode = if !state.session_started {
            SessionMode::HardReset
        } else if behavior.page_path.is_some() {
            SessionMode::SoftNavigate
        } else {
            SessionMode::Preserve
        };
        state.session_started = true;

        let result = self
            .execute_guarded(behavior, None, mode, &mut state.credentials, state.run_id)
            .await;
        self.finish(behavior, result, state);
    }

    /// Re-run `target`'s full dependency chain from a hard reset.
    ///
    /// Prerequisite runs produce their own results, attached to the target's
    /// result as `chain_results`; the shared verdicts of those prerequisites
    /// are never touched.
    async fn verify_isolated(
        &self,
        target: &Behavior,
        behaviors: &BehaviorMap,
        state: &mut RunState,
    ) -> VigilResult<()> {
        if let Some(skipped) = precheck(target, behaviors, &state.context) {
            self.finish(target, skipped, state);
            return Ok(());
        }

        let chain = graph::resolve_chain(&target.id, behaviors)?;
        let Some((_, prerequisites)) = chain.split_last() else {
            return Ok(());
        };

        debug!(
            run_id = %state.run_id,
            behavior_id = %target.id,
            chain_len = chain.len(),
            "rebuilding dependency chain"
        );

        state.credentials.reset();
        let started = Instant::now();
        let mut chain_results = Vec::with_capacity(prerequisites.len());

        for (position, link) in prerequisites.iter().enumerate() {
            let mode = chain_mode(position, link.behavior);
            let result = self
                .execute_guarded(
                    link.behavior,
                    link.scenario_name.as_deref(),
                    mode,
                    &mut state.credentials,
                    state.run_id,
                )
                .await;
            let passed = result.passed();
            let error = result.error.clone().unwrap_or_default();
            chain_results.push(result);

            if !passed {
                warn!(
                    run_id = %state.run_id,
                    behavior_id = %target.id,
                    prerequisite = %link.behavior.id,
                    "prerequisite failed while rebuilding chain"
                );
                let mut result = BehaviorResult::dependency_failed(
                    &target.id,
                    &target.title,
                    &link.behavior.title,
                    format!(
                        "prerequisite '{}' failed while rebuilding chain: {error}",
                        link.behavior.title
                    ),
                );
                result.duration = started.elapsed();
                result.chain_results = chain_results;
                self.finish(target, result, state);
                return Ok(());
            }
        }

        let mode = chain_mode(prerequisites.len(), target);
        let mut result = self
            .execute_guarded(target, None, mode, &mut state.credentials, state.run_id)
            .await;
        result.chain_results = chain_results;
        self.finish(target, result, state);
        Ok(())
    }

    /// Record a verdict and cascade skips for failures.
    fn finish(&self, behavior: &Behavior, result: BehaviorResult, state: &mut RunState) {
        match result.status {
            BehaviorStatus::Pass => info!(
                run_id = %state.run_id,
                behavior_id = %behavior.id,
                duration_ms = result.duration.as_millis() as u64,
                "behavior passed"
            ),
            BehaviorStatus::Fail => {
                warn!(
                    run_id = %state.run_id,
                    behavior_id = %behavior.id,
                    error = result.error.as_deref().unwrap_or(""),
                    "behavior failed"
                );
                state.dependents.cascade_skip(&behavior.id, &mut state.context);
            }
            BehaviorStatus::DependencyFailed => info!(
                run_id = %state.run_id,
                behavior_id = %behavior.id,
                failed_dependency = result.failed_dependency.as_deref().unwrap_or(""),
                "behavior skipped"
            ),
        }
        state.context.record(result);
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Execute one behavior within the per-behavior wall-clock budget.
    ///
    /// On timeout the in-flight execution is dropped and a failure tagged as
    /// a timeout is returned in its place.
    async fn execute_guarded(
        &self,
        behavior: &Behavior,
        scenario_name: Option<&str>,
        mode: SessionMode,
        credentials: &mut CredentialManager,
        run_id: RunId,
    ) -> BehaviorResult {
        let budget = self.config.timeouts.behavior();
        let started = Instant::now();

        match tokio::time::timeout(
            budget,
            self.execute_behavior(behavior, scenario_name, mode, credentials),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                let err = VigilError::Timeout {
                    operation: format!("behavior '{}'", behavior.id),
                    budget_ms: self.config.timeouts.behavior_ms,
                };
                warn!(run_id = %run_id, behavior_id = %behavior.id, "behavior timed out");
                BehaviorResult::fail(&behavior.id, &behavior.title, err.to_string(), started.elapsed())
            }
        }
    }

    async fn execute_behavior(
        &self,
        behavior: &Behavior,
        scenario_name: Option<&str>,
        mode: SessionMode,
        credentials: &mut CredentialManager,
    ) -> BehaviorResult {
        let started = Instant::now();
        let fail = |message: String| {
            BehaviorResult::fail(&behavior.id, &behavior.title, message, started.elapsed())
        };

        let Some(scenario) = behavior.scenario(scenario_name) else {
            return fail(format!(
                "behavior '{}' has no scenario {}",
                behavior.id,
                scenario_name.map_or("to run".to_string(), |n| format!("named '{n}'"))
            ));
        };

        debug!(behavior_id = %behavior.id, scenario = %scenario.name, mode = ?mode, "executing behavior");

        if let Err(e) = self
            .session
            .prepare(mode, behavior.page_path.as_deref(), credentials.state())
            .await
        {
            return fail(e.to_string());
        }

        let steps = credentials.prepare_steps(behavior, scenario);
        let mut check_context = CheckContext::default();

        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            match step {
                Step::Act { instruction } => {
                    let before = match self.driver.snapshot().await {
                        Ok(page) => page,
                        Err(e) => return fail(format!("step {number} could not observe page: {e}")),
                    };
                    if let Err(message) = self.run_act(step, &before).await {
                        return fail(format!("step {number} failed: {instruction}: {message}"));
                    }
                    let after = self.driver.snapshot().await.unwrap_or_else(|e| {
                        warn!(error = %e, "could not observe page after action");
                        PageSnapshot::default()
                    });
                    check_context = CheckContext {
                        navigated: before.location != after.location,
                        before: Some(before),
                    };
                }
                Step::Check { instruction } => {
                    let outcome = self
                        .verifier
                        .verify(instruction, &check_context, self.driver.as_ref())
                        .await;
                    if !outcome.passed {
                        return fail(format!(
                            "step {number} check failed: {instruction}: {}",
                            outcome.message
                        ));
                    }
                    debug!(
                        behavior_id = %behavior.id,
                        step = number,
                        resolution = ?outcome.resolution,
                        "check passed"
                    );
                }
            }
        }

        if instruction::is_account_creation(behavior) && !instruction::is_invalid_credentials(behavior) {
            credentials.capture_from_steps(&steps);
        }

        BehaviorResult::pass(&behavior.id, &behavior.title, started.elapsed())
    }

    /// Run one Act step, folding executor errors into a failure message.
    async fn run_act(&self, step: &Step, page: &PageSnapshot) -> Result<(), String> {
        match self.executor.execute(step, page).await {
            Ok(outcome) if outcome.success => Ok(()),
            Ok(outcome) => {
                let mut message = outcome.error.unwrap_or_else(|| "action failed".to_string());
                if let Some(diagnostics) = outcome.diagnostics {
                    message.push_str(&format!(" ({diagnostics})"));
                }
                Err(message)
            }
            Err(e) => Err(VigilError::StepExecutionFailure {
                reason: e.to_string(),
            }
            .to_string()),
        }
    }
}

// ── Scheduling helpers ────────────────────────────────────────────────────────

/// Split a topological order into the identity prefix and everything else.
///
/// Identity behaviors are ordered by `AUTH_ORDER`; within one kind,
/// deliberate wrong-credential behaviors go first, then topological order.
fn partition_auth<'a>(order: &[String], behaviors: &'a BehaviorMap) -> (Vec<&'a Behavior>, Vec<&'a Behavior>) {
    let mut auth = Vec::new();
    let mut rest = Vec::new();
    for (position, id) in order.iter().enumerate() {
        let Some(behavior) = behaviors.get(id) else {
            continue;
        };
        match instruction::classify_auth(behavior) {
            Some(kind) => auth.push((
                (kind.rank(), !instruction::is_invalid_credentials(behavior), position),
                behavior,
            )),
            None => rest.push(behavior),
        }
    }
    auth.sort_by_key(|(key, _)| *key);
    (auth.into_iter().map(|(_, b)| b).collect(), rest)
}

/// Session mode for the entry at `position` of an isolated chain.
fn chain_mode(position: usize, behavior: &Behavior) -> SessionMode {
    if position == 0 {
        SessionMode::HardReset
    } else if behavior.page_path.is_some() {
        SessionMode::SoftNavigate
    } else {
        SessionMode::Preserve
    }
}

/// The `dependency_failed` verdict for a behavior that must not run, if any.
fn precheck(behavior: &Behavior, behaviors: &BehaviorMap, context: &VerificationContext) -> Option<BehaviorResult> {
    let title_of = |id: &str| {
        behaviors
            .get(id)
            .map_or_else(|| id.to_string(), |b| b.title.clone())
    };

    let decision = context.should_skip(behavior.dependency_ids());
    if decision.skip {
        let failed = decision.failed_dependency.as_deref().unwrap_or_default();
        return Some(BehaviorResult::dependency_failed(
            &behavior.id,
            &behavior.title,
            title_of(failed),
            decision.reason.unwrap_or_default(),
        ));
    }

    context.skip_cause(&behavior.id).map(|cause| {
        let cause_title = title_of(cause);
        BehaviorResult::dependency_failed(
            &behavior.id,
            &behavior.title,
            cause_title.clone(),
            format!("skipped because '{cause_title}' failed"),
        )
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use async_trait::async_trait;
    use vigil_contracts::{
        action::{CheckOutcome, CheckResolution, StepOutcome},
        behavior::{Behavior, BehaviorMap, Scenario},
        config::{ExecutionStrategy, RunConfig},
        error::VigilResult,
        result::BehaviorStatus,
        session::PageSnapshot,
    };

    use super::*;

    // ── Mock collaborators ───────────────────────────────────────────────────

    /// Records every driver call; the page never changes.
    #[derive(Default)]
    struct MockDriver {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SessionDriver for MockDriver {
        async fn snapshot(&self) -> VigilResult<PageSnapshot> {
            Ok(PageSnapshot {
                location: "http://app.test/".to_string(),
                title: "App".to_string(),
                ..PageSnapshot::default()
            })
        }
        async fn goto(&self, url: &str) -> VigilResult<()> {
            self.calls.lock().unwrap().push(format!("goto {url}"));
            Ok(())
        }
        async fn soft_navigate(&self, path: &str) -> VigilResult<()> {
            self.calls.lock().unwrap().push(format!("soft {path}"));
            Ok(())
        }
        async fn clear_client_state(&self) -> VigilResult<()> {
            Ok(())
        }
        async fn reload(&self) -> VigilResult<()> {
            Ok(())
        }
    }

    /// Executes every Act, failing those whose instruction contains a marker.
    #[derive(Default)]
    struct MockExecutor {
        executed: Mutex<Vec<String>>,
        failing: HashSet<String>,
        hang_on: Option<String>,
    }

    impl MockExecutor {
        fn failing(markers: &[&str]) -> Self {
            Self {
                failing: markers.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            }
        }

        fn executed(&self) -> Vec<String> {
            self.executed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActionExecutor for MockExecutor {
        async fn execute(&self, step: &Step, _page: &PageSnapshot) -> VigilResult<StepOutcome> {
            let instruction = step.instruction().to_string();
            self.executed.lock().unwrap().push(instruction.clone());
            if self.hang_on.as_deref().is_some_and(|m| instruction.contains(m)) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.failing.iter().any(|m| instruction.contains(m.as_str())) {
                return Ok(StepOutcome::failed("element not found", Duration::ZERO, None));
            }
            Ok(StepOutcome::succeeded(Duration::from_millis(5)))
        }
    }

    /// Passes every check except those mentioning "never".
    struct MockVerifier;

    #[async_trait]
    impl CheckVerifier for MockVerifier {
        async fn verify(
            &self,
            condition: &str,
            _context: &CheckContext,
            _driver: &dyn SessionDriver,
        ) -> CheckOutcome {
            let passed = !condition.contains("never");
            CheckOutcome {
                passed,
                resolution: if passed {
                    CheckResolution::FastPath
                } else {
                    CheckResolution::ConfirmedFailure
                },
                rounds: 1,
                message: if passed { "ok".into() } else { "condition not met".into() },
            }
        }
    }

    fn behavior(id: &str, title: &str, deps: &[&str]) -> Behavior {
        let mut b = Behavior::new(id, title).with_scenario(
            Scenario::new("default")
                .act(format!("do {id}"))
                .check(format!("{id} worked")),
        );
        for dep in deps {
            b = b.depends_on(*dep);
        }
        b
    }

    fn graph(nodes: Vec<Behavior>) -> BehaviorMap {
        nodes.into_iter().map(|b| (b.id.clone(), b)).collect()
    }

    fn todo_graph() -> BehaviorMap {
        graph(vec![
            behavior("sign-up", "Sign Up", &[]),
            behavior("create-item", "Create Item", &["sign-up"]),
            behavior("delete-item", "Delete Item", &["create-item"]),
        ])
    }

    fn orchestrator(config: RunConfig, executor: Arc<MockExecutor>) -> (Orchestrator, Arc<MockDriver>) {
        let driver = Arc::new(MockDriver::default());
        let orchestrator = Orchestrator::new(
            config,
            Arc::clone(&driver) as Arc<dyn SessionDriver>,
            executor as Arc<dyn ActionExecutor>,
            Box::new(MockVerifier),
        );
        (orchestrator, driver)
    }

    fn isolated() -> RunConfig {
        RunConfig {
            strategy: ExecutionStrategy::IsolatedChain,
            ..RunConfig::default()
        }
    }

    // ── Continuous strategy ──────────────────────────────────────────────────

    #[tokio::test]
    async fn continuous_all_pass_in_topological_order() {
        let executor = Arc::new(MockExecutor::default());
        let (orch, driver) = orchestrator(RunConfig::default(), Arc::clone(&executor));

        let report = orch.run(&todo_graph()).await.unwrap();

        let ids: Vec<&str> = report.results.iter().map(|r| r.behavior_id.as_str()).collect();
        assert_eq!(ids, vec!["sign-up", "create-item", "delete-item"]);
        assert_eq!(report.summary.passed, 3);
        assert_eq!(executor.executed(), vec!["do sign-up", "do create-item", "do delete-item"]);
        // Exactly one hard reset for the whole continuous session.
        let gotos = driver.calls.lock().unwrap().iter().filter(|c| c.starts_with("goto")).count();
        assert_eq!(gotos, 2);
    }

    #[tokio::test]
    async fn failure_cascades_to_dependents_without_executing_them() {
        let executor = Arc::new(MockExecutor::failing(&["do create-item"]));
        let (orch, _) = orchestrator(RunConfig::default(), Arc::clone(&executor));

        let report = orch.run(&todo_graph()).await.unwrap();

        assert_eq!(report.result("sign-up").unwrap().status, BehaviorStatus::Pass);
        assert_eq!(report.result("create-item").unwrap().status, BehaviorStatus::Fail);
        let delete = report.result("delete-item").unwrap();
        assert_eq!(delete.status, BehaviorStatus::DependencyFailed);
        assert_eq!(delete.failed_dependency.as_deref(), Some("Create Item"));
        assert!(!executor.executed().iter().any(|i| i == "do delete-item"));
    }

    #[tokio::test]
    async fn cascade_reaches_grandchildren() {
        let executor = Arc::new(MockExecutor::failing(&["do a"]));
        let (orch, _) = orchestrator(RunConfig::default(), Arc::clone(&executor));
        let behaviors = graph(vec![
            behavior("a", "A", &[]),
            behavior("b", "B", &["a"]),
            behavior("c", "C", &["b"]),
            behavior("x", "X", &[]),
        ]);

        let report = orch.run(&behaviors).await.unwrap();

        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.dependency_failed, 2);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.result("c").unwrap().failed_dependency.as_deref(), Some("B"));
        assert_eq!(executor.executed(), vec!["do a", "do x"]);
    }

    #[tokio::test]
    async fn failing_check_fails_behavior() {
        let executor = Arc::new(MockExecutor::default());
        let (orch, _) = orchestrator(RunConfig::default(), executor);
        let behaviors = graph(vec![Behavior::new("flaky", "Flaky").with_scenario(
            Scenario::new("default").act("click").check("it never appears"),
        )]);

        let report = orch.run(&behaviors).await.unwrap();

        let result = report.result("flaky").unwrap();
        assert_eq!(result.status, BehaviorStatus::Fail);
        assert!(result.error.as_deref().unwrap().contains("check failed"));
    }

    #[tokio::test]
    async fn reward_for_mixed_run() {
        let executor = Arc::new(MockExecutor::failing(&["do b"]));
        let (orch, _) = orchestrator(RunConfig::default(), executor);
        let behaviors = graph(vec![
            behavior("a", "A", &[]),
            behavior("b", "B", &[]),
            behavior("c", "C", &["b"]),
            behavior("d", "D", &[]),
        ]);

        let report = orch.run(&behaviors).await.unwrap();

        assert_eq!(report.summary.total, 4);
        assert!((report.summary.reward - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn cycles_abort_the_run() {
        let executor = Arc::new(MockExecutor::default());
        let (orch, _) = orchestrator(RunConfig::default(), Arc::clone(&executor));
        let behaviors = graph(vec![behavior("a", "A", &["b"]), behavior("b", "B", &["a"])]);

        let err = orch.run(&behaviors).await.unwrap_err();

        assert!(matches!(err, VigilError::CycleDetected { .. }));
        assert!(executor.executed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fails_behavior_and_cascades() {
        let executor = Arc::new(MockExecutor {
            hang_on: Some("do create-item".to_string()),
            ..MockExecutor::default()
        });
        let mut config = RunConfig::default();
        config.timeouts.behavior_ms = 1_000;
        let (orch, _) = orchestrator(config, executor);

        let report = orch.run(&todo_graph()).await.unwrap();

        let create = report.result("create-item").unwrap();
        assert_eq!(create.status, BehaviorStatus::Fail);
        assert!(create.error.as_deref().unwrap().contains("timed out after 1000ms"));
        assert_eq!(
            report.result("delete-item").unwrap().status,
            BehaviorStatus::DependencyFailed
        );
    }

    #[tokio::test]
    async fn identity_behaviors_run_in_fixed_order() {
        let executor = Arc::new(MockExecutor::default());
        let (orch, _) = orchestrator(RunConfig::default(), Arc::clone(&executor));
        // Declared sign-in first; all three only depend on sign-up.
        let behaviors = graph(vec![
            behavior("sign-up", "Sign Up", &[]),
            behavior("sign-in", "Sign In", &["sign-up"]),
            behavior("view-items", "View Items", &["sign-up"]),
            behavior("sign-in-wrong-password", "Sign In With Wrong Password", &["sign-up"]),
            behavior("sign-out", "Sign Out", &["sign-up"]),
        ]);

        orch.run(&behaviors).await.unwrap();

        assert_eq!(
            executor.executed(),
            vec![
                "do sign-up",
                "do sign-out",
                "do sign-in-wrong-password",
                "do sign-in",
                "do view-items",
            ]
        );
    }

    #[tokio::test]
    async fn failed_root_never_executes_its_ten_descendants() {
        let executor = Arc::new(MockExecutor::failing(&["do root"]));
        let (orch, _) = orchestrator(RunConfig::default(), Arc::clone(&executor));
        let mut nodes = vec![behavior("root", "Root", &[]), behavior("other", "Other", &[])];
        for i in 0..10 {
            let parent = if i < 3 { "root".to_string() } else { format!("n{}", i - 3) };
            nodes.push(behavior(&format!("n{i}"), &format!("N{i}"), &[parent.as_str()]));
        }

        let report = orch.run(&graph(nodes)).await.unwrap();

        assert_eq!(executor.executed(), vec!["do root", "do other"]);
        assert_eq!(report.summary.dependency_failed, 10);
        for i in 0..10 {
            let result = report.result(&format!("n{i}")).unwrap();
            assert_eq!(result.status, BehaviorStatus::DependencyFailed);
        }
    }

    #[tokio::test]
    async fn invalid_sign_up_is_neither_rewritten_nor_captured() {
        let executor = Arc::new(MockExecutor::default());
        let (orch, _) = orchestrator(RunConfig::default(), Arc::clone(&executor));
        let behaviors = graph(vec![
            Behavior::new("sign-up-invalid-email", "Sign Up With Invalid Email").with_scenario(
                Scenario::new("default")
                    .act(r#"Set the email field to "not-an-email""#)
                    .act(r#"Set the password field to "x""#),
            ),
            Behavior::new("sign-in", "Sign In")
                .depends_on("sign-up-invalid-email")
                .with_scenario(
                    Scenario::new("default")
                        .act(r#"Set the email field to "ada@example.com""#)
                        .act(r#"Set the password field to "hunter22""#),
                ),
        ]);

        let report = orch.run(&behaviors).await.unwrap();

        assert_eq!(report.summary.passed, 2);
        assert_eq!(
            executor.executed(),
            vec![
                r#"Set the email field to "not-an-email""#,
                r#"Set the password field to "x""#,
                r#"Set the email field to "ada@example.com""#,
                r#"Set the password field to "hunter22""#,
            ]
        );
    }

    // ── Isolated-chain strategy ──────────────────────────────────────────────

    #[tokio::test]
    async fn isolated_chain_reruns_prerequisites_from_hard_reset() {
        let executor = Arc::new(MockExecutor::default());
        let (orch, driver) = orchestrator(isolated(), Arc::clone(&executor));

        let report = orch.run(&todo_graph()).await.unwrap();

        assert_eq!(report.summary.passed, 3);
        assert_eq!(
            executor.executed(),
            vec![
                "do sign-up",
                // create-item chain
                "do sign-up",
                "do create-item",
                // delete-item chain
                "do sign-up",
                "do create-item",
                "do delete-item",
            ]
        );
        let resets = driver
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == "goto about:blank")
            .count();
        assert_eq!(resets, 3);

        let delete = report.result("delete-item").unwrap();
        let chain: Vec<&str> = delete.chain_results.iter().map(|r| r.behavior_id.as_str()).collect();
        assert_eq!(chain, vec!["sign-up", "create-item"]);
    }

    #[tokio::test]
    async fn isolated_chain_never_overwrites_standalone_verdicts() {
        let executor = Arc::new(MockExecutor::default());
        let (orch, _) = orchestrator(isolated(), executor);

        let report = orch.run(&todo_graph()).await.unwrap();

        // Each behavior appears exactly once in the standalone results.
        assert_eq!(report.results.len(), 3);
        let create = report.result("create-item").unwrap();
        assert_eq!(create.status, BehaviorStatus::Pass);
        assert_eq!(create.chain_results.len(), 1);
    }

    #[tokio::test]
    async fn isolated_chain_skips_dependents_of_failures() {
        let executor = Arc::new(MockExecutor::failing(&["do create-item"]));
        let (orch, _) = orchestrator(isolated(), Arc::clone(&executor));

        let report = orch.run(&todo_graph()).await.unwrap();

        assert_eq!(report.result("create-item").unwrap().status, BehaviorStatus::Fail);
        let delete = report.result("delete-item").unwrap();
        assert_eq!(delete.status, BehaviorStatus::DependencyFailed);
        assert_eq!(delete.failed_dependency.as_deref(), Some("Create Item"));
        assert_eq!(
            executor.executed().iter().filter(|i| *i == "do delete-item").count(),
            0
        );
    }
}
