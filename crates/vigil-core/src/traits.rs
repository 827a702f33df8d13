//! Core trait definitions for the VIGIL verification pipeline.
//!
//! These four traits are the boundary between the orchestration engine and
//! the collaborators it drives:
//!
//! - `SessionDriver`:  the external interactive system and its one live page
//! - `ActionExecutor`: carries out a single Act step against that page
//! - `Judge`:          an independent, individually unreliable oracle
//! - `CheckVerifier`:  turns one Check step into a single pass/fail verdict
//!
//! The orchestrator owns the driver exclusively for the duration of a run.
//! None of these are ever called concurrently.

use async_trait::async_trait;

use vigil_contracts::{
    action::{CheckContext, CheckOutcome, JudgeContext, JudgeVerdict, StepOutcome},
    behavior::Step,
    error::VigilResult,
    session::PageSnapshot,
};

/// Low-level control over the external interactive system.
///
/// The session controller composes these primitives into hard-reset,
/// soft-navigate, and preserve modes.
#[async_trait]
pub trait SessionDriver: Send + Sync {
    /// Observe the current page. Must not change any state.
    async fn snapshot(&self) -> VigilResult<PageSnapshot>;

    /// Full navigation to `url`, discarding the in-memory page.
    async fn goto(&self, url: &str) -> VigilResult<()>;

    /// In-app navigation to `path` that keeps in-memory session state.
    async fn soft_navigate(&self, path: &str) -> VigilResult<()>;

    /// Clear client-side storage and every cookie that is not protected.
    async fn clear_client_state(&self) -> VigilResult<()>;

    async fn reload(&self) -> VigilResult<()>;
}

/// Executes one step against the current page.
///
/// Implementations are opaque to the engine: they may drive a real browser,
/// an LLM-backed agent, or an in-memory simulation.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Carry out `step` given the page as it currently looks.
    ///
    /// An `Ok` outcome with `success = false` is an ordinary step failure.
    /// An `Err` means the executor itself broke; the orchestrator treats both
    /// the same way.
    async fn execute(&self, step: &Step, page: &PageSnapshot) -> VigilResult<StepOutcome>;
}

/// An oracle that decides whether a natural-language condition holds.
#[async_trait]
pub trait Judge: Send + Sync {
    /// An `Err` is treated exactly like `passed: false`.
    async fn evaluate(&self, condition: &str, context: &JudgeContext) -> VigilResult<JudgeVerdict>;
}

/// Produces the final verdict for one Check step.
///
/// Verification never fails with an error: judge errors, retries, and
/// timeouts are all folded into the returned `CheckOutcome`.
#[async_trait]
pub trait CheckVerifier: Send + Sync {
    async fn verify(
        &self,
        condition: &str,
        context: &CheckContext,
        driver: &dyn SessionDriver,
    ) -> CheckOutcome;
}
