//! Results reported by the action executor and the check verifier.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::session::PageSnapshot;

/// Diagnostic state captured when a step fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub location: String,
    pub title: String,
    pub elements: Vec<String>,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "location: {}, title: {:?}, elements: [{}]",
            self.location,
            self.title,
            self.elements.join(", ")
        )
    }
}

/// The outcome of one Act step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub success: bool,
    pub duration: Duration,
    pub error: Option<String>,
    /// Present on failure when the executor could observe the page.
    pub diagnostics: Option<Diagnostics>,
}

impl StepOutcome {
    pub fn succeeded(duration: Duration) -> Self {
        Self {
            success: true,
            duration,
            error: None,
            diagnostics: None,
        }
    }

    pub fn failed(error: impl Into<String>, duration: Duration, diagnostics: Option<Diagnostics>) -> Self {
        Self {
            success: false,
            duration,
            error: Some(error.into()),
            diagnostics,
        }
    }
}

/// A judge's answer for one condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub passed: bool,
    /// What the judge actually observed.
    pub actual: String,
    pub reasoning: Option<String>,
}

/// The two independent judges of the dual-oracle protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeKind {
    /// Judge A: compares the page before and after the last action.
    Diff,
    /// Judge B: extracts the answer directly from the current page.
    Extract,
}

impl fmt::Display for JudgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JudgeKind::Diff => f.write_str("diff judge"),
            JudgeKind::Extract => f.write_str("extract judge"),
        }
    }
}

/// What the orchestrator knows about the page history when a check runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckContext {
    /// The page as it was before the most recent Act step.
    pub before: Option<PageSnapshot>,
    /// True when the most recent Act step changed the location.
    pub navigated: bool,
}

/// Everything a judge sees for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgeContext {
    pub before: Option<PageSnapshot>,
    pub current: PageSnapshot,
}

/// How a check reached its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum CheckResolution {
    /// Exact quoted-text match against visible text; no judge was invoked.
    FastPath,
    /// The primary judge passed.
    Primary { judge: JudgeKind },
    /// The primary judge failed and the rescue judge passed.
    Rescued { judge: JudgeKind },
    /// Both judges failed in every round.
    ConfirmedFailure,
    /// The retry loop exceeded its wall-clock budget.
    TimedOut,
}

/// The final verdict for one Check step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub passed: bool,
    pub resolution: CheckResolution,
    /// Number of primary/rescue rounds started.
    pub rounds: u32,
    pub message: String,
}
