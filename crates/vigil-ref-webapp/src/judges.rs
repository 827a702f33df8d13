//! Simulated judges for the reference runtime.
//!
//! Real deployments back these with language models. The simulations here
//! are keyword matchers with the same blind spots the real judges have: the
//! diff judge needs a "before" page and only sees what changed, while the
//! extract judge only sees the page as it is now.

use std::collections::HashSet;

use async_trait::async_trait;

use vigil_contracts::{
    action::{JudgeContext, JudgeVerdict},
    error::{VigilError, VigilResult},
    session::PageSnapshot,
};
use vigil_core::traits::Judge;

/// Words that carry no meaning for matching a condition against a page.
const FILLER: &[&str] = &[
    "the", "and", "are", "user", "users", "page", "shows", "show", "shown", "should", "that", "this",
    "their", "with", "appears", "appear", "displayed", "visible", "listed", "list", "there", "from",
    "into", "have", "been", "being", "now", "longer", "removed", "gone", "not", "any",
];

const ABSENCE: &[&str] = &["no longer", "removed", "not ", "gone"];

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// The meaningful words of a condition.
fn keywords(condition: &str) -> Vec<String> {
    tokens(condition)
        .filter(|w| w.len() >= 3 && !FILLER.contains(&w.as_str()))
        .collect()
}

fn expects_absence(condition: &str) -> bool {
    let lowered = condition.to_lowercase();
    ABSENCE.iter().any(|m| lowered.contains(m))
}

fn page_words(page: &PageSnapshot) -> HashSet<String> {
    tokens(&page.title)
        .chain(tokens(&page.visible_text))
        .chain(page.elements.iter().flat_map(|e| tokens(e).collect::<Vec<_>>()))
        .collect()
}

fn verdict(passed: bool, actual: String, reasoning: impl Into<String>) -> JudgeVerdict {
    JudgeVerdict {
        passed,
        actual,
        reasoning: Some(reasoning.into()),
    }
}

/// Judge A: decides from what changed between the before and current page.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffJudge;

#[async_trait]
impl Judge for DiffJudge {
    async fn evaluate(&self, condition: &str, context: &JudgeContext) -> VigilResult<JudgeVerdict> {
        let Some(before) = &context.before else {
            return Err(VigilError::JudgeError {
                judge: "diff judge".to_string(),
                reason: "no before snapshot to compare against".to_string(),
            });
        };

        let wanted = keywords(condition);
        let old = page_words(before);
        let new = page_words(&context.current);

        let (passed, changed) = if expects_absence(condition) {
            let dropped: Vec<&String> = old.difference(&new).collect();
            (wanted.iter().all(|w| !new.contains(w)) && !dropped.is_empty(), dropped.len())
        } else {
            let added: HashSet<&String> = new.difference(&old).collect();
            (!wanted.is_empty() && wanted.iter().all(|w| added.contains(w)), added.len())
        };

        Ok(verdict(
            passed,
            format!("{changed} word(s) changed on {}", context.current.path()),
            format!("looked for {wanted:?} among the changes"),
        ))
    }
}

/// Judge B: decides from the current page alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractJudge;

#[async_trait]
impl Judge for ExtractJudge {
    async fn evaluate(&self, condition: &str, context: &JudgeContext) -> VigilResult<JudgeVerdict> {
        let wanted = keywords(condition);
        let words = page_words(&context.current);

        let passed = if expects_absence(condition) {
            wanted.iter().all(|w| !words.contains(w))
        } else {
            !wanted.is_empty() && wanted.iter().all(|w| words.contains(w))
        };

        Ok(verdict(
            passed,
            format!("{:?} on {}", context.current.title, context.current.path()),
            format!("looked for {wanted:?} on the current page"),
        ))
    }
}
