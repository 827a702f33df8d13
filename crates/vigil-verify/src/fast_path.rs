//! Deterministic evaluation of quoted-text checks.
//!
//! A condition such as `The page shows "Milk"` or `"Milk" is no longer
//! listed` can be decided by a plain substring test on the visible text.
//! Anything said outside the quotes beyond "shows", "is listed", "appears"
//! and their negations (`Clicking "Delete" removes "Milk"`) is left to the
//! judges, since visible labels say nothing about what an action did. Only
//! a passing fast-path result is final: quoted text may still be reachable
//! through a rendering path the judges can see, so a miss falls through to
//! the full protocol.

use std::sync::LazyLock;

use regex::Regex;

use vigil_contracts::session::PageSnapshot;

/// Double quotes, typographic quotes, backticks, and single quotes that open
/// after whitespace (so apostrophes in "doesn't" are not treated as quotes).
static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?P<dq>[^"]+)"|“(?P<tq>[^”]+)”|`(?P<bq>[^`]+)`|(?:^|\s)'(?P<sq>[^']+)'"#)
        .expect("valid quoted-text regex")
});

/// Stand-in for each quoted fragment when matching the sentence shape.
const OPERAND: &str = " q ";

/// The sentence shapes that reduce to plain containment or absence of the
/// quoted operands, matched against the normalized unquoted remainder.
static TEXT_CHECK_RE: LazyLock<Regex> = LazyLock::new(|| {
    let operands = r"(?:both )?q(?: (?:and )?q)*";
    let noun = r"(?:the (?:text|message|label|item|button|link|heading|error) )?";
    let place = r"(?: (?:on|in|from) the (?:page|list|screen|table))?";
    let subject = r"the (?:page|list|screen|table|view|dashboard|header|item list|todo list)";
    let verb = r"(?:(?:now |still )?(?:shows|displays|contains|lists|includes)|(?:does not|doesn't|no longer) (?:show|display|contain|list|include)s?)";
    let state = r"(?:is|are) (?:still |now )?(?:not |no longer )?(?:shown|displayed|visible|listed|present|removed|gone|hidden|absent)";
    let appear = r"(?:(?:no longer )?(?:appears?|disappears?)|(?:does not|doesn't|do not|don't) appear)";
    Regex::new(&format!(
        "^(?:{subject} {verb} {noun}{operands}|{noun}{operands} (?:{state}|{appear})){place}$"
    ))
    .expect("valid text-check shape regex")
});

/// Lowercase, drop sentence punctuation, and collapse whitespace.
fn normalize(remainder: &str) -> String {
    remainder
        .to_lowercase()
        .replace('\u{2019}', "'")
        .replace(['.', ',', '!', ';', ':'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Phrases that turn a containment check into an absence check.
const ABSENCE_MARKERS: &[&str] = &[
    "not ",
    "no longer",
    "n't ",
    "absent",
    "disappear",
    "removed",
    "gone",
    "hidden",
    "without",
];

/// An exact quoted-text containment or absence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedTextCheck {
    /// Every quoted fragment in the condition.
    pub texts: Vec<String>,
    /// `true` for "is shown", `false` for "is not shown".
    pub expect_present: bool,
}

impl QuotedTextCheck {
    /// Evaluate against the page's visible text, ignoring case.
    pub fn holds(&self, page: &PageSnapshot) -> bool {
        let haystack = page.visible_text.to_lowercase();
        self.texts
            .iter()
            .all(|text| haystack.contains(&text.to_lowercase()) == self.expect_present)
    }
}

/// How a Check condition is decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckKind {
    /// Try the quoted-text fast path before consulting the judges.
    Deterministic(QuotedTextCheck),
    /// Only the judges can decide.
    Semantic,
}

pub fn classify_check(condition: &str) -> CheckKind {
    match parse_quoted_check(condition) {
        Some(check) => CheckKind::Deterministic(check),
        None => CheckKind::Semantic,
    }
}

/// Extract the quoted fragments and polarity of `condition`.
///
/// Returns `None` unless the condition has quoted text and says nothing
/// about it beyond presence or absence.
pub fn parse_quoted_check(condition: &str) -> Option<QuotedTextCheck> {
    let texts: Vec<String> = QUOTED_RE
        .captures_iter(condition)
        .filter_map(|caps| {
            ["dq", "tq", "bq", "sq"]
                .iter()
                .find_map(|name| caps.name(name))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|text| !text.is_empty())
        .collect();

    if texts.is_empty() {
        return None;
    }

    let shape = normalize(&QUOTED_RE.replace_all(condition, OPERAND));
    if !TEXT_CHECK_RE.is_match(&shape) {
        return None;
    }

    let unquoted = QUOTED_RE.replace_all(condition, " ").to_lowercase();
    let expect_present = !ABSENCE_MARKERS.iter().any(|m| unquoted.contains(m));

    Some(QuotedTextCheck {
        texts,
        expect_present,
    })
}
