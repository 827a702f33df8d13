//! Natural-language instruction classification.
//!
//! Every regex and keyword heuristic the engine relies on lives here, behind
//! small typed functions. Scheduling and graph code only ever see the typed
//! results (`FieldAssignment`, `AuthKind`, ...), never the raw text rules.

use std::{ops::Range, sync::LazyLock};

use regex::{Captures, Regex};

use vigil_contracts::{behavior::Behavior, session::PageSnapshot};

const VALUE: &str = r#"(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|`(?P<bq>[^`]*)`|(?P<bare>[^\s"'`]+))"#;

/// "Set the email field to "x"", "change password to 'y'".
static SET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:set|change|update)\s+(?:the\s+)?(?:value\s+of\s+(?:the\s+)?)?(?P<field>[a-z0-9][a-z0-9 _-]*?)\s+(?:field\s+|input\s+|box\s+)?to\s+{VALUE}"
    ))
    .expect("valid set-field regex")
});

/// "Fill the email field with "x"".
static FILL_WITH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:fill(?:\s+in)?|populate)\s+(?:the\s+)?(?P<field>[a-z0-9][a-z0-9 _-]*?)\s+(?:field\s+|input\s+|box\s+)?with\s+{VALUE}"
    ))
    .expect("valid fill-with regex")
});

/// "Type "x" into the email field", "enter 'y' in password".
static TYPE_INTO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:type|enter|input|fill\s+in)\s+{VALUE}\s+(?:in|into)\s+(?:the\s+)?(?P<field>[a-z0-9][a-z0-9 _-]*)"
    ))
    .expect("valid type-into regex")
});

/// An instruction of the shape "set field X to value V".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAssignment {
    /// Lowercased field name without "field"/"input" noise words.
    pub field: String,
    pub value: String,
    /// The quote character around the value, if any.
    pub quote: Option<char>,
    /// Byte range of the value inside the instruction, quotes excluded.
    pub value_range: Range<usize>,
}

impl FieldAssignment {
    /// Rewrite `instruction` with `new_value` in place of the current value.
    ///
    /// Surrounding text and quoting are left untouched.
    pub fn replace_value(&self, instruction: &str, new_value: &str) -> String {
        let mut out = String::with_capacity(instruction.len() + new_value.len());
        out.push_str(&instruction[..self.value_range.start]);
        out.push_str(new_value);
        out.push_str(&instruction[self.value_range.end..]);
        out
    }

    pub fn credential_field(&self) -> Option<CredentialField> {
        credential_field(&self.field)
    }
}

/// Parse a field assignment out of an Act instruction.
pub fn parse_field_assignment(instruction: &str) -> Option<FieldAssignment> {
    [&*FILL_WITH_RE, &*SET_RE, &*TYPE_INTO_RE]
        .into_iter()
        .find_map(|re| re.captures(instruction).and_then(|caps| assignment_from(&caps)))
}

fn assignment_from(caps: &Captures<'_>) -> Option<FieldAssignment> {
    let field = normalize_field(caps.name("field")?.as_str());
    if field.is_empty() {
        return None;
    }

    let (value, quote) = if let Some(m) = caps.name("dq") {
        (m, Some('"'))
    } else if let Some(m) = caps.name("sq") {
        (m, Some('\''))
    } else if let Some(m) = caps.name("bq") {
        (m, Some('`'))
    } else {
        (caps.name("bare")?, None)
    };

    let mut range = value.range();
    let mut text = value.as_str();
    if quote.is_none() {
        // Bare values stop before trailing sentence punctuation.
        let trimmed = text.trim_end_matches(['.', ',', ';', ':', '!', '?']);
        range.end -= text.len() - trimmed.len();
        text = trimmed;
        if text.is_empty() {
            return None;
        }
    }

    Some(FieldAssignment {
        field,
        value: text.to_string(),
        quote,
        value_range: range,
    })
}

fn normalize_field(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut words: Vec<&str> = lowered.split_whitespace().collect();
    if words.first() == Some(&"field") {
        words.remove(0);
    }
    while matches!(words.last(), Some(&"field") | Some(&"input") | Some(&"box")) {
        words.pop();
    }
    words.join(" ")
}

/// Which credential slot a form field feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    Email,
    Password,
}

pub fn credential_field(field: &str) -> Option<CredentialField> {
    let field = field.to_lowercase();
    if field.contains("email") {
        Some(CredentialField::Email)
    } else if field.contains("password") {
        Some(CredentialField::Password)
    } else {
        None
    }
}

/// Identity behaviors that run in a fixed order ahead of everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuthKind {
    SignUp,
    SignOut,
    SignIn,
}

/// The fixed order identity behaviors are run in.
pub const AUTH_ORDER: [AuthKind; 3] = [AuthKind::SignUp, AuthKind::SignOut, AuthKind::SignIn];

impl AuthKind {
    pub fn rank(self) -> usize {
        AUTH_ORDER
            .iter()
            .position(|kind| *kind == self)
            .unwrap_or(AUTH_ORDER.len())
    }
}

/// Id and title folded into one lowercase, space-separated string.
fn behavior_words(behavior: &Behavior) -> String {
    format!("{} {}", behavior.id, behavior.title)
        .to_lowercase()
        .replace(['-', '_'], " ")
}

pub fn classify_auth(behavior: &Behavior) -> Option<AuthKind> {
    let words = behavior_words(behavior);
    let has = |needles: &[&str]| needles.iter().any(|n| words.contains(n));

    if has(&["sign up", "signup", "register", "create account", "create an account"]) {
        Some(AuthKind::SignUp)
    } else if has(&["sign out", "signout", "log out", "logout"]) {
        Some(AuthKind::SignOut)
    } else if has(&["sign in", "signin", "log in", "login"]) {
        Some(AuthKind::SignIn)
    } else {
        None
    }
}

/// Behaviors that create an account and whose credentials later behaviors reuse.
pub fn is_account_creation(behavior: &Behavior) -> bool {
    classify_auth(behavior) == Some(AuthKind::SignUp)
}

/// Behaviors that deliberately use wrong credentials and must not be rewritten.
pub fn is_invalid_credentials(behavior: &Behavior) -> bool {
    let words = behavior_words(behavior);
    words.contains("invalid") || words.contains("wrong")
}

/// Heuristic: does this page look like a login form?
pub fn looks_like_login(page: &PageSnapshot, markers: &[String]) -> bool {
    let fold = |s: &str| s.to_lowercase().replace([' ', '_'], "-");
    let path = fold(page.path());
    let title = fold(&page.title);
    markers.iter().any(|marker| {
        let marker = marker.to_lowercase();
        path.contains(&marker) || title.contains(&marker)
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use vigil_contracts::behavior::Behavior;

    use super::*;

    #[test]
    fn parses_set_field_with_double_quotes() {
        let instruction = r#"Set the email field to "ada@example.com""#;
        let a = parse_field_assignment(instruction).unwrap();

        assert_eq!(a.field, "email");
        assert_eq!(a.value, "ada@example.com");
        assert_eq!(a.quote, Some('"'));
        assert_eq!(&instruction[a.value_range.clone()], "ada@example.com");
    }

    #[test]
    fn parses_set_field_keyword_first() {
        let a = parse_field_assignment("set field password to 'hunter22'").unwrap();
        assert_eq!(a.field, "password");
        assert_eq!(a.value, "hunter22");
        assert_eq!(a.quote, Some('\''));
    }

    #[test]
    fn parses_type_into_and_fill_with() {
        let a = parse_field_assignment(r#"Type "secret" into the password field"#).unwrap();
        assert_eq!(a.field, "password");
        assert_eq!(a.value, "secret");

        let b = parse_field_assignment("Fill the Email Address input with bob@example.com.").unwrap();
        assert_eq!(b.field, "email address");
        assert_eq!(b.value, "bob@example.com");
        assert_eq!(b.quote, None);
    }

    #[test]
    fn non_assignments_are_ignored() {
        assert!(parse_field_assignment("Click the Sign Up button").is_none());
        assert!(parse_field_assignment("Navigate to /items").is_none());
    }

    #[test]
    fn replace_value_preserves_quotes() {
        let instruction = r#"Set the email field to "ada@example.com" and continue"#;
        let a = parse_field_assignment(instruction).unwrap();
        assert_eq!(
            a.replace_value(instruction, "ada_3@example.com"),
            r#"Set the email field to "ada_3@example.com" and continue"#
        );
    }

    #[test]
    fn credential_fields() {
        assert_eq!(credential_field("Email address"), Some(CredentialField::Email));
        assert_eq!(credential_field("confirm password"), Some(CredentialField::Password));
        assert_eq!(credential_field("title"), None);
    }

    #[test]
    fn auth_classification() {
        assert_eq!(classify_auth(&Behavior::new("sign-up", "Sign Up")), Some(AuthKind::SignUp));
        assert_eq!(classify_auth(&Behavior::new("logout", "Log Out")), Some(AuthKind::SignOut));
        assert_eq!(classify_auth(&Behavior::new("sign-in", "Sign In")), Some(AuthKind::SignIn));
        assert_eq!(classify_auth(&Behavior::new("create-item", "Create Item")), None);
        assert!(AuthKind::SignUp.rank() < AuthKind::SignOut.rank());
        assert!(AuthKind::SignOut.rank() < AuthKind::SignIn.rank());
    }

    #[test]
    fn invalid_credential_behaviors_are_flagged() {
        assert!(is_invalid_credentials(&Behavior::new("login-wrong-password", "Login")));
        assert!(is_invalid_credentials(&Behavior::new("x", "Invalid email rejected")));
        assert!(!is_invalid_credentials(&Behavior::new("sign-in", "Sign In")));
    }

    #[test]
    fn login_page_heuristic() {
        let markers: Vec<String> = vec!["login".into(), "sign-in".into()];
        let page = |location: &str, title: &str| PageSnapshot {
            location: location.to_string(),
            title: title.to_string(),
            ..PageSnapshot::default()
        };

        assert!(looks_like_login(&page("http://app.test/login?next=/items", "App"), &markers));
        assert!(looks_like_login(&page("http://app.test/", "Sign in to continue"), &markers));
        assert!(!looks_like_login(&page("http://app.test/items", "Items"), &markers));
    }
}
