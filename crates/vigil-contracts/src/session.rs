//! Observed state of the external interactive system.

use serde::{Deserialize, Serialize};

/// A read-only observation of the page the session is currently on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Full location, e.g. "http://localhost:3000/items/4?tab=a".
    pub location: String,
    pub title: String,
    /// All text currently rendered and visible to a user.
    pub visible_text: String,
    /// Short labels of visible interactive elements (buttons, links, inputs).
    pub elements: Vec<String>,
}

impl PageSnapshot {
    /// The path component of `location`, without origin, query, or fragment.
    pub fn path(&self) -> &str {
        location_path(&self.location)
    }
}

/// Strip scheme, host, query, and fragment from a location string.
pub fn location_path(location: &str) -> &str {
    let without_origin = match location.find("://") {
        Some(scheme_end) => {
            let rest = &location[scheme_end + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "/",
            }
        }
        None => location,
    };
    let end = without_origin
        .find(|c| c == '?' || c == '#')
        .unwrap_or(without_origin.len());
    &without_origin[..end]
}

/// How the session is prepared before a behavior runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Leave the application, return to its root, and wipe client state.
    HardReset,
    /// Move to the behavior's page without a reload.
    SoftNavigate,
    /// Continue from wherever the previous behavior left off.
    Preserve,
}

/// Identity values captured from account-creation behaviors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialState {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl CredentialState {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }

    /// True when both halves of a login are known.
    pub fn is_complete(&self) -> bool {
        self.email.is_some() && self.password.is_some()
    }
}
