//! Run configuration types.
//!
//! Every field has a default so a partial TOML document (or none at all)
//! yields a usable `RunConfig`. Loading and validation live in `vigil-config`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level scheduling strategy for a run. The two are mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStrategy {
    /// Sort once and run every behavior in one continuous session.
    #[default]
    Continuous,
    /// Re-run each target's full dependency chain from a hard-reset session.
    IsolatedChain,
}

/// The full configuration for one verification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub strategy: ExecutionStrategy,
    /// Application root that a hard reset returns to.
    pub base_url: String,
    pub timeouts: TimeoutSettings,
    pub oracle: OracleSettings,
    pub credentials: CredentialSettings,
    pub session: SessionSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::default(),
            base_url: "/".to_string(),
            timeouts: TimeoutSettings::default(),
            oracle: OracleSettings::default(),
            credentials: CredentialSettings::default(),
            session: SessionSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Wall-clock budget for executing one behavior.
    pub behavior_ms: u64,
}

impl TimeoutSettings {
    pub fn behavior(&self) -> Duration {
        Duration::from_millis(self.behavior_ms)
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self { behavior_ms: 180_000 }
    }
}

/// Tuning for the dual-oracle check protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    /// Number of primary/rescue rounds before a failure is confirmed.
    pub max_rounds: u32,
    /// Fixed delay between rounds.
    pub backoff_ms: u64,
    /// Wall-clock budget for the whole retry loop of one check.
    pub check_timeout_ms: u64,
    /// How many visible interactive elements a failure diagnostic lists.
    pub diagnostic_elements: usize,
}

impl OracleSettings {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            backoff_ms: 2_000,
            check_timeout_ms: 60_000,
            diagnostic_elements: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    /// Credentials are only injected into the first N steps of a behavior.
    pub injection_step_limit: usize,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            injection_step_limit: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Tokens that mark a location or title as a login page.
    pub login_markers: Vec<String>,
    /// Location outside the application used by a hard reset.
    pub blank_url: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            login_markers: ["login", "signin", "sign-in", "log-in", "auth"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blank_url: "about:blank".to_string(),
        }
    }
}
