//! TOML loading and validation of `RunConfig`.
//!
//! Every field of `RunConfig` has a default, so an empty document is a valid
//! configuration. Loading always validates: a config that parses but could
//! never run (zero rounds, zero budgets, no login markers) is rejected up
//! front rather than failing halfway through a run.

use std::path::Path;

use tracing::debug;

use vigil_contracts::{
    config::RunConfig,
    error::{VigilError, VigilResult},
};

/// Parse `s` as TOML into a validated `RunConfig`.
///
/// Returns `VigilError::ConfigError` if the TOML is malformed, does not match
/// the `RunConfig` schema, or fails `validate`.
pub fn load_from_str(s: &str) -> VigilResult<RunConfig> {
    let config: RunConfig = toml::from_str(s).map_err(|e| VigilError::ConfigError {
        reason: format!("failed to parse run config TOML: {e}"),
    })?;
    validate(&config)?;
    debug!(strategy = ?config.strategy, base_url = %config.base_url, "run config loaded");
    Ok(config)
}

/// Read the file at `path` and load it with `load_from_str`.
pub fn load_from_file(path: &Path) -> VigilResult<RunConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| VigilError::ConfigError {
        reason: format!("failed to read run config '{}': {e}", path.display()),
    })?;
    load_from_str(&contents)
}

/// Reject configurations the orchestrator cannot run with.
pub fn validate(config: &RunConfig) -> VigilResult<()> {
    let invalid = |reason: &str| {
        Err(VigilError::ConfigError {
            reason: reason.to_string(),
        })
    };

    if config.base_url.trim().is_empty() {
        return invalid("base_url must not be empty");
    }
    if config.timeouts.behavior_ms == 0 {
        return invalid("timeouts.behavior_ms must be greater than zero");
    }
    if config.oracle.max_rounds == 0 {
        return invalid("oracle.max_rounds must be at least 1");
    }
    if config.oracle.check_timeout_ms == 0 {
        return invalid("oracle.check_timeout_ms must be greater than zero");
    }
    if config.session.blank_url.trim().is_empty() {
        return invalid("session.blank_url must not be empty");
    }
    if config.session.login_markers.iter().all(|m| m.trim().is_empty()) {
        return invalid("session.login_markers must contain at least one marker");
    }
    Ok(())
}
