//! # vigil-config
//!
//! Run configuration for the VIGIL runtime.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use vigil_config::load_from_file;
//!
//! let config = load_from_file(Path::new("vigil.toml"))?;
//! // Pass `config` to `vigil_core::Orchestrator::new(...)`.
//! ```
//!
//! ## Format
//!
//! ```toml
//! strategy = "isolated-chain"
//! base_url = "http://localhost:3000/"
//!
//! [timeouts]
//! behavior_ms = 120000
//!
//! [oracle]
//! max_rounds = 3
//! backoff_ms = 2000
//!
//! [credentials]
//! injection_step_limit = 5
//!
//! [session]
//! login_markers = ["login", "sign-in"]
//! ```
//!
//! Omitted sections and fields keep their defaults.

pub mod loader;

pub use loader::{load_from_file, load_from_str, validate};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use vigil_contracts::{
        config::{ExecutionStrategy, RunConfig},
        error::VigilError,
    };

    use crate::{load_from_file, load_from_str, validate};

    fn config_error(result: Result<RunConfig, VigilError>) -> String {
        match result {
            Err(VigilError::ConfigError { reason }) => reason,
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let config = load_from_str("").unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn full_document_overrides_defaults() {
        let toml = r#"
            strategy = "isolated-chain"
            base_url = "http://localhost:3000/"

            [timeouts]
            behavior_ms = 90000

            [oracle]
            max_rounds = 4
            backoff_ms = 500

            [credentials]
            injection_step_limit = 8

            [session]
            login_markers = ["login"]
        "#;

        let config = load_from_str(toml).unwrap();

        assert_eq!(config.strategy, ExecutionStrategy::IsolatedChain);
        assert_eq!(config.base_url, "http://localhost:3000/");
        assert_eq!(config.timeouts.behavior_ms, 90_000);
        assert_eq!(config.oracle.max_rounds, 4);
        assert_eq!(config.oracle.backoff_ms, 500);
        // Unset fields inside a section keep their defaults.
        assert_eq!(config.oracle.check_timeout_ms, 60_000);
        assert_eq!(config.credentials.injection_step_limit, 8);
        assert_eq!(config.session.login_markers, vec!["login"]);
        assert_eq!(config.session.blank_url, "about:blank");
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let reason = config_error(load_from_str(r#"strategy = "parallel""#));
        assert!(reason.contains("failed to parse run config TOML"), "{reason}");
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let reason = config_error(load_from_str("this is not valid toml ][[["));
        assert!(reason.contains("failed to parse run config TOML"), "{reason}");
    }

    #[test]
    fn zero_rounds_fail_validation() {
        let reason = config_error(load_from_str("[oracle]\nmax_rounds = 0"));
        assert!(reason.contains("max_rounds"), "{reason}");
    }

    #[test]
    fn zero_behavior_budget_fails_validation() {
        let mut config = RunConfig::default();
        config.timeouts.behavior_ms = 0;
        let reason = config_error(validate(&config).map(|_| config.clone()));
        assert!(reason.contains("behavior_ms"), "{reason}");
    }

    #[test]
    fn blank_login_markers_fail_validation() {
        let reason = config_error(load_from_str("[session]\nlogin_markers = [\" \"]"));
        assert!(reason.contains("login_markers"), "{reason}");
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let path = std::env::temp_dir().join("vigil-config-does-not-exist.toml");
        let reason = config_error(load_from_file(&path));
        assert!(reason.contains("failed to read run config"), "{reason}");
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!("vigil-config-{}.toml", std::process::id()));
        std::fs::write(&path, "strategy = \"continuous\"\nbase_url = \"http://app.test/\"").unwrap();

        let config = load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.strategy, ExecutionStrategy::Continuous);
        assert_eq!(config.base_url, "http://app.test/");
    }
}
