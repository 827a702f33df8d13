//! Scenario 2: Isolated chains
//!
//! Identity behaviors run first in a shared session. Every other behavior is
//! then verified from a hard-reset session, after replaying its whole
//! dependency chain. Each replayed sign-up registers a fresh account, so the
//! app ends the run with one account per chain.

use std::sync::Arc;

use vigil_contracts::{
    config::{ExecutionStrategy, RunConfig},
    error::VigilResult,
    result::RunReport,
};

use crate::mock_app::MockWebApp;

use super::{print_report, verify_app};

pub async fn run(config: RunConfig) -> VigilResult<RunReport> {
    let app = Arc::new(MockWebApp::new());
    verify_app(&app, with_strategy(config)).await
}

fn with_strategy(config: RunConfig) -> RunConfig {
    RunConfig {
        strategy: ExecutionStrategy::IsolatedChain,
        ..config
    }
}

/// Run Scenario 2 and print the per-behavior results.
pub async fn run_scenario(config: &RunConfig) -> VigilResult<RunReport> {
    println!("=== Scenario 2: Isolated Chains ===");
    println!();
    println!("  Each behavior re-verified from a fresh session with its chain replayed.");
    println!();

    let report = run(config.clone()).await?;
    print_report(&report);
    println!("  Scenario 2 complete.");
    println!();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::catalog;

    #[tokio::test(start_paused = true)]
    async fn every_behavior_passes_from_fresh_state() {
        let app = Arc::new(MockWebApp::new());

        let report = verify_app(&app, with_strategy(RunConfig::default())).await.unwrap();

        assert_eq!(report.summary.passed, 7, "{}", report.summary.render());
        assert_eq!(report.results.len(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn every_chain_registers_a_distinct_account() {
        let app = Arc::new(MockWebApp::new());

        verify_app(&app, with_strategy(RunConfig::default())).await.unwrap();

        assert_eq!(
            app.accounts(),
            vec![
                "ada_1@example.com",
                "ada_2@example.com",
                "ada_3@example.com",
                "ada_4@example.com",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn chain_results_are_reported_per_target() {
        let report = run(RunConfig::default()).await.unwrap();

        let chain = |id: &str| -> Vec<String> {
            report
                .result(id)
                .unwrap()
                .chain_results
                .iter()
                .map(|r| r.behavior_id.clone())
                .collect()
        };

        assert_eq!(chain(catalog::CREATE_ITEM), vec![catalog::SIGN_UP]);
        assert_eq!(chain(catalog::DELETE_ITEM), vec![catalog::SIGN_UP, catalog::CREATE_ITEM]);
        assert!(chain(catalog::SIGN_OUT).is_empty());
    }
}
