//! Scenario 1: Continuous session
//!
//! Every behavior runs once, in one browser session that is hard-reset only
//! at the start. Identity behaviors run first in sign-up, sign-out, sign-in
//! order, then the rest in dependency order. Later behaviors log in as the
//! account sign-up actually created, not the one written in the catalog.

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
        strategy: ExecutionStrategy::Continuous,
        ..config
    }
}

/// Run Scenario 1 and print the per-behavior results.
pub async fn run_scenario(config: &RunConfig) -> VigilResult<RunReport> {
    println!("=== Scenario 1: Continuous Session ===");
    println!();
    println!("  One session, identity behaviors first, then dependency order.");
    println!();

    let report = run(config.clone()).await?;
    print_report(&report);
    println!("  Scenario 1 complete.");
    println!();
    Ok(report)
}
