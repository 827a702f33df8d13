//! Scenario 3: Failure cascade
//!
//! The app's Save button is broken, so `create-item` fails. `view-items` and
//! `delete-item` both need an item; they are reported as
//! `dependency_failed` naming "Create Item" and are never executed.

use std::sync::Arc;

use vigil_contracts::{config::RunConfig, error::VigilResult, result::RunReport};

use crate::mock_app::MockWebApp;

use super::{print_report, verify_app};

pub async fn run(config: RunConfig) -> VigilResult<RunReport> {
    let app = Arc::new(MockWebApp::new().with_broken_create());
    verify_app(&app, config).await
}

/// Run Scenario 3 and print the per-behavior results.
pub async fn run_scenario(config: &RunConfig) -> VigilResult<RunReport> {
    println!("=== Scenario 3: Failure Cascade ===");
    println!();
    println!("  Item creation is broken; everything that needs an item is skipped.");
    println!();

    let report = run(config.clone()).await?;
    print_report(&report);
    println!("  Scenario 3 complete.");
    println!();
    Ok(report)
}
