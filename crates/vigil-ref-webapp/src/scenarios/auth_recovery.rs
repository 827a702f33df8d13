//! Scenario 4: Auth recovery
//!
//! The app drops the session the first time the new item form is opened.
//! The soft navigation lands on the log-in page instead; the session
//! controller notices, replays a log-in with the credentials captured at
//! sign-up, and retries the navigation. The run continues as if nothing
//! happened.

use std::sync::Arc;

use vigil_contracts::{config::RunConfig, error::VigilResult, result::RunReport};

use crate::mock_app::MockWebApp;

use super::{print_report, verify_app};

/// The page whose first visit expires the session.
pub const EXPIRING_PAGE: &str = "/items/new";

pub async fn run(config: RunConfig) -> VigilResult<RunReport> {
    let app = Arc::new(MockWebApp::new().with_session_expiry_at(EXPIRING_PAGE));
    verify_app(&app, config).await
}

/// Run Scenario 4 and print the per-behavior results.
pub async fn run_scenario(config: &RunConfig) -> VigilResult<RunReport> {
    println!("=== Scenario 4: Auth Recovery ===");
    println!();
    println!("  The session expires at {EXPIRING_PAGE}; the controller logs back in.");
    println!();

    let report = run(config.clone()).await?;
    print_report(&report);
    println!("  Scenario 4 complete.");
    println!();
    Ok(report)
}
