//! Todo app reference runtime scenarios.
//!
//! Each scenario wires real VIGIL components (orchestrator, session
//! controller, dual-oracle verifier) to the simulated app and the simulated
//! judges, then verifies the `catalog::todo_app` behavior graph.

pub mod auth_recovery;
pub mod catalog;
pub mod continuous;
pub mod failure_cascade;
pub mod isolated_chain;

use std::sync::Arc;

use vigil_contracts::{
    config::RunConfig,
    error::VigilResult,
    result::{BehaviorStatus, RunReport},
};
use vigil_core::{
    traits::{ActionExecutor, Judge, SessionDriver},
    Orchestrator,
};
use vigil_verify::engine::DualOracleVerifier;

use crate::{
    judges::{DiffJudge, ExtractJudge},
    mock_app::MockWebApp,
};

/// Build an orchestrator that drives `app` with the simulated judges.
pub fn orchestrator(app: &Arc<MockWebApp>, config: RunConfig) -> Orchestrator {
    let verifier = DualOracleVerifier::new(
        Arc::new(DiffJudge) as Arc<dyn Judge>,
        Arc::new(ExtractJudge) as Arc<dyn Judge>,
        config.oracle.clone(),
    );
    Orchestrator::new(
        config,
        Arc::clone(app) as Arc<dyn SessionDriver>,
        Arc::clone(app) as Arc<dyn ActionExecutor>,
        Box::new(verifier),
    )
}

/// Verify the todo app behavior graph against `app`.
pub async fn verify_app(app: &Arc<MockWebApp>, config: RunConfig) -> VigilResult<RunReport> {
    orchestrator(app, config).run(&catalog::todo_app()).await
}

/// Print one line per behavior, then the summary.
pub fn print_report(report: &RunReport) {
    println!("  Run id:   {}", report.run_id);
    println!("  Strategy: {:?}", report.strategy);
    println!();
    for result in &report.results {
        let marker = match result.status {
            BehaviorStatus::Pass => "PASS",
            BehaviorStatus::Fail => "FAIL",
            BehaviorStatus::DependencyFailed => "SKIP",
        };
        println!(
            "  [{marker}] {:<28} {:>6}ms",
            result.title,
            result.duration.as_millis()
        );
        if let Some(dependency) = &result.failed_dependency {
            println!("         needs: {dependency}");
        }
        if let Some(error) = &result.error {
            println!("         error: {error}");
        }
        if !result.chain_results.is_empty() {
            let chain: Vec<&str> = result.chain_results.iter().map(|r| r.behavior_id.as_str()).collect();
            println!("         chain: {}", chain.join(" -> "));
        }
    }
    println!();
    for line in report.summary.render().lines() {
        println!("  {line}");
    }
    println!();
}
