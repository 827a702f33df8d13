//! VIGIL Todo App Reference Runtime: Demo CLI
//!
//! Runs one or all of the four reference scenarios against the simulated
//! todo app. Each scenario uses real VIGIL components (orchestrator, session
//! controller, credential manager, dual-oracle verifier) wired to a
//! simulated browser and simulated judges.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- continuous
//!   cargo run -p demo -- isolated
//!   cargo run -p demo -- cascade
//!   cargo run -p demo -- auth-recovery
//!   cargo run -p demo -- --config vigil.toml --json continuous

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use vigil_contracts::{
    config::RunConfig,
    error::VigilResult,
    result::RunReport,
};
use vigil_ref_webapp::scenarios::{auth_recovery, continuous, failure_cascade, isolated_chain};

// ── CLI definition ────────────────────────────────────────────────────────────

/// VIGIL: behavior verification for interactive applications.
///
/// Each subcommand verifies the todo app behavior graph under a different
/// strategy or fault.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "VIGIL todo app reference runtime demo",
    long_about = "Runs VIGIL reference scenarios showing dependency-ordered verification,\n\
                  isolated chains, failure cascades, and auth recovery."
)]
struct Cli {
    /// TOML run configuration. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print each run report as JSON after the summary.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all four scenarios in sequence.
    RunAll,
    /// Scenario 1: every behavior in one continuous session.
    Continuous,
    /// Scenario 2: every behavior re-verified with its chain from a fresh session.
    Isolated,
    /// Scenario 3: a broken behavior and its skipped dependents.
    Cascade,
    /// Scenario 4: session expiry mid-run and automatic re-login.
    AuthRecovery,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    match run(&cli).await {
        Ok(()) => {
            println!("All selected scenarios completed.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> VigilResult<()> {
    let config = match &cli.config {
        Some(path) => vigil_config::load_from_file(path)?,
        None => RunConfig::default(),
    };
    debug!(strategy = ?config.strategy, "configuration ready");

    let reports = match cli.command {
        Command::RunAll => vec![
            continuous::run_scenario(&config).await?,
            isolated_chain::run_scenario(&config).await?,
            failure_cascade::run_scenario(&config).await?,
            auth_recovery::run_scenario(&config).await?,
        ],
        Command::Continuous => vec![continuous::run_scenario(&config).await?],
        Command::Isolated => vec![isolated_chain::run_scenario(&config).await?],
        Command::Cascade => vec![failure_cascade::run_scenario(&config).await?],
        Command::AuthRecovery => vec![auth_recovery::run_scenario(&config).await?],
    };

    if cli.json {
        print_json(&reports);
    }
    Ok(())
}

fn print_json(reports: &[RunReport]) {
    match serde_json::to_string_pretty(reports) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("could not serialise run reports: {e}"),
    }
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("VIGIL: Behavior Verification Runtime");
    println!("Todo App Reference Demo");
    println!("====================================");
    println!();
    println!("Per behavior:");
    println!("  [1] Skip if any dependency did not pass");
    println!("  [2] Prepare the session: hard reset, soft navigate, or preserve");
    println!("  [3] Inject captured credentials and run each Act step");
    println!("  [4] Decide each Check: quoted-text fast path, then primary/rescue judges");
    println!("  [5] Record pass / fail; a failure skips every transitive dependent");
    println!();
}
