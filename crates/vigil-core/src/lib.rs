//! # vigil-core
//!
//! The execution runtime for VIGIL behavior verification.
//!
//! This crate provides:
//! - The four external seams (`SessionDriver`, `ActionExecutor`, `Judge`,
//!   `CheckVerifier`)
//! - Dependency-graph scheduling: topological order, chain resolution, and
//!   failure cascades
//! - Credential uniquification and injection
//! - Session preparation with auth-loss recovery
//! - The `Orchestrator` that runs a whole behavior graph under either
//!   execution strategy
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vigil_core::{Orchestrator, traits::{SessionDriver, ActionExecutor, CheckVerifier}};
//!
//! let orchestrator = Orchestrator::new(config, driver, executor, verifier);
//! let report = orchestrator.run(&behaviors).await?;
//! println!("{}", report.summary.render());
//! ```

pub mod context;
pub mod credentials;
pub mod graph;
pub mod instruction;
pub mod orchestrator;
pub mod session;
pub mod traits;

pub use orchestrator::Orchestrator;
