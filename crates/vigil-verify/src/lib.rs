//! # vigil-verify
//!
//! Check verification for the VIGIL runtime.
//!
//! This crate provides [`engine::DualOracleVerifier`], which implements the
//! [`vigil_core::traits::CheckVerifier`] trait. A Check step is decided in
//! two phases:
//!
//! 1. **Fast path**: conditions that reduce to quoted-text presence or
//!    absence are evaluated directly against the visible page text.
//! 2. **Dual oracle**: two independent judges, one primary and one rescue,
//!    evaluated for a bounded number of rounds with a fixed backoff.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vigil_verify::engine::DualOracleVerifier;
//!
//! let verifier = DualOracleVerifier::new(
//!     Arc::new(diff_judge),
//!     Arc::new(extract_judge),
//!     config.oracle.clone(),
//! );
//! ```

pub mod engine;
pub mod fast_path;
