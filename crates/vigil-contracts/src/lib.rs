//! # vigil-contracts
//!
//! Shared types, results, and error contracts for the VIGIL behavior verifier.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: only data definitions and error types.

pub mod action;
pub mod behavior;
pub mod config;
pub mod error;
pub mod result;
pub mod session;
