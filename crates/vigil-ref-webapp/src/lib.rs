//! # vigil-ref-webapp
//!
//! Todo web app reference runtime for the VIGIL behavior verifier.
//!
//! Demonstrates four verification runs against a simulated application:
//!
//! 1. **Continuous**: every behavior in one session, identity behaviors first.
//! 2. **Isolated chain**: every behavior re-verified from a fresh session with
//!    its whole dependency chain replayed.
//! 3. **Failure cascade**: item creation is broken, and every behavior that
//!    needs an item is reported as `dependency_failed` without running.
//! 4. **Auth recovery**: the session expires mid-run and the session
//!    controller logs back in with the captured credentials.
//!
//! All state is in memory. No browser or model is contacted.

pub mod judges;
pub mod mock_app;
pub mod scenarios;
