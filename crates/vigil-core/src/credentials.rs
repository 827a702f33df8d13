//! Credential lifecycle management.
//!
//! Account-creation behaviors have their email rewritten to a run-unique
//! value, and the identity they create is captured. Later behaviors get those
//! values injected into their login steps, so they act as the account that
//! actually exists.
//!
//! Captured values are scoped to one session or chain (`reset`), while the
//! uniqueness counter lives for the whole run.

use tracing::debug;

use vigil_contracts::{
    behavior::{Behavior, Scenario, Step},
    config::CredentialSettings,
    session::CredentialState,
};

use crate::instruction::{self, CredentialField};

#[derive(Debug, Clone)]
pub struct CredentialManager {
    state: CredentialState,
    counter: u64,
    settings: CredentialSettings,
}

impl CredentialManager {
    pub fn new(settings: CredentialSettings) -> Self {
        Self {
            state: CredentialState::default(),
            counter: 0,
            settings,
        }
    }

    pub fn state(&self) -> &CredentialState {
        &self.state
    }

    /// Number of unique emails handed out so far in this run.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Forget captured values. The uniqueness counter is kept.
    pub fn reset(&mut self) {
        self.state = CredentialState::default();
    }

    /// Record the email or password set by an Act instruction, if any.
    pub fn capture_from_step(&mut self, instruction: &str) -> Option<CredentialField> {
        let assignment = instruction::parse_field_assignment(instruction)?;
        let field = assignment.credential_field()?;
        match field {
            CredentialField::Email => self.state.email = Some(assignment.value),
            CredentialField::Password => self.state.password = Some(assignment.value),
        }
        debug!(field = ?field, "captured credential");
        Some(field)
    }

    /// Return `local_<n>@domain` for the next value of the run-wide counter.
    pub fn uniquify_email(&mut self, email: &str) -> String {
        self.counter += 1;
        match email.rsplit_once('@') {
            Some((local, domain)) => format!("{local}_{}@{domain}", self.counter),
            None => format!("{email}_{}", self.counter),
        }
    }

    /// Replace the email set by `instruction` with a fresh unique one.
    ///
    /// Instructions that do not set an email are returned unchanged.
    pub fn uniquify_step(&mut self, instruction: &str) -> String {
        match instruction::parse_field_assignment(instruction) {
            Some(a) if a.credential_field() == Some(CredentialField::Email) => {
                let unique = self.uniquify_email(&a.value);
                a.replace_value(instruction, &unique)
            }
            _ => instruction.to_string(),
        }
    }

    /// Replace an email/password value with the captured one.
    ///
    /// Returns the instruction unchanged when it sets some other field or no
    /// credential for that field is held.
    pub fn inject_into_step(&self, instruction: &str) -> String {
        let Some(assignment) = instruction::parse_field_assignment(instruction) else {
            return instruction.to_string();
        };
        let captured = match assignment.credential_field() {
            Some(CredentialField::Email) => self.state.email.as_deref(),
            Some(CredentialField::Password) => self.state.password.as_deref(),
            None => None,
        };
        match captured {
            Some(value) => assignment.replace_value(instruction, value),
            None => instruction.to_string(),
        }
    }

    /// The steps to actually execute for `behavior`'s `scenario`.
    ///
    /// - deliberate wrong-credential behaviors: left exactly as written, even
    ///   when they are also sign-ups
    /// - account creation: every email value is made unique
    /// - everything else: captured credentials are injected into Act steps
    ///   among the first `injection_step_limit` steps
    pub fn prepare_steps(&mut self, behavior: &Behavior, scenario: &Scenario) -> Vec<Step> {
        if instruction::is_invalid_credentials(behavior) {
            return scenario.steps.clone();
        }

        if instruction::is_account_creation(behavior) {
            return scenario
                .steps
                .iter()
                .map(|step| match step {
                    Step::Act { instruction } => Step::Act {
                        instruction: self.uniquify_step(instruction),
                    },
                    check => check.clone(),
                })
                .collect();
        }

        if self.state.is_empty() {
            return scenario.steps.clone();
        }

        let limit = self.settings.injection_step_limit;
        scenario
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| match step {
                Step::Act { instruction } if index < limit => Step::Act {
                    instruction: self.inject_into_step(instruction),
                },
                other => other.clone(),
            })
            .collect()
    }

    /// Capture the identity created by a passing account-creation behavior.
    pub fn capture_from_steps(&mut self, steps: &[Step]) {
        for step in steps {
            if let Step::Act { instruction } = step {
                self.capture_from_step(instruction);
            }
        }
    }
}

impl Default for CredentialManager {
    fn default() -> Self {
        Self::new(CredentialSettings::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
