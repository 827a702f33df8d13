//! Session control for the single live page of a run.
//!
//! `SessionController` turns a `SessionMode` into driver calls:
//!
//! - `HardReset`:    leave the app, return to its root, wipe client state, reload
//! - `SoftNavigate`: in-app move to the behavior's page, skipped when already there
//! - `Preserve`:     nothing; the behavior starts where the previous one ended
//!
//! After a soft navigation lands on a login page while credentials are held,
//! the controller logs back in and retries the navigation. Recovery problems
//! are logged and never fail the behavior on their own.

use std::sync::Arc;

use tracing::{debug, info, warn};

use vigil_contracts::{
    behavior::Step,
    config::SessionSettings,
    error::{VigilError, VigilResult},
    session::{location_path, CredentialState, SessionMode},
};

use crate::{
    instruction,
    traits::{ActionExecutor, SessionDriver},
};

pub struct SessionController {
    driver: Arc<dyn SessionDriver>,
    executor: Arc<dyn ActionExecutor>,
    base_url: String,
    settings: SessionSettings,
}

impl SessionController {
    pub fn new(
        driver: Arc<dyn SessionDriver>,
        executor: Arc<dyn ActionExecutor>,
        base_url: impl Into<String>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            driver,
            executor,
            base_url: base_url.into(),
            settings,
        }
    }

    /// Bring the session into the state `mode` asks for.
    ///
    /// A hard reset is followed by a soft navigation to `page_path` when one
    /// is given, since the reset always lands on the application root.
    ///
    /// # Errors
    ///
    /// `SessionError` when the driver fails a hard reset or a navigation.
    pub async fn prepare(
        &self,
        mode: SessionMode,
        page_path: Option<&str>,
        credentials: &CredentialState,
    ) -> VigilResult<()> {
        match mode {
            SessionMode::HardReset => {
                self.hard_reset().await?;
                if let Some(path) = page_path {
                    self.soft_navigate(path, credentials).await?;
                }
                Ok(())
            }
            SessionMode::SoftNavigate => match page_path {
                Some(path) => self.soft_navigate(path, credentials).await,
                None => Ok(()),
            },
            SessionMode::Preserve => Ok(()),
        }
    }

    pub async fn hard_reset(&self) -> VigilResult<()> {
        debug!(base_url = %self.base_url, "hard-resetting session");
        self.driver.goto(&self.settings.blank_url).await.map_err(session_error)?;
        self.driver.goto(&self.base_url).await.map_err(session_error)?;
        self.driver.clear_client_state().await.map_err(session_error)?;
        self.driver.reload().await.map_err(session_error)?;
        Ok(())
    }

    /// Navigate in-app to `path` unless the session is already there.
    pub async fn soft_navigate(&self, path: &str, credentials: &CredentialState) -> VigilResult<()> {
        let current = self.driver.snapshot().await.map_err(session_error)?;
        if path_matches(current.path(), path) {
            debug!(current = %current.path(), target = %path, "already at target, skipping navigation");
            return Ok(());
        }

        self.driver.soft_navigate(path).await.map_err(session_error)?;

        let landed = self.driver.snapshot().await.map_err(session_error)?;
        if instruction::looks_like_login(&landed, &self.settings.login_markers) && !path_is_login(path, &self.settings.login_markers) {
            if credentials.is_complete() {
                self.recover_auth(path, credentials).await;
            } else {
                warn!(target = %path, "landed on login page with no credentials to recover with");
            }
        }
        Ok(())
    }

    /// Log back in with the held credentials, then retry the navigation.
    ///
    /// Never fails: the first check of the behavior will surface a broken
    /// session on its own.
    async fn recover_auth(&self, path: &str, credentials: &CredentialState) {
        info!(target = %path, "session lost authentication, replaying login");

        for step in login_steps(credentials) {
            let page = match self.driver.snapshot().await {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, "auth recovery could not observe page");
                    return;
                }
            };
            match self.executor.execute(&step, &page).await {
                Ok(outcome) if outcome.success => {}
                Ok(outcome) => {
                    warn!(
                        step = %step.instruction(),
                        error = outcome.error.as_deref().unwrap_or("unknown"),
                        "auth recovery step failed"
                    );
                    return;
                }
                Err(e) => {
                    warn!(step = %step.instruction(), error = %e, "auth recovery step failed");
                    return;
                }
            }
        }

        if let Err(e) = self.driver.soft_navigate(path).await {
            warn!(target = %path, error = %e, "navigation after auth recovery failed");
        }
    }
}

/// The synthetic login sequence replayed during auth recovery.
pub fn login_steps(credentials: &CredentialState) -> Vec<Step> {
    let email = credentials.email.as_deref().unwrap_or_default();
    let password = credentials.password.as_deref().unwrap_or_default();
    vec![
        Step::Act {
            instruction: format!("Set the email field to \"{email}\""),
        },
        Step::Act {
            instruction: format!("Set the password field to \"{password}\""),
        },
        Step::Act {
            instruction: "Click the submit button".to_string(),
        },
    ]
}

fn session_error(e: VigilError) -> VigilError {
    match e {
        VigilError::SessionError { .. } => e,
        other => VigilError::SessionError {
            reason: other.to_string(),
        },
    }
}

fn path_is_login(path: &str, markers: &[String]) -> bool {
    let path = path.to_lowercase();
    markers.iter().any(|m| path.contains(&m.to_lowercase()))
}

/// True when `current` is `target` or lies below it.
///
/// Trailing slashes are ignored, and target segments written as `:id`,
/// `[id]`, `{id}`, or `*` match any single segment. The root only matches
/// itself.
pub fn path_matches(current: &str, target: &str) -> bool {
    let current = location_path(current);
    let target = location_path(target);

    let segments = |p: &str| -> Vec<String> {
        p.split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };
    let current = segments(current);
    let target = segments(target);

    if target.is_empty() {
        return current.is_empty();
    }
    if current.len() < target.len() {
        return false;
    }
    target
        .iter()
        .zip(&current)
        .all(|(want, have)| is_param_segment(want) || want == have)
}

fn is_param_segment(segment: &str) -> bool {
    segment == "*"
        || segment.starts_with(':')
        || (segment.starts_with('[') && segment.ends_with(']'))
        || (segment.starts_with('{') && segment.ends_with('}'))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
