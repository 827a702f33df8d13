//! Simulated todo web application for the VIGIL reference runtime.
//!
//! `MockWebApp` stands in for a real browser pointed at a real app. It
//! implements both `SessionDriver` (page observation and navigation) and
//! `ActionExecutor` (form filling and clicking) over one in-memory state.
//!
//! Routes:
//!
//! | Path         | Page                                   | Protected |
//! |--------------|----------------------------------------|-----------|
//! | `/`          | Home, with sign-up / log-in links      | no        |
//! | `/signup`    | Account creation form                  | no        |
//! | `/login`     | Log-in form                            | no        |
//! | `/items`     | The signed-in user's items             | yes       |
//! | `/items/new` | New item form                          | yes       |
//!
//! Protected pages redirect to `/login` without a session. Accounts and
//! items live "server side" and survive `clear_client_state`; only the
//! session does not. Faults can be switched on to exercise failure paths.

use std::{
    collections::HashMap,
    sync::{LazyLock, Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use vigil_contracts::{
    action::{Diagnostics, StepOutcome},
    behavior::Step,
    error::{VigilError, VigilResult},
    session::{location_path, PageSnapshot},
};
use vigil_core::{
    instruction,
    traits::{ActionExecutor, SessionDriver},
};

/// Origin every location of the simulated app is reported under.
pub const APP_ORIGIN: &str = "http://app.test";

const BLANK: &str = "about:blank";

/// Simulated latency of one action.
const ACTION_LATENCY: Duration = Duration::from_millis(40);

static CLICK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:click|press|tap)\s+(?:on\s+)?(?:the\s+)?(?P<target>.+?)(?:\s+(?:button|link))?\s*\.?\s*$")
        .expect("valid click regex")
});

static NAVIGATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:navigate|go|browse)\s+to\s+(?P<path>/\S*?)\s*\.?\s*$").expect("valid navigate regex")
});

// ── Pages ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Blank,
    Home,
    SignUp,
    Login,
    Items,
    NewItem,
    NotFound,
}

impl Page {
    fn route(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "" => Page::Home,
            "/signup" => Page::SignUp,
            "/login" => Page::Login,
            "/items" => Page::Items,
            "/items/new" => Page::NewItem,
            _ => Page::NotFound,
        }
    }

    fn is_protected(self) -> bool {
        matches!(self, Page::Items | Page::NewItem)
    }

    fn title(self) -> &'static str {
        match self {
            Page::Blank => "",
            Page::Home => "Todo",
            Page::SignUp => "Sign Up",
            Page::Login => "Log In",
            Page::Items => "Items",
            Page::NewItem => "New Item",
            Page::NotFound => "Not Found",
        }
    }

    /// Label of the button a generic "submit" click presses.
    fn submit_button(self) -> Option<&'static str> {
        match self {
            Page::SignUp => Some("Sign Up"),
            Page::Login => Some("Log In"),
            Page::NewItem => Some("Save"),
            _ => None,
        }
    }

    fn inputs(self) -> &'static [&'static str] {
        match self {
            Page::SignUp | Page::Login => &["email", "password"],
            Page::NewItem => &["title"],
            _ => &[],
        }
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Faults {
    /// The Save button on the new item form is disabled.
    broken_create: bool,
    /// The session silently expires on the first visit to this path.
    expire_session_at: Option<String>,
}

#[derive(Debug)]
struct AppState {
    path: String,
    /// Signed-in account email.
    session: Option<String>,
    /// email -> password
    accounts: HashMap<String, String>,
    /// email -> item titles
    items: HashMap<String, Vec<String>>,
    form: HashMap<String, String>,
    flash: Option<String>,
    faults: Faults,
    logins: usize,
    expired_sessions: usize,
}

impl AppState {
    fn page(&self) -> Page {
        if self.path == BLANK {
            Page::Blank
        } else {
            Page::route(&self.path)
        }
    }

    /// Move to `path`, applying the auth redirect for protected pages.
    fn visit(&mut self, path: &str) {
        if self.faults.expire_session_at.as_deref() == Some(path) && self.session.is_some() {
            self.faults.expire_session_at = None;
            self.session = None;
            self.expired_sessions += 1;
            debug!(path, "simulated session expiry");
        }

        self.form.clear();
        self.flash = None;
        if Page::route(path).is_protected() && self.session.is_none() {
            self.path = "/login".to_string();
            self.flash = Some("Please log in to continue.".to_string());
        } else {
            self.path = path.to_string();
        }
    }

    fn elements(&self) -> Vec<String> {
        let signed_in = self.session.is_some();
        let mut elements: Vec<String> = self
            .page()
            .inputs()
            .iter()
            .map(|name| format!("{name} input"))
            .collect();

        match self.page() {
            Page::Home if signed_in => elements.extend(["Items link".into(), "Log Out button".into()]),
            Page::Home => elements.extend(["Sign Up link".into(), "Log In link".into()]),
            Page::SignUp => elements.extend(["Sign Up button".into(), "Log In link".into()]),
            Page::Login => elements.extend(["Log In button".into(), "Sign Up link".into()]),
            Page::Items => {
                elements.push("New Item link".into());
                elements.extend(self.current_items().iter().map(|t| format!("Delete {t} button")));
                elements.push("Log Out button".into());
            }
            Page::NewItem => elements.extend(["Save button".into(), "Items link".into()]),
            Page::Blank | Page::NotFound => {}
        }
        elements
    }

    fn visible_text(&self) -> String {
        let account = self.session.as_deref().unwrap_or_default();
        let mut text = match self.page() {
            Page::Blank => String::new(),
            Page::Home if self.session.is_some() => format!("Welcome back. Signed in as {account}."),
            Page::Home => "Welcome to Todo. Sign Up or Log In to manage your items.".to_string(),
            Page::SignUp => "Create your account.".to_string(),
            Page::Login => "Log in to continue.".to_string(),
            Page::Items => {
                let items = self.current_items();
                if items.is_empty() {
                    format!("Signed in as {account}. You have no items yet.")
                } else {
                    format!("Signed in as {account}. Your items: {}.", items.join(", "))
                }
            }
            Page::NewItem => "New item.".to_string(),
            Page::NotFound => "Page not found.".to_string(),
        };
        if let Some(flash) = &self.flash {
            text.push(' ');
            text.push_str(flash);
        }
        text
    }

    fn current_items(&self) -> &[String] {
        self.session
            .as_ref()
            .and_then(|email| self.items.get(email))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn snapshot(&self) -> PageSnapshot {
        let location = if self.path == BLANK {
            BLANK.to_string()
        } else {
            format!("{APP_ORIGIN}{}", self.path)
        };
        PageSnapshot {
            location,
            title: self.page().title().to_string(),
            visible_text: self.visible_text(),
            elements: self.elements(),
        }
    }

    fn diagnostics(&self) -> Diagnostics {
        let page = self.snapshot();
        Diagnostics {
            location: page.location,
            title: page.title,
            elements: page.elements,
        }
    }

    // ── Actions ───────────────────────────────────────────────────────────────

    fn fill(&mut self, field: &str, value: &str) -> Result<(), String> {
        let input = self
            .page()
            .inputs()
            .iter()
            .find(|name| field == **name || field.contains(**name))
            .ok_or_else(|| format!("no '{field}' field on this page"))?;
        self.form.insert((*input).to_string(), value.to_string());
        Ok(())
    }

    fn click(&mut self, target: &str) -> Result<(), String> {
        let target = if target.eq_ignore_ascii_case("submit") {
            self.page()
                .submit_button()
                .ok_or_else(|| "no form to submit on this page".to_string())?
                .to_string()
        } else {
            target.to_string()
        };

        let label = self
            .elements()
            .into_iter()
            .filter_map(|e| {
                e.strip_suffix(" button")
                    .or_else(|| e.strip_suffix(" link"))
                    .map(str::to_string)
            })
            .find(|label| label.eq_ignore_ascii_case(&target))
            .ok_or_else(|| format!("no clickable element '{target}'"))?;

        match (self.page(), label.as_str()) {
            (_, "Sign Up") if self.page() != Page::SignUp => self.visit("/signup"),
            (_, "Log In") if self.page() != Page::Login => self.visit("/login"),
            (_, "Items") => self.visit("/items"),
            (_, "New Item") => self.visit("/items/new"),
            (_, "Log Out") => {
                self.session = None;
                self.visit("/");
            }
            (Page::SignUp, "Sign Up") => self.sign_up(),
            (Page::Login, "Log In") => self.log_in(),
            (Page::NewItem, "Save") => self.save_item()?,
            (Page::Items, delete) => {
                let title = delete.strip_prefix("Delete ").unwrap_or(delete).to_string();
                if let Some(email) = self.session.clone() {
                    if let Some(items) = self.items.get_mut(&email) {
                        items.retain(|t| *t != title);
                    }
                }
            }
            (_, other) => return Err(format!("'{other}' does nothing here")),
        }
        Ok(())
    }

    fn sign_up(&mut self) {
        let email = self.form.get("email").cloned().unwrap_or_default();
        let password = self.form.get("password").cloned().unwrap_or_default();
        if email.is_empty() || password.is_empty() {
            self.flash = Some("Email and password are required.".to_string());
        } else if self.accounts.contains_key(&email) {
            self.flash = Some("Email already registered.".to_string());
        } else {
            self.accounts.insert(email.clone(), password);
            self.session = Some(email);
            self.visit("/items");
        }
    }

    fn log_in(&mut self) {
        let email = self.form.get("email").cloned().unwrap_or_default();
        let password = self.form.get("password").cloned().unwrap_or_default();
        if self.accounts.get(&email) == Some(&password) {
            self.session = Some(email);
            self.logins += 1;
            self.visit("/items");
        } else {
            self.flash = Some("Invalid email or password.".to_string());
        }
    }

    fn save_item(&mut self) -> Result<(), String> {
        if self.faults.broken_create {
            return Err("the Save button is disabled".to_string());
        }
        let title = self.form.get("title").cloned().unwrap_or_default();
        if title.is_empty() {
            return Err("title is required".to_string());
        }
        let Some(email) = self.session.clone() else {
            return Err("not signed in".to_string());
        };
        self.items.entry(email).or_default().push(title);
        self.visit("/items");
        Ok(())
    }

    fn perform(&mut self, instruction: &str) -> Result<(), String> {
        if let Some(assignment) = instruction::parse_field_assignment(instruction) {
            return self.fill(&assignment.field, &assignment.value);
        }
        if let Some(caps) = NAVIGATE_RE.captures(instruction) {
            self.visit(&caps["path"]);
            return Ok(());
        }
        if let Some(caps) = CLICK_RE.captures(instruction) {
            return self.click(caps["target"].trim());
        }
        Err(format!("don't know how to '{instruction}'"))
    }
}

// ── MockWebApp ────────────────────────────────────────────────────────────────

/// The simulated application. Share it as `Arc<MockWebApp>`; it serves as
/// both the session driver and the action executor of a run.
#[derive(Debug)]
pub struct MockWebApp {
    state: Mutex<AppState>,
}

impl MockWebApp {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AppState {
                path: BLANK.to_string(),
                session: None,
                accounts: HashMap::new(),
                items: HashMap::new(),
                form: HashMap::new(),
                flash: None,
                faults: Faults::default(),
                logins: 0,
                expired_sessions: 0,
            }),
        }
    }

    /// Disable the Save button so item creation always fails.
    pub fn with_broken_create(self) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.faults.broken_create = true;
        }
        self
    }

    /// Drop the session on the first navigation to `path` while signed in.
    pub fn with_session_expiry_at(self, path: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.faults.expire_session_at = Some(path.into());
        }
        self
    }

    /// Number of successful log-ins through the log-in form.
    pub fn login_count(&self) -> usize {
        self.state.lock().map(|s| s.logins).unwrap_or_default()
    }

    pub fn expired_sessions(&self) -> usize {
        self.state.lock().map(|s| s.expired_sessions).unwrap_or_default()
    }

    /// Every registered account email, sorted.
    pub fn accounts(&self) -> Vec<String> {
        let mut accounts: Vec<String> = self
            .state
            .lock()
            .map(|s| s.accounts.keys().cloned().collect())
            .unwrap_or_default();
        accounts.sort();
        accounts
    }

    pub fn items_of(&self, email: &str) -> Vec<String> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.items.get(email).cloned())
            .unwrap_or_default()
    }

    fn lock(&self) -> VigilResult<MutexGuard<'_, AppState>> {
        self.state.lock().map_err(|e| VigilError::SessionError {
            reason: format!("app state lock poisoned: {e}"),
        })
    }
}

impl Default for MockWebApp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionDriver for MockWebApp {
    async fn snapshot(&self) -> VigilResult<PageSnapshot> {
        Ok(self.lock()?.snapshot())
    }

    async fn goto(&self, url: &str) -> VigilResult<()> {
        let mut state = self.lock()?;
        if url == BLANK {
            state.path = BLANK.to_string();
            state.form.clear();
            state.flash = None;
        } else {
            let path = location_path(url).to_string();
            state.visit(if path.is_empty() { "/" } else { path.as_str() });
        }
        Ok(())
    }

    async fn soft_navigate(&self, path: &str) -> VigilResult<()> {
        self.lock()?.visit(path);
        Ok(())
    }

    async fn clear_client_state(&self) -> VigilResult<()> {
        let mut state = self.lock()?;
        state.session = None;
        state.form.clear();
        Ok(())
    }

    async fn reload(&self) -> VigilResult<()> {
        let mut state = self.lock()?;
        if state.path != BLANK {
            let path = state.path.clone();
            state.visit(&path);
        }
        Ok(())
    }
}

#[async_trait]
impl ActionExecutor for MockWebApp {
    async fn execute(&self, step: &Step, _page: &PageSnapshot) -> VigilResult<StepOutcome> {
        let Step::Act { instruction } = step else {
            return Err(VigilError::StepExecutionFailure {
                reason: "the simulated app only performs Act steps".to_string(),
            });
        };

        tokio::time::sleep(ACTION_LATENCY).await;

        let mut state = self.lock()?;
        debug!(instruction = %instruction, path = %state.path, "simulated action");
        Ok(match state.perform(instruction) {
            Ok(()) => StepOutcome::succeeded(ACTION_LATENCY),
            Err(reason) => StepOutcome::failed(reason, ACTION_LATENCY, Some(state.diagnostics())),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
