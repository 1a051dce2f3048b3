use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::session::{Route, SessionContext};
use crate::views::Notice;
use crate::views::events::{Action, UiEvent};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid"));

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err("Please enter both username and password".to_string());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

impl RegistrationForm {
    /// Same limits the service enforces, checked before any network call.
    pub fn validate(&self) -> Result<(), String> {
        let username_len = self.username.trim().chars().count();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username_len) {
            return Err(format!(
                "Username must be between {} and {} characters",
                USERNAME_MIN_LEN, USERNAME_MAX_LEN
            ));
        }
        if self.password.chars().count() < PASSWORD_MIN_LEN {
            return Err(format!(
                "Password must be at least {} characters",
                PASSWORD_MIN_LEN
            ));
        }
        if let Some(email) = self.email() {
            if !EMAIL_PATTERN.is_match(email) {
                return Err("Please enter a valid email address".to_string());
            }
        }
        Ok(())
    }

    fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthTab {
    Login,
    Register,
}

/// Login/register entry view.
pub struct AuthView {
    ctx: SessionContext,
    pub tab: AuthTab,
    /// Controls are disabled while a submission is outstanding.
    pub submitting: bool,
    pub notice: Option<Notice>,
    /// Prefilled after a successful registration.
    pub username_hint: Option<String>,
}

impl AuthView {
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            ctx,
            tab: AuthTab::Login,
            submitting: false,
            notice: None,
            username_hint: None,
        }
    }

    pub fn switch_tab(&mut self, tab: AuthTab) {
        self.tab = tab;
        self.notice = None;
    }

    pub async fn submit_login(&mut self, form: &LoginForm) -> Option<Route> {
        self.tab = AuthTab::Login;
        if let Err(message) = form.validate() {
            self.notice = Some(Notice::error(message));
            return None;
        }

        self.submitting = true;
        let result = self
            .ctx
            .client()
            .login(form.username.trim(), &form.password)
            .await;
        self.submitting = false;

        match result {
            Ok(_) => {
                self.notice = Some(Notice::success("Login successful! Redirecting..."));
                Some(Route::Dashboard)
            }
            Err(e) => {
                self.notice = Some(Notice::from_error("Login failed", &e));
                None
            }
        }
    }

    pub async fn submit_register(&mut self, form: &RegistrationForm) -> ServiceResult<()> {
        self.tab = AuthTab::Register;
        if let Err(message) = form.validate() {
            debug!("Registration rejected locally");
            self.notice = Some(Notice::error(message.clone()));
            return Err(ServiceError::Validation(message));
        }

        self.submitting = true;
        let result = self
            .ctx
            .client()
            .register(form.username.trim(), &form.password, form.email())
            .await;
        self.submitting = false;

        match result {
            Ok(_) => {
                self.notice = Some(Notice::success("Registration successful! Please log in."));
                self.username_hint = Some(form.username.trim().to_string());
                self.tab = AuthTab::Login;
                Ok(())
            }
            Err(e) => {
                self.notice = Some(Notice::from_error("Registration failed", &e));
                Err(e)
            }
        }
    }

    pub async fn dispatch(&mut self, event: UiEvent) -> Option<Route> {
        match (event.action(), event) {
            (Some(Action::Login), UiEvent::LoginSubmitted(form)) => self.submit_login(&form).await,
            (Some(Action::Register), UiEvent::RegisterSubmitted(form)) => {
                // The notice already carries the outcome.
                let _ = self.submit_register(&form).await;
                None
            }
            (action, _) => {
                debug!(?action, "Event not handled by the entry view");
                None
            }
        }
    }
}
