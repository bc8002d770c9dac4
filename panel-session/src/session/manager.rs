//! Session Manager - authentication state and the flows that change it
//!
//! One manager exists per run of the panel. It is shared by `Arc` with whatever
//! needs to ask about the signed-in user; all changes go through its command
//! methods.

use super::types::SessionState;
use super::{AppHooks, Control, Screen, SessionUi, ToastKind};
use crate::auth::{permissions, validation};
use crate::{SessionError, SessionResult};
use panel_client::AdminApi;
use panel_core::{
    log_operation_error, log_operation_start, log_operation_success, Delay, PanelError,
    LoginRequest, PasswordChange, ProfileUpdate, SessionConfig, TokioDelay, UserRecord,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

const LOGIN_FAILED_FALLBACK: &str = "Login failed. Please check your credentials and try again.";
const LOGOUT_CONFIRMATION: &str = "Are you sure you want to logout?";
const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// Client-side session and authentication manager
pub struct SessionManager {
    api: Arc<dyn AdminApi>,
    ui: Arc<dyn SessionUi>,
    hooks: Arc<dyn AppHooks>,
    delay: Arc<dyn Delay>,
    config: SessionConfig,
    state: RwLock<SessionState>,
    /// Start-up runs once per process
    initialized: AtomicBool,
    login_in_flight: AtomicBool,
}

impl SessionManager {
    /// Create a new session manager; nobody is signed in until [`Self::initialize`] runs
    pub fn new(
        api: Arc<dyn AdminApi>,
        ui: Arc<dyn SessionUi>,
        hooks: Arc<dyn AppHooks>,
        config: SessionConfig,
    ) -> Self {
        Self {
            api,
            ui,
            hooks,
            delay: Arc::new(TokioDelay),
            config,
            state: RwLock::new(SessionState::default()),
            initialized: AtomicBool::new(false),
            login_in_flight: AtomicBool::new(false),
        }
    }

    /// Replace the timer used for the pause before screen swaps
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().is_authenticated
    }

    pub fn current_user(&self) -> Option<UserRecord> {
        self.read_state().current_user.clone()
    }

    /// Screen most recently shown
    pub fn screen(&self) -> Screen {
        self.read_state().screen
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        permissions::check_permission(self.read_state().current_user.as_ref(), permission)
    }

    pub fn require_permission(&self, permission: &str) -> SessionResult<()> {
        permissions::require_permission(self.read_state().current_user.as_ref(), permission)
    }

    /// Start-up: restore the session from a stored token or fall back to login
    ///
    /// Verification failures are silent; the user simply lands on the login
    /// screen. Returns the screen the process ended up on.
    pub async fn initialize(&self) -> Screen {
        if self.initialized.swap(true, Ordering::AcqRel) {
            warn!("Session already initialized; ignoring repeated start-up");
            return self.screen();
        }

        self.show_screen(Screen::Loading);

        if self.api.stored_token().is_none() {
            debug!("No stored token; showing login");
            self.show_screen(Screen::Login);
            return Screen::Login;
        }

        log_operation_start!("verify_token");
        let verified = self
            .api
            .verify_token()
            .await
            .and_then(|envelope| envelope.into_data("verify_token"));

        match verified {
            Ok(payload) => {
                log_operation_success!("verify_token", user_id = %payload.admin.id);
                self.establish(payload.admin);
                self.enter_app().await;
                Screen::App
            }
            Err(e) => {
                warn!(error = %e, "Stored token rejected; showing login");
                self.discard_session();
                self.show_screen(Screen::Login);
                Screen::Login
            }
        }
    }

    /// Login form submission; the single dispatch point for the form
    ///
    /// Invalid input is reported inline without a request. A second submission
    /// while one is running is ignored with [`SessionError::LoginInFlight`].
    pub async fn submit_login(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> SessionResult<UserRecord> {
        if let Err(e) = validation::validate_login(email, password, self.config.min_password_length)
        {
            self.ui.show_inline_error(&e.user_message());
            return Err(e);
        }

        let Some(_in_flight) = InFlight::acquire(&self.login_in_flight) else {
            debug!("Login already in progress; ignoring submission");
            return Err(SessionError::LoginInFlight);
        };

        self.ui.clear_inline_error();
        let busy = Busy::engage(self.ui.as_ref(), Control::LoginSubmit, "Signing in...");

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            remember_me: remember,
        };

        log_operation_start!("login", email = %request.email, remember = remember);
        let result = self
            .api
            .login(&request)
            .await
            .and_then(|envelope| envelope.into_data("login"));
        drop(busy);

        match result {
            Ok(payload) => {
                log_operation_success!("login", user_id = %payload.admin.id);
                let user = payload.admin;
                self.establish(user.clone());
                self.ui.show_toast(
                    "Login successful!",
                    ToastKind::Success,
                    Some(self.config.toast_duration()),
                );
                self.delay.wait(self.config.transition_delay()).await;
                self.enter_app().await;
                Ok(user)
            }
            Err(e) => {
                log_operation_error!("login", e);
                let message = e
                    .remote_message()
                    .unwrap_or(LOGIN_FAILED_FALLBACK)
                    .to_string();
                self.ui.show_inline_error(&message);
                Err(SessionError::Rejected { message, source: e })
            }
        }
    }

    /// Sign out after the user confirms
    ///
    /// Returns `Ok(false)` when the user cancels. Local state is cleared even if
    /// the backend call fails, so the panel never shows a session the server
    /// may already have ended.
    pub async fn logout(&self) -> SessionResult<bool> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }

        if !self.ui.confirm(LOGOUT_CONFIRMATION).await {
            debug!("Logout cancelled");
            return Ok(false);
        }

        log_operation_start!("logout");
        match self.api.logout().await {
            Ok(()) => log_operation_success!("logout"),
            Err(e) => {
                log_operation_error!("logout", e);
                let reason = e
                    .remote_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| e.to_string());
                self.ui.show_toast(
                    &format!("Logout failed: {}", reason),
                    ToastKind::Error,
                    Some(self.config.toast_duration()),
                );
            }
        }

        self.discard_session();
        self.ui.show_toast(
            "Logged out successfully",
            ToastKind::Info,
            Some(self.config.toast_duration()),
        );
        self.delay.wait(self.config.transition_delay()).await;
        self.show_screen(Screen::Login);
        Ok(true)
    }

    /// Save profile changes and refresh the signed-in user
    pub async fn update_profile(&self, update: ProfileUpdate) -> SessionResult<UserRecord> {
        let Some(generation) = self.read_state().active_generation() else {
            return Err(SessionError::NotAuthenticated);
        };

        let _busy = Busy::engage(self.ui.as_ref(), Control::ProfileSubmit, "Saving...");

        log_operation_start!("update_profile");
        let result = self
            .api
            .update_profile(&update)
            .await
            .and_then(|envelope| envelope.into_data("update_profile"));

        match result {
            Ok(payload) => {
                log_operation_success!("update_profile", user_id = %payload.admin.id);
                if !self.replace_user(generation, payload.admin.clone()) {
                    debug!("Session changed while saving the profile; keeping the newer state");
                }
                self.ui.show_toast(
                    "Profile updated successfully",
                    ToastKind::Success,
                    Some(self.config.toast_duration()),
                );
                Ok(payload.admin)
            }
            Err(e) => Err(self.report_failure("update_profile", "Failed to update profile", e)),
        }
    }

    /// Change the signed-in user's password
    pub async fn change_password(&self, change: PasswordChange) -> SessionResult<()> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }

        if let Err(e) = validation::validate_password_change(&change, self.config.min_password_length)
        {
            self.ui
                .show_toast(&e.user_message(), ToastKind::Error, Some(self.config.toast_duration()));
            return Err(e);
        }

        let _busy = Busy::engage(self.ui.as_ref(), Control::PasswordSubmit, "Updating...");

        log_operation_start!("change_password");
        let result = self
            .api
            .change_password(&change)
            .await
            .and_then(|envelope| envelope.into_result("change_password"));

        match result {
            Ok(_) => {
                log_operation_success!("change_password");
                self.ui.show_toast(
                    "Password changed successfully",
                    ToastKind::Success,
                    Some(self.config.toast_duration()),
                );
                Ok(())
            }
            Err(e) => Err(self.report_failure("change_password", "Failed to change password", e)),
        }
    }

    /// Re-check the token of an authenticated session
    ///
    /// A rejected token ends the session and returns to the login screen.
    /// Transient failures (network, timeouts, 5xx, garbled bodies) keep the
    /// session. Returns whether the session is still signed in.
    pub async fn revalidate(&self) -> bool {
        let Some(generation) = self.read_state().active_generation() else {
            return false;
        };

        let verified = self
            .api
            .verify_token()
            .await
            .and_then(|envelope| envelope.into_data("verify_token"));

        // A login or logout may have finished while the request was out; its
        // outcome wins over this one.
        match verified {
            Ok(payload) => {
                if !self.replace_user(generation, payload.admin) {
                    debug!("Session changed during revalidation; result ignored");
                }
                self.is_authenticated()
            }
            Err(e) if e.is_recoverable() => {
                e.log();
                warn!("Could not revalidate session; keeping it for now");
                self.is_authenticated()
            }
            Err(e) => {
                if !self.end_session(Some(generation)) {
                    debug!(error = %e, "Stale revalidation failure ignored");
                    return self.is_authenticated();
                }

                e.log();
                info!("Session expired");
                self.ui.show_toast(
                    SESSION_EXPIRED,
                    ToastKind::Warning,
                    Some(self.config.toast_duration()),
                );
                self.show_screen(Screen::Login);
                false
            }
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn show_screen(&self, screen: Screen) {
        self.write_state().screen = screen;
        self.ui.show_screen(screen);
    }

    async fn enter_app(&self) {
        self.show_screen(Screen::App);
        self.hooks.on_authenticated().await;
    }

    fn establish(&self, user: UserRecord) {
        self.write_state().sign_in(user.clone());
        self.hooks.update_user_display(Some(&user));
    }

    /// Swap in a fresh copy of the signed-in user if `generation` is still current
    fn replace_user(&self, generation: u64, user: UserRecord) -> bool {
        {
            let mut state = self.write_state();
            if !state.is_current(generation) {
                return false;
            }
            if state.current_user.as_ref() == Some(&user) {
                return true;
            }
            state.current_user = Some(user.clone());
        }

        debug!(user_id = %user.id, "Signed-in user updated");
        self.hooks.update_user_display(Some(&user));
        true
    }

    /// Forget the token and the signed-in user
    fn discard_session(&self) {
        self.end_session(None);
    }

    /// Sign out; with `Some(generation)` only if that session is still current
    fn end_session(&self, generation: Option<u64>) -> bool {
        let was_signed_in = {
            let mut state = self.write_state();
            if generation.is_some_and(|generation| !state.is_current(generation)) {
                return false;
            }

            if let Err(e) = self.api.set_token(None, false) {
                warn!(error = %e, "Failed to clear stored token");
            }

            let was_signed_in = state.current_user.is_some();
            state.sign_out();
            was_signed_in
        };

        if was_signed_in {
            self.hooks.update_user_display(None);
        }
        true
    }

    fn report_failure(&self, operation: &str, fallback: &str, error: PanelError) -> SessionError {
        debug!(operation, "Request failed");
        error.log();
        let message = error.remote_message().unwrap_or(fallback).to_string();
        self.ui
            .show_toast(&message, ToastKind::Error, Some(self.config.toast_duration()));
        SessionError::Rejected {
            message,
            source: error,
        }
    }
}

/// Marks a control busy for as long as it lives
struct Busy<'a> {
    ui: &'a dyn SessionUi,
    control: Control,
}

impl<'a> Busy<'a> {
    fn engage(ui: &'a dyn SessionUi, control: Control, label: &str) -> Self {
        ui.set_busy(control, true, Some(label));
        Self { ui, control }
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.ui.set_busy(self.control, false, None);
    }
}

/// Holds the login in-flight flag; released on drop
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
