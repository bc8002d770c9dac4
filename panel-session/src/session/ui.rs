//! Collaborators the session manager drives

use super::{Control, Screen, ToastKind};
use async_trait::async_trait;
use panel_core::UserRecord;
use std::time::Duration;

/// Presentation surface: screens, notifications, inline errors and prompts
#[async_trait]
pub trait SessionUi: Send + Sync {
    fn show_screen(&self, screen: Screen);

    fn show_toast(&self, message: &str, kind: ToastKind, duration: Option<Duration>);

    /// Error shown next to the login form
    fn show_inline_error(&self, message: &str);

    fn clear_inline_error(&self);

    fn set_busy(&self, control: Control, busy: bool, label: Option<&str>);

    /// Yes/cancel question; `true` means the user agreed
    async fn confirm(&self, message: &str) -> bool;
}

/// The application shell that lives behind the login screen
#[async_trait]
pub trait AppHooks: Send + Sync {
    /// Called each time the app screen is entered with a verified user
    async fn on_authenticated(&self);

    /// Called whenever the signed-in user changes, with `None` after sign-out
    fn update_user_display(&self, user: Option<&UserRecord>);
}
