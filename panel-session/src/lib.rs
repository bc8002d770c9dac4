//! Panel Session - authentication state of the admin panel
//!
//! This crate owns the signed-in administrator for one run of the panel:
//!
//! - Silent re-authentication from a stored token on start-up
//! - Validated login, confirmed logout, profile and password updates
//! - Permission checks for the rest of the application
//! - Periodic token revalidation
//!
//! ## Architecture
//!
//! [`SessionManager`] never renders anything itself. Screens, notifications and
//! prompts go through [`SessionUi`], application start-up through [`AppHooks`],
//! and remote calls through [`panel_client::AdminApi`]. The binary supplies the
//! terminal implementations; tests supply recording fakes.

pub mod auth;
pub mod revalidate;
pub mod session;

pub use auth::{check_permission, permissions, validate_login, validate_password_change};
pub use revalidate::Revalidator;
pub use session::{AppHooks, Control, Screen, SessionManager, SessionUi, ToastKind};

use panel_core::PanelError;

/// Session-level error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Core error: {0}")]
    Core(#[from] PanelError),

    /// Input rejected locally; nothing was sent to the backend
    #[error("Validation error: {message}")]
    Validation { field: &'static str, message: String },

    /// The backend refused the request; `message` is what the user was shown
    #[error("Request rejected: {message}")]
    Rejected {
        message: String,
        #[source]
        source: PanelError,
    },

    #[error("A login request is already in progress")]
    LoginInFlight,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Permission denied: {permission}")]
    PermissionDenied { permission: String },
}

pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// Create a validation error
    pub fn validation<S: Into<String>>(field: &'static str, message: S) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a permission error
    pub fn permission_denied<S: Into<String>>(permission: S) -> Self {
        Self::PermissionDenied {
            permission: permission.into(),
        }
    }

    /// Text suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Validation { message, .. } | SessionError::Rejected { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}
