//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};

pub type PanelResult<T> = Result<T, PanelError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the admin panel
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// The backend answered, but with a failure status or `success: false`.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        /// Message supplied by the server in the response envelope, if any
        remote_message: Option<String>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl PanelError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            PanelError::Authentication { context, .. }
            | PanelError::Network { context, .. }
            | PanelError::Api { context, .. }
            | PanelError::Timeout { context, .. }
            | PanelError::Config { context, .. }
            | PanelError::Storage { context, .. }
            | PanelError::Internal { context, .. } => Some(context),
            PanelError::Io(_) | PanelError::Serialization(_) => None,
        }
    }

    /// Check if error is recoverable by trying the same action again later
    ///
    /// An undecodable body counts as transient: the backend answered, but not
    /// with anything that says the credentials are bad.
    pub fn is_recoverable(&self) -> bool {
        match self {
            PanelError::Network { .. }
            | PanelError::Timeout { .. }
            | PanelError::Serialization(_) => true,
            PanelError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status attached to the error, if it came from the backend
    pub fn status(&self) -> Option<u16> {
        match self {
            PanelError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message the server wants shown to the user, if it sent one
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            PanelError::Api { remote_message, .. } => remote_message.as_deref(),
            _ => None,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            PanelError::Internal { .. } => {
                error!(error_id = ?error_id, error = %self, "Internal error occurred");
            }
            PanelError::Config { .. } | PanelError::Storage { .. } => {
                error!(error_id = ?error_id, error = %self, "Configuration or storage error");
            }
            PanelError::Network { .. }
            | PanelError::Timeout { .. }
            | PanelError::Serialization(_) => {
                warn!(
                    error_id = ?error_id,
                    error = %self,
                    "Network or timeout error (may be recoverable)"
                );
            }
            PanelError::Api { status, .. } if *status < 500 => {
                warn!(error_id = ?error_id, status = status, error = %self, "Request rejected");
            }
            _ => {
                error!(error_id = ?error_id, error = %self, "Error occurred");
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::PanelError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'panel config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! auth_error {
    ($msg:expr, $component:expr) => {
        $crate::PanelError::Authentication {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Sign in again with 'panel login'"),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_expose_remote_message() {
        let error = PanelError::Api {
            status: 401,
            message: "HTTP 401".to_string(),
            remote_message: Some("Invalid email or password".to_string()),
            context: ErrorContext::new("test"),
        };

        assert_eq!(error.remote_message(), Some("Invalid email or password"));
        assert_eq!(error.status(), Some(401));
        assert!(!error.is_recoverable());
    }

    #[test]
    fn server_failures_are_recoverable() {
        let error = PanelError::Api {
            status: 503,
            message: "HTTP 503".to_string(),
            remote_message: None,
            context: ErrorContext::new("test"),
        };

        assert!(error.is_recoverable());
        assert_eq!(error.remote_message(), None);
    }

    #[test]
    fn undecodable_bodies_are_recoverable() {
        let error: PanelError = serde_json::from_str::<serde_json::Value>("<html>")
            .unwrap_err()
            .into();

        assert!(error.is_recoverable());
        assert_eq!(error.status(), None);
    }

    #[test]
    fn macros_attach_context() {
        let error = config_error!("bad base url", "config");
        let context = error.context().unwrap();
        assert_eq!(context.component, "config");
        assert!(!context.recovery_suggestions.is_empty());

        let error = auth_error!("No stored token", "session");
        assert_eq!(error.remote_message(), None);
        assert_eq!(error.to_string(), "Authentication error: No stored token");
    }
}
