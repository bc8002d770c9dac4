//! Core data type definitions shared by the API client and the session layer

use crate::error::{ErrorContext, PanelError, PanelResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Administrative role of a panel user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Bypasses every permission check
    SuperAdmin,
    Admin,
    Editor,
    Author,
    Viewer,
    /// Any role the backend knows about and this client does not
    Other(String),
}

impl Role {
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Author => "author",
            Role::Viewer => "viewer",
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "super_admin" => Role::SuperAdmin,
            "admin" => Role::Admin,
            "editor" => Role::Editor,
            "author" => Role::Author,
            "viewer" => Role::Viewer,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile of the signed-in administrator as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Permission identifiers granted to this user
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl UserRecord {
    pub fn is_super_admin(&self) -> bool {
        self.role.is_super_admin()
    }

    /// Super admins hold every permission; everyone else needs it in their set.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_super_admin() || self.permissions.contains(permission)
    }

    /// Get user display string
    pub fn display_string(&self) -> String {
        format!("{} <{}> ({})", self.name, self.email, self.role)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

/// Standard response wrapper used by every backend endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, turning `success: false` or a missing payload into an error
    pub fn into_data(self, operation: &str) -> PanelResult<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (success, _) => {
                let message = if success {
                    "Response did not contain any data".to_string()
                } else {
                    self.message
                        .clone()
                        .unwrap_or_else(|| "Request was not successful".to_string())
                };
                Err(PanelError::Api {
                    status: 200,
                    message,
                    remote_message: self.message,
                    context: ErrorContext::new("api_envelope").with_operation(operation),
                })
            }
        }
    }

    /// Check the success flag for endpoints that return no payload
    pub fn into_result(self, operation: &str) -> PanelResult<Option<String>> {
        if self.success {
            Ok(self.message)
        } else {
            Err(PanelError::Api {
                status: 200,
                message: self
                    .message
                    .clone()
                    .unwrap_or_else(|| "Request was not successful".to_string()),
                remote_message: self.message,
                context: ErrorContext::new("api_envelope").with_operation(operation),
            })
        }
    }
}

/// Payload of the login, verify and profile endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub admin: UserRecord,
    /// Issued on login only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Credentials submitted by the login form
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "rememberMe")]
    pub remember_me: bool,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

/// Fields of the profile form; unset fields are left untouched by the backend
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Password change form
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordChange { .. }")
    }
}

/// Counters shown on the dashboard summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_posts: u64,
    pub published_posts: u64,
    pub draft_posts: u64,
    pub total_pages: u64,
    pub total_media: u64,
    /// Total media size in bytes
    pub media_size: u64,
    pub total_users: u64,
    pub recent_activity: Vec<ActivityItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub action: String,
    pub title: String,
    #[serde(default)]
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
}
