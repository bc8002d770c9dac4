//! API client for the CMS admin backend
//!
//! [`AdminApi`] is the seam the session layer talks to; [`HttpAdminApi`] is the
//! `reqwest` implementation used in production.

use async_trait::async_trait;
use panel_core::{
    ApiConfig, ApiEnvelope, AuthPayload, DashboardStats, ErrorContext, LoginRequest, PanelError,
    PanelResult, PasswordChange, ProfileUpdate,
};
use std::collections::HashMap;

mod http;

#[cfg(test)]
mod tests;

pub use http::HttpAdminApi;

/// Endpoint paths, relative to the configured base URL
pub mod endpoints {
    pub const VERIFY: &str = "auth/verify";
    pub const LOGIN: &str = "auth/login";
    pub const LOGOUT: &str = "auth/logout";
    pub const PROFILE: &str = "auth/profile";
    pub const PASSWORD: &str = "auth/password";
    pub const DASHBOARD_STATS: &str = "dashboard/stats";
}

/// Configuration for API clients
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Additional headers
    pub headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_seconds: config.timeout_seconds,
            user_agent: config.user_agent.clone(),
            headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    /// Create a configuration pointing at `base_url`
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set additional header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Base URL with a trailing slash so relative endpoints join below it
    pub(crate) fn normalized_base_url(&self) -> PanelResult<url::Url> {
        let mut base = self.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        url::Url::parse(&base).map_err(|e| PanelError::Config {
            message: format!("Invalid API base URL '{}': {}", self.base_url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("api_client")
                .with_operation("parse_base_url")
                .with_suggestion("Set api.base_url to an absolute http(s) URL"),
        })
    }
}

/// Remote operations the admin panel relies on
///
/// Token handling is synchronous because it only touches local storage.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Token held for this process or remembered from an earlier one
    fn stored_token(&self) -> Option<String>;

    /// Replace or clear the token; `persist` keeps it across restarts
    fn set_token(&self, token: Option<String>, persist: bool) -> PanelResult<()>;

    async fn verify_token(&self) -> PanelResult<ApiEnvelope<AuthPayload>>;

    /// Submit credentials; a successful response also installs the issued token
    async fn login(&self, request: &LoginRequest) -> PanelResult<ApiEnvelope<AuthPayload>>;

    async fn logout(&self) -> PanelResult<()>;

    async fn update_profile(&self, update: &ProfileUpdate)
        -> PanelResult<ApiEnvelope<AuthPayload>>;

    async fn change_password(
        &self,
        change: &PasswordChange,
    ) -> PanelResult<ApiEnvelope<serde_json::Value>>;

    async fn dashboard_stats(&self) -> PanelResult<ApiEnvelope<DashboardStats>>;
}

/// Helper function to create HTTP client with common configuration
pub(crate) fn create_http_client(config: &ApiClientConfig) -> PanelResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            PanelError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            PanelError::Config {
                message: format!("Invalid header name '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?;

        let header_value =
            reqwest::header::HeaderValue::from_str(value).map_err(|e| PanelError::Config {
                message: format!("Invalid header value for '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })?;

        headers.insert(header_name, header_value);
    }

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| PanelError::Internal {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })
}

/// Map a transport failure to the matching error kind
pub(crate) fn transport_error(error: reqwest::Error, operation: &str, timeout_seconds: u64) -> PanelError {
    if error.is_timeout() {
        PanelError::Timeout {
            operation: operation.to_string(),
            duration_ms: timeout_seconds * 1000,
            context: ErrorContext::new("api_client")
                .with_operation(operation)
                .with_suggestion("Check that the backend is reachable"),
        }
    } else {
        PanelError::Network {
            message: format!("Request failed: {}", error),
            source: Some(Box::new(error)),
            context: ErrorContext::new("api_client")
                .with_operation(operation)
                .with_suggestion("Check network connectivity and the api.base_url setting"),
        }
    }
}

/// Helper function to turn a non-2xx response into an error
///
/// The backend usually answers failures with an envelope; its `message` is kept
/// so it can be shown to the user verbatim.
pub(crate) async fn handle_response_error(response: reqwest::Response, operation: &str) -> PanelError {
    let status = response.status();
    let url = response.url().clone();
    let error_body = response.text().await.unwrap_or_default();

    let remote_message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&error_body)
        .ok()
        .and_then(|envelope| envelope.message);

    let detail = match (&remote_message, error_body.is_empty()) {
        (Some(message), _) => message.clone(),
        (None, true) => status.canonical_reason().unwrap_or("Unknown error").to_string(),
        (None, false) => error_body,
    };

    PanelError::Api {
        status: status.as_u16(),
        message: format!("HTTP {} error for {}: {}", status.as_u16(), url, detail),
        remote_message,
        context: ErrorContext::new("api_client")
            .with_operation(operation)
            .with_suggestion(match status.as_u16() {
                401 => "Sign in again",
                403 => "Ask a super admin for the required permission",
                404 => "Check the api.base_url setting",
                _ => "Check network connectivity and API status",
            }),
    }
}
