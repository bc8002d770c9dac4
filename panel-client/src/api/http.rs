//! `reqwest` implementation of [`AdminApi`]

use async_trait::async_trait;
use panel_core::{
    auth_error, ApiEnvelope, AuthPayload, DashboardStats, LoginRequest, PanelResult,
    PasswordChange, ProfileUpdate,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use super::{
    create_http_client, endpoints, handle_response_error, transport_error, AdminApi,
    ApiClientConfig,
};
use crate::token_store::{MemoryTokenStore, TokenStore};

/// Admin backend client over HTTP with bearer-token authentication
pub struct HttpAdminApi {
    client: reqwest::Client,
    config: ApiClientConfig,
    base_url: url::Url,
    /// Token for this process, remembered or not
    session_token: RwLock<Option<String>>,
    /// Where remembered tokens are kept between runs
    durable: Arc<dyn TokenStore>,
}

impl HttpAdminApi {
    /// Create a client whose tokens are never persisted
    pub fn new(config: ApiClientConfig) -> PanelResult<Self> {
        Self::with_token_store(config, Arc::new(MemoryTokenStore::new()))
    }

    /// Create a client that persists remembered tokens in `durable`
    pub fn with_token_store(
        config: ApiClientConfig,
        durable: Arc<dyn TokenStore>,
    ) -> PanelResult<Self> {
        let client = create_http_client(&config)?;
        let base_url = config.normalized_base_url()?;

        info!("Created admin API client for {}", base_url);

        Ok(Self {
            client,
            config,
            base_url,
            session_token: RwLock::new(None),
            durable,
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> PanelResult<url::Url> {
        self.base_url.join(endpoint).map_err(|e| panel_core::PanelError::Config {
            message: format!("Invalid endpoint '{}': {}", endpoint, e),
            source: Some(Box::new(e)),
            context: panel_core::ErrorContext::new("http_admin_api").with_operation("endpoint_url"),
        })
    }

    fn request(&self, method: Method, endpoint: &str) -> PanelResult<reqwest::RequestBuilder> {
        let url = self.endpoint_url(endpoint)?;
        debug!("Making admin API request: {} {}", method, url);

        let builder = self.client.request(method, url);
        Ok(match self.stored_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Send a request and decode the envelope of a 2xx response
    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        operation: &str,
    ) -> PanelResult<ApiEnvelope<T>> {
        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(e, operation, self.config.timeout_seconds))?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, operation).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, operation, self.config.timeout_seconds))?;

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AdminApi for HttpAdminApi {
    fn stored_token(&self) -> Option<String> {
        if let Some(token) = self
            .session_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
        {
            return Some(token);
        }

        match self.durable.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read remembered token");
                None
            }
        }
    }

    fn set_token(&self, token: Option<String>, persist: bool) -> PanelResult<()> {
        *self
            .session_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token.clone();

        match token {
            Some(token) if persist => self.durable.save(&token),
            // A token that should not outlive the process must not leave an older one behind
            _ => self.durable.clear(),
        }
    }

    async fn verify_token(&self) -> PanelResult<ApiEnvelope<AuthPayload>> {
        if self.stored_token().is_none() {
            return Err(auth_error!("No stored token to verify", "http_admin_api"));
        }

        let builder = self.request(Method::GET, endpoints::VERIFY)?;
        self.send(builder, "verify_token").await
    }

    async fn login(&self, request: &LoginRequest) -> PanelResult<ApiEnvelope<AuthPayload>> {
        let builder = self.request(Method::POST, endpoints::LOGIN)?.json(request);
        let envelope: ApiEnvelope<AuthPayload> = self.send(builder, "login").await?;

        let issued = envelope
            .data
            .as_ref()
            .filter(|_| envelope.success)
            .and_then(|payload| payload.token.clone());

        if let Some(token) = issued {
            // The login itself succeeded; a storage problem only costs "remember me"
            if let Err(e) = self.set_token(Some(token), request.remember_me) {
                warn!(error = %e, "Failed to store issued token");
            }
        }

        Ok(envelope)
    }

    async fn logout(&self) -> PanelResult<()> {
        let builder = self.request(Method::POST, endpoints::LOGOUT)?;
        let envelope: ApiEnvelope<serde_json::Value> = self.send(builder, "logout").await?;
        envelope.into_result("logout")?;
        Ok(())
    }

    async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> PanelResult<ApiEnvelope<AuthPayload>> {
        let builder = self.request(Method::PUT, endpoints::PROFILE)?.json(update);
        self.send(builder, "update_profile").await
    }

    async fn change_password(
        &self,
        change: &PasswordChange,
    ) -> PanelResult<ApiEnvelope<serde_json::Value>> {
        let builder = self.request(Method::PUT, endpoints::PASSWORD)?.json(change);
        self.send(builder, "change_password").await
    }

    async fn dashboard_stats(&self) -> PanelResult<ApiEnvelope<DashboardStats>> {
        let builder = self.request(Method::GET, endpoints::DASHBOARD_STATS)?;
        self.send(builder, "dashboard_stats").await
    }
}
