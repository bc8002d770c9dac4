//! Panel Client - access to the CMS admin REST backend
//!
//! Provides the [`AdminApi`] trait consumed by the session layer, its HTTP
//! implementation, and the stores that keep the credential token.

pub mod api;
pub mod token_store;

pub use api::{endpoints, AdminApi, ApiClientConfig, HttpAdminApi};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
