//! Panel Core - shared data structures and infrastructure
//!
//! Types exchanged with the backend, the error type, configuration, logging
//! and small formatting helpers used by every other panel crate.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod types;

pub use async_utils::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
