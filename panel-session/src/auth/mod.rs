//! Authorization and credential checks
//!
//! Everything here is synchronous and side-effect free so the session manager
//! can answer permission queries and reject bad input without a round trip.

pub mod permissions;
pub mod validation;

pub use permissions::check_permission;
pub use validation::{validate_login, validate_password_change};
