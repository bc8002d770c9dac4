//! Session Management Module
//!
//! The session manager and the collaborator traits it drives.

pub mod manager;
pub mod types;
pub mod ui;

pub use manager::SessionManager;
pub use types::*;
pub use ui::{AppHooks, SessionUi};
