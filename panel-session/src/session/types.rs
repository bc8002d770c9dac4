//! Session Types and Structures

use panel_core::UserRecord;

/// Top-level screens; exactly one is visible at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Loading,
    Login,
    App,
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Screen::Loading => write!(f, "loading"),
            Screen::Login => write!(f, "login"),
            Screen::App => write!(f, "app"),
        }
    }
}

/// Severity of a transient notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ToastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToastKind::Success => write!(f, "success"),
            ToastKind::Error => write!(f, "error"),
            ToastKind::Warning => write!(f, "warning"),
            ToastKind::Info => write!(f, "info"),
        }
    }
}

/// Form controls that show a busy state while their request runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    LoginSubmit,
    ProfileSubmit,
    PasswordSubmit,
}

/// Authentication state for one run of the panel
///
/// `is_authenticated` implies `current_user.is_some()`. `generation` changes on
/// every sign-in and sign-out, so a request started under one session can tell
/// whether that session is still the current one when it completes.
#[derive(Debug, Clone)]
pub(crate) struct SessionState {
    pub current_user: Option<UserRecord>,
    pub is_authenticated: bool,
    pub screen: Screen,
    pub generation: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current_user: None,
            is_authenticated: false,
            screen: Screen::Loading,
            generation: 0,
        }
    }
}

impl SessionState {
    pub fn sign_in(&mut self, user: UserRecord) {
        self.current_user = Some(user);
        self.is_authenticated = true;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn sign_out(&mut self) {
        self.is_authenticated = false;
        self.current_user = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Generation of the signed-in session, if any
    pub fn active_generation(&self) -> Option<u64> {
        self.is_authenticated.then_some(self.generation)
    }

    /// Still signed in to the session that had `generation`
    pub fn is_current(&self, generation: u64) -> bool {
        self.active_generation() == Some(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_core::Role;
    use std::collections::BTreeSet;

    fn user() -> UserRecord {
        UserRecord {
            id: "1".to_string(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            role: Role::Viewer,
            permissions: BTreeSet::new(),
        }
    }

    #[test]
    fn every_sign_in_and_sign_out_starts_a_new_generation() {
        let mut state = SessionState::default();
        assert_eq!(state.active_generation(), None);

        state.sign_in(user());
        let first = state.active_generation().unwrap();
        assert!(state.is_current(first));

        state.sign_out();
        assert!(!state.is_current(first));
        assert!(state.current_user.is_none());

        state.sign_in(user());
        let second = state.active_generation().unwrap();
        assert_ne!(first, second);
        assert!(!state.is_current(first));
    }
}
