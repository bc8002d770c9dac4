//! Permission checks against the signed-in administrator

use crate::{SessionError, SessionResult};
use panel_core::UserRecord;

/// Permission identifiers the panel itself asks about
///
/// The backend may grant others; any string is a valid identifier.
pub const VIEW_DASHBOARD: &str = "view_dashboard";
pub const EDIT_CONTENT: &str = "edit_content";
pub const PUBLISH_CONTENT: &str = "publish_content";
pub const MANAGE_MEDIA: &str = "manage_media";
pub const MANAGE_USERS: &str = "manage_users";
pub const MANAGE_SETTINGS: &str = "manage_settings";

/// Decide whether `user` holds `permission`
///
/// Nobody signed in: denied. Super admin: always granted. Otherwise the
/// identifier must be in the user's permission set.
pub fn check_permission(user: Option<&UserRecord>, permission: &str) -> bool {
    match user {
        None => false,
        Some(user) => user.has_permission(permission),
    }
}

/// Like [`check_permission`] but as an error for `?` call sites
pub fn require_permission(user: Option<&UserRecord>, permission: &str) -> SessionResult<()> {
    match user {
        None => Err(SessionError::NotAuthenticated),
        Some(_) if check_permission(user, permission) => Ok(()),
        Some(_) => Err(SessionError::permission_denied(permission)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_core::Role;

    fn user(role: Role, permissions: &[&str]) -> UserRecord {
        UserRecord {
            id: "1".to_string(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            role,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn nobody_signed_in_has_no_permissions() {
        assert!(!check_permission(None, EDIT_CONTENT));
        assert!(matches!(
            require_permission(None, EDIT_CONTENT),
            Err(SessionError::NotAuthenticated)
        ));
    }

    #[test]
    fn super_admin_bypasses_the_permission_set() {
        let root = user(Role::SuperAdmin, &[]);
        assert!(check_permission(Some(&root), "delete_user"));
        assert!(check_permission(Some(&root), "anything_at_all"));
    }

    #[test]
    fn other_roles_use_set_membership() {
        let editor = user(Role::Editor, &[EDIT_CONTENT]);
        assert!(check_permission(Some(&editor), EDIT_CONTENT));
        assert!(!check_permission(Some(&editor), "delete_user"));

        // Admin is not super admin
        let admin = user(Role::Admin, &[MANAGE_USERS]);
        assert!(!check_permission(Some(&admin), MANAGE_SETTINGS));
        assert!(matches!(
            require_permission(Some(&admin), MANAGE_SETTINGS),
            Err(SessionError::PermissionDenied { .. })
        ));
        assert!(require_permission(Some(&admin), MANAGE_USERS).is_ok());
    }
}
