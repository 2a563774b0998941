//! System-integrity guards evaluated before mutating operations commit.
//!
//! Pure predicates: no I/O, no side effects. Callers gather the state
//! snapshot (e.g. the active-admin count) and the guards decide.

use crate::services::user_service::UserAdminError;

/// The mutating operation being guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedOp {
    Suspend,
    Activate,
    Delete,
    RoleChange,
    PasswordReset,
}

/// Rejects delete and role-change operations where the acting admin targets
/// their own account. Suspend/activate/password-reset on self are allowed
/// here; the authorization layer governs those.
pub fn check_self_action(
    actor: &str,
    target: &str,
    op: GuardedOp,
) -> Result<(), UserAdminError> {
    if actor == target && matches!(op, GuardedOp::Delete | GuardedOp::RoleChange) {
        return Err(UserAdminError::SelfModification);
    }
    Ok(())
}

/// Rejects deleting the last active, non-deleted admin.
///
/// `target_is_active_admin` describes the target at the time of the check;
/// `other_active_admins` is the count of active, non-deleted admins
/// excluding the target. Scoped to delete only: a role change away from
/// admin is deliberately not guarded.
pub fn check_last_admin(
    op: GuardedOp,
    target_is_active_admin: bool,
    other_active_admins: u64,
) -> Result<(), UserAdminError> {
    if op == GuardedOp::Delete && target_is_active_admin && other_active_admins == 0 {
        return Err(UserAdminError::LastAdmin);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_delete_rejected() {
        let err = check_self_action("user_a", "user_a", GuardedOp::Delete).unwrap_err();
        assert!(matches!(err, UserAdminError::SelfModification));
    }

    #[test]
    fn self_role_change_rejected() {
        let err = check_self_action("user_a", "user_a", GuardedOp::RoleChange).unwrap_err();
        assert!(matches!(err, UserAdminError::SelfModification));
    }

    #[test]
    fn self_suspend_allowed() {
        assert!(check_self_action("user_a", "user_a", GuardedOp::Suspend).is_ok());
        assert!(check_self_action("user_a", "user_a", GuardedOp::PasswordReset).is_ok());
    }

    #[test]
    fn delete_of_other_user_allowed() {
        assert!(check_self_action("user_a", "user_b", GuardedOp::Delete).is_ok());
    }

    #[test]
    fn last_admin_delete_rejected() {
        let err = check_last_admin(GuardedOp::Delete, true, 0).unwrap_err();
        assert!(matches!(err, UserAdminError::LastAdmin));
    }

    #[test]
    fn delete_admin_with_another_remaining_allowed() {
        assert!(check_last_admin(GuardedOp::Delete, true, 1).is_ok());
    }

    #[test]
    fn delete_non_admin_never_hits_last_admin() {
        assert!(check_last_admin(GuardedOp::Delete, false, 0).is_ok());
    }

    #[test]
    fn role_change_not_guarded_by_last_admin() {
        assert!(check_last_admin(GuardedOp::RoleChange, true, 0).is_ok());
    }
}
