//! Capability checks backed by the users table.
//!
//! This is the permission collaborator the liquidation service queries.
//! Capabilities derive from the user's role; there is no per-user grant
//! table.

use sea_orm::{DatabaseConnection, EntityTrait};

use tala_core::liquidation::{Capability, LiquidationError, PermissionChecker};
use tala_shared::types::UserId;

use crate::entities::{sea_orm_active_enums::UserRole, users};

/// Role-based capability checker.
#[derive(Debug, Clone)]
pub struct CapabilityChecker {
    db: DatabaseConnection,
}

impl CapabilityChecker {
    /// Creates a new capability checker.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Which capabilities a role carries.
    #[must_use]
    pub fn role_grants(role: &UserRole, capability: Capability) -> bool {
        match role {
            UserRole::Employee => false,
            UserRole::Supervisor => {
                matches!(capability, Capability::ApproveLiquidationsLevel1)
            }
            UserRole::Manager => matches!(
                capability,
                Capability::ApproveLiquidationsLevel1 | Capability::ApproveLiquidationsLevel2
            ),
            UserRole::Admin => true,
        }
    }
}

impl PermissionChecker for CapabilityChecker {
    async fn has_capability(
        &self,
        user_id: UserId,
        capability: Capability,
    ) -> Result<bool, LiquidationError> {
        let user = users::Entity::find_by_id(user_id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| LiquidationError::repository(e.to_string()))?;

        Ok(user.is_some_and(|u| Self::role_grants(&u.role, capability)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_holds_nothing() {
        for capability in [
            Capability::ApproveLiquidationsLevel1,
            Capability::ApproveLiquidationsLevel2,
            Capability::ManageLiquidation,
        ] {
            assert!(!CapabilityChecker::role_grants(
                &UserRole::Employee,
                capability
            ));
        }
    }

    #[test]
    fn test_supervisor_is_level1_only() {
        assert!(CapabilityChecker::role_grants(
            &UserRole::Supervisor,
            Capability::ApproveLiquidationsLevel1
        ));
        assert!(!CapabilityChecker::role_grants(
            &UserRole::Supervisor,
            Capability::ApproveLiquidationsLevel2
        ));
        assert!(!CapabilityChecker::role_grants(
            &UserRole::Supervisor,
            Capability::ManageLiquidation
        ));
    }

    #[test]
    fn test_manager_holds_both_approval_levels() {
        assert!(CapabilityChecker::role_grants(
            &UserRole::Manager,
            Capability::ApproveLiquidationsLevel1
        ));
        assert!(CapabilityChecker::role_grants(
            &UserRole::Manager,
            Capability::ApproveLiquidationsLevel2
        ));
        assert!(!CapabilityChecker::role_grants(
            &UserRole::Manager,
            Capability::ManageLiquidation
        ));
    }

    #[test]
    fn test_admin_holds_everything() {
        for capability in [
            Capability::ApproveLiquidationsLevel1,
            Capability::ApproveLiquidationsLevel2,
            Capability::ManageLiquidation,
        ] {
            assert!(CapabilityChecker::role_grants(&UserRole::Admin, capability));
        }
    }
}
