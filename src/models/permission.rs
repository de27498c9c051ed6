use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::errors::{Error, Result};
use crate::models::{role::Role, user::User};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    AgencyRead,
    AgencyUpdate,
    AgencyDelete,

    BillingRead,

    SubaccountsCreate,
    SubaccountsRead,
    SubaccountsUpdate,
    SubaccountsDelete,

    MembersRead,
    MembersInvite,
    MembersUpdate,
    MembersRemove,

    NotificationsRead,

    All,
}

/// What a provisioned user may do inside the agency they belong to.
#[derive(Debug, Clone)]
pub struct PermissionContext {
    pub user: User,
    pub effective_permissions: HashSet<Permission>,
}

impl PermissionContext {
    pub fn for_user(user: User) -> Self {
        let effective_permissions = user.role.permissions();
        Self {
            user,
            effective_permissions,
        }
    }
}

pub trait PermissionChecker {
    fn has_permission(&self, permission: &Permission) -> bool;
    fn has_any_permission(&self, permissions: &[Permission]) -> bool;
    fn can_access_agency(&self, agency_id: &RecordId) -> bool;
    fn is_agency_owner(&self) -> bool;

    fn check_permission(&self, permission: &Permission) -> Result<()>;
    fn validate_agency_access(&self, agency_id: &RecordId, action: &Permission) -> Result<()>;
}

impl PermissionChecker for PermissionContext {
    fn has_permission(&self, permission: &Permission) -> bool {
        self.effective_permissions.contains(permission)
            || self.effective_permissions.contains(&Permission::All)
    }

    fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        if self.effective_permissions.contains(&Permission::All) {
            return true;
        }
        permissions
            .iter()
            .any(|p| self.effective_permissions.contains(p))
    }

    fn can_access_agency(&self, agency_id: &RecordId) -> bool {
        self.user.agency_id.as_ref() == Some(agency_id)
    }

    fn is_agency_owner(&self) -> bool {
        self.user.role == Role::AgencyOwner
    }

    fn check_permission(&self, permission: &Permission) -> Result<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(Error::AccessDenied(permission.clone()))
        }
    }

    fn validate_agency_access(&self, agency_id: &RecordId, action: &Permission) -> Result<()> {
        self.check_permission(action)?;
        if !self.can_access_agency(agency_id) {
            return Err(Error::AccessDenied(action.clone()));
        }
        Ok(())
    }
}
