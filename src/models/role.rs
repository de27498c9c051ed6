use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::permission::Permission;

/// Membership role of a user inside an agency.
///
/// Stored verbatim in the `users` and `invitations` tables and mirrored into
/// the identity provider's private session metadata.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    AgencyOwner,
    AgencyAdmin,
    #[default]
    SubaccountUser,
    SubaccountGuest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::AgencyOwner => "AGENCY_OWNER",
            Role::AgencyAdmin => "AGENCY_ADMIN",
            Role::SubaccountUser => "SUBACCOUNT_USER",
            Role::SubaccountGuest => "SUBACCOUNT_GUEST",
        }
    }

    pub fn permissions(&self) -> HashSet<Permission> {
        use Permission::*;

        let granted: &[Permission] = match self {
            Role::AgencyOwner => &[All],
            Role::AgencyAdmin => &[
                AgencyRead,
                AgencyUpdate,
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
            ],
            Role::SubaccountUser => &[
                AgencyRead,
                SubaccountsRead,
                SubaccountsUpdate,
                MembersRead,
                NotificationsRead,
            ],
            Role::SubaccountGuest => &[SubaccountsRead],
        };
        granted.iter().cloned().collect()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
