use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::models::{
    agency::AgencyNavigation, invitation::Invitation, permission::Permission,
    principal::Principal, role::Role,
};
use crate::utils::time::time_now;

/// Durable local copy of a principal. The record key equals the identity
/// provider's user id, `email` is unique (index `users_email_unique`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub avatar_url: String,
    pub email: String, // ! unique
    pub role: Role,
    pub agency_id: Option<RecordId>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub avatar_url: String,
    pub email: String,
    pub role: Role,
    pub agency_id: Option<RecordId>,
    pub created_at: String,
    pub updated_at: String,
}

impl CreateUser {
    /// Record for a principal accepting `invitation`: email, agency and role
    /// come from the invitation, name and avatar from the session.
    pub fn from_invitation(invitation: &Invitation, principal: &Principal) -> Self {
        let now = time_now();
        Self {
            name: principal.display_name(),
            avatar_url: principal.image_url.clone().unwrap_or_default(),
            email: invitation.email.clone(),
            role: invitation.role,
            agency_id: Some(invitation.agency_id.clone()),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Record for a principal signing up without an invitation.
    pub fn from_principal(principal: &Principal, role: Role) -> Self {
        let now = time_now();
        Self {
            name: principal.display_name(),
            avatar_url: principal.image_url.clone().unwrap_or_default(),
            email: principal.email.trim().to_string(),
            role,
            agency_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// A user with everything the dashboard needs to route and render them.
#[derive(Debug, Clone)]
pub struct UserDetails {
    pub user: User,
    pub agency: Option<AgencyNavigation>,
    pub permissions: Vec<Permission>,
}

impl UserDetails {
    pub fn new(user: User, agency: Option<AgencyNavigation>) -> Self {
        let mut permissions: Vec<Permission> = user.role.permissions().into_iter().collect();
        permissions.sort();
        Self {
            user,
            agency,
            permissions,
        }
    }
}
