use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{Error, Result},
    membership::Resolution,
    models::{
        agency::{AgencyNavigation, SidebarOption},
        permission::Permission,
        principal::Principal,
        role::Role,
        user::{User, UserDetails},
    },
    routes::agency::AgencyResponse,
    state::AppState,
    utils::get_record_id::record_id_to_string,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MembershipResponse {
    pub status: String,
    pub agency_id: Option<String>,
    pub role: Option<Role>,
}

impl From<&Resolution> for MembershipResponse {
    fn from(resolution: &Resolution) -> Self {
        Self {
            status: resolution.status().to_string(),
            agency_id: resolution.agency_id().map(record_id_to_string),
            role: resolution.role(),
        }
    }
}

/// Route-guard entry point, called on every authenticated page load.
pub async fn resolve_membership(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<(StatusCode, Json<MembershipResponse>)> {
    let resolution = state.membership.resolve(&principal).await?;
    Ok((StatusCode::OK, Json(MembershipResponse::from(&resolution))))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub agency_id: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: record_id_to_string(&user.id),
            email: user.email,
            name: user.name,
            role: user.role,
            agency_id: user.agency_id.as_ref().map(record_id_to_string),
        }
    }
}

/// Creates the principal's user record with the default role. Roles are only
/// raised through invitations or agency registration.
pub async fn init_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = state.membership.init_user(&principal, None).await?;
    Ok((StatusCode::OK, Json(user.into())))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SidebarOptionResponse {
    pub name: String,
    pub icon: String,
    pub link: String,
}

impl From<SidebarOption> for SidebarOptionResponse {
    fn from(option: SidebarOption) -> Self {
        Self {
            name: option.name,
            icon: option.icon,
            link: option.link,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubAccountResponse {
    pub id: String,
    pub name: String,
    pub sidebar_options: Vec<SidebarOptionResponse>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AgencyNavigationResponse {
    #[serde(flatten)]
    pub agency: AgencyResponse,
    pub sidebar_options: Vec<SidebarOptionResponse>,
    pub subaccounts: Vec<SubAccountResponse>,
}

impl From<AgencyNavigation> for AgencyNavigationResponse {
    fn from(navigation: AgencyNavigation) -> Self {
        Self {
            agency: navigation.agency.into(),
            sidebar_options: navigation.sidebar_options.into_iter().map(Into::into).collect(),
            subaccounts: navigation
                .subaccounts
                .into_iter()
                .map(|entry| SubAccountResponse {
                    id: record_id_to_string(&entry.subaccount.id),
                    name: entry.subaccount.name,
                    sidebar_options: entry.sidebar_options.into_iter().map(Into::into).collect(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserDetailsResponse {
    pub user: UserResponse,
    pub agency: Option<AgencyNavigationResponse>,
    pub permissions: Vec<Permission>,
}

impl From<UserDetails> for UserDetailsResponse {
    fn from(details: UserDetails) -> Self {
        Self {
            user: details.user.into(),
            agency: details.agency.map(Into::into),
            permissions: details.permissions,
        }
    }
}

/// The caller's user record with the navigation of their agency, used by the
/// dashboard to pick a landing page.
pub async fn user_details(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<(StatusCode, Json<UserDetailsResponse>)> {
    let details = state
        .store
        .user_details(principal.email.trim())
        .await?
        .ok_or(Error::NotFound)?;
    Ok((StatusCode::OK, Json(details.into())))
}
