use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    consts::db_const::AGENCY_TABLE,
    errors::{Error, Result},
    models::{
        agency::{Agency, AgencyDetails},
        notification::Notification,
        permission::{Permission, PermissionChecker},
        principal::Principal,
        role::Role,
    },
    state::AppState,
    store::{ActivitySink, UserStore},
    utils::{
        get_record_id::{get_record_id_from_string, record_id_to_string, record_key},
        permission_context::create_context,
        validated_form::ValidatedJson,
    },
};

fn default_goal() -> u32 {
    5
}

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct UpsertAgencyRequest {
    /// Present when updating an existing agency.
    pub id: Option<String>,
    #[validate(length(min = 2, max = 255))]
    pub name: String,
    #[validate(email)]
    pub company_email: String,
    #[validate(length(min = 1))]
    pub company_phone: String,
    #[serde(default)]
    pub white_label: bool,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub zip_code: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(min = 1))]
    pub country: String,
    #[serde(default)]
    pub agency_logo: String,
    #[serde(default = "default_goal")]
    #[validate(range(min = 1))]
    pub goal: u32,
}

impl UpsertAgencyRequest {
    fn into_parts(self) -> (Option<String>, AgencyDetails) {
        let details = AgencyDetails {
            name: self.name,
            company_email: self.company_email,
            company_phone: self.company_phone,
            white_label: self.white_label,
            address: self.address,
            city: self.city,
            zip_code: self.zip_code,
            state: self.state,
            country: self.country,
            agency_logo: self.agency_logo,
            goal: self.goal,
        };
        (self.id, details)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AgencyResponse {
    pub id: String,
    #[serde(flatten)]
    pub details: AgencyDetails,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Agency> for AgencyResponse {
    fn from(agency: Agency) -> Self {
        Self {
            id: record_id_to_string(&agency.id),
            details: AgencyDetails {
                name: agency.name,
                company_email: agency.company_email,
                company_phone: agency.company_phone,
                white_label: agency.white_label,
                address: agency.address,
                city: agency.city,
                zip_code: agency.zip_code,
                state: agency.state,
                country: agency.country,
                agency_logo: agency.agency_logo,
                goal: agency.goal,
            },
            created_at: agency.created_at,
            updated_at: agency.updated_at,
        }
    }
}

/// Registers a new agency owned by the caller, or updates the caller's agency
/// when the body carries its id.
pub async fn upsert_agency(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ValidatedJson(input): ValidatedJson<UpsertAgencyRequest>,
) -> Result<(StatusCode, Json<AgencyResponse>)> {
    let (id, details) = input.into_parts();

    let (status, agency) = match id {
        Some(id) => {
            let agency_id = get_record_id_from_string(AGENCY_TABLE, &id)?;
            let ctx = create_context(&state.store, &principal, &Permission::AgencyUpdate).await?;
            ctx.validate_agency_access(&agency_id, &Permission::AgencyUpdate)?;

            let agency = state
                .store
                .upsert_agency(&record_key(&agency_id), details)
                .await?;
            log_activity(&state, &principal, &agency, "Updated the agency information").await;
            (StatusCode::OK, agency)
        }
        None => {
            let email = principal.email.trim();
            if details.company_email != email {
                return Err(Error::AccessDenied(Permission::AgencyUpdate));
            }
            match state.store.find_by_email(email).await? {
                Some(user) if user.agency_id.is_some() => {
                    return Err(Error::AccessDenied(Permission::AgencyUpdate));
                }
                Some(_) => {}
                None => {
                    state.membership.init_user(&principal, None).await?;
                }
            }

            // the owner role is granted inside the agency transaction
            let agency_key = format!("ag_{}", Uuid::new_v4().simple());
            let agency = state.store.upsert_agency(&agency_key, details).await?;
            info!("{} registered agency {}", email, agency_key);
            state
                .membership
                .sync_role(&principal, Some(Role::AgencyOwner))
                .await;
            log_activity(&state, &principal, &agency, "Created the agency").await;
            (StatusCode::CREATED, agency)
        }
    };

    Ok((status, Json(agency.into())))
}

async fn log_activity(state: &AppState, principal: &Principal, agency: &Agency, description: &str) {
    if let Err(err) = state
        .store
        .record(Some(principal), Some(&agency.id), None, description)
        .await
    {
        warn!("activity `{}` not recorded: {}", description, err);
    }
}

/// Removes the agency and everything it owns. Owner only.
pub async fn delete_agency(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(agency_id): Path<String>,
) -> Result<StatusCode> {
    let agency_id = get_record_id_from_string(AGENCY_TABLE, &agency_id)?;
    let ctx = create_context(&state.store, &principal, &Permission::AgencyDelete).await?;
    ctx.validate_agency_access(&agency_id, &Permission::AgencyDelete)?;

    state.store.delete_agency(&agency_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NotificationResponse {
    pub id: String,
    pub notification: String,
    pub user_id: String,
    pub subaccount_id: Option<String>,
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: record_id_to_string(&notification.id),
            notification: notification.notification,
            user_id: record_id_to_string(&notification.user_id),
            subaccount_id: notification.subaccount_id.as_ref().map(record_id_to_string),
            created_at: notification.created_at,
        }
    }
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(agency_id): Path<String>,
) -> Result<(StatusCode, Json<Vec<NotificationResponse>>)> {
    let agency_id = get_record_id_from_string(AGENCY_TABLE, &agency_id)?;
    let ctx = create_context(&state.store, &principal, &Permission::NotificationsRead).await?;
    ctx.validate_agency_access(&agency_id, &Permission::NotificationsRead)?;

    let notifications = state.store.notifications_for_agency(&agency_id).await?;
    Ok((
        StatusCode::OK,
        Json(notifications.into_iter().map(Into::into).collect()),
    ))
}
