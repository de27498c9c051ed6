use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::models::role::Role;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    Pending,
}

/// Pending grant of agency membership, keyed by email (index
/// `invitations_email_unique`). Consumed by deleting the row.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Invitation {
    pub id: RecordId,
    pub email: String,
    pub agency_id: RecordId,
    pub role: Role,
    pub status: InvitationStatus,
    pub created_at: String,
}
