use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Notification {
    pub id: RecordId,
    pub notification: String,
    pub user_id: RecordId,
    pub agency_id: RecordId,
    pub subaccount_id: Option<RecordId>,
    pub created_at: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateNotification {
    pub notification: String,
    pub user_id: RecordId,
    pub agency_id: RecordId,
    pub subaccount_id: Option<RecordId>,
    pub created_at: String,
}
