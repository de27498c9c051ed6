use crate::errors::{Error, Result};
use crate::models::permission::{Permission, PermissionContext};
use crate::models::principal::Principal;
use crate::store::{SurrealStore, UserStore};

/// Permissions of the principal's own user record. A principal without a
/// record is denied `action`.
pub async fn create_context(
    store: &SurrealStore,
    principal: &Principal,
    action: &Permission,
) -> Result<PermissionContext> {
    let user = store
        .find_by_email(principal.email.trim())
        .await?
        .ok_or_else(|| Error::AccessDenied(action.clone()))?;
    Ok(PermissionContext::for_user(user))
}
