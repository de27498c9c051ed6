use surrealdb::{Surreal, engine::any::Any};
use tracing::info;

use crate::consts::db_const::{INVITATION_TABLE, USER_TABLE};
use crate::errors::Result;

/// Defines the indexes the membership workflow depends on. Idempotent.
pub async fn define_schema(sdb: &Surreal<Any>) -> Result<()> {
    let statements = format!(
        "DEFINE INDEX IF NOT EXISTS users_email_unique ON TABLE {USER_TABLE} FIELDS email UNIQUE;
         DEFINE INDEX IF NOT EXISTS invitations_email_unique ON TABLE {INVITATION_TABLE} FIELDS email UNIQUE;"
    );
    sdb.query(statements).await?.check()?;
    info!("schema ready");
    Ok(())
}
