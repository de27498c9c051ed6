use async_trait::async_trait;

use crate::errors::Result;
use crate::models::role::Role;

pub mod client;

/// Write side of the identity provider's session metadata.
///
/// Writes are full overwrites of the `role` key, so repeating one is safe.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn write_role(&self, principal_id: &str, role: Role) -> Result<()>;
}
