use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
    config::IdentityConfig,
    errors::Result,
    identity::IdentityProvider,
    models::{principal::Principal, role::Role},
};

/// Write-through cache maintenance for the role stored in the principal's
/// session metadata. The local user record stays authoritative; this never
/// reads back from the provider.
#[derive(Clone)]
pub struct RoleSynchronizer {
    provider: Arc<dyn IdentityProvider>,
    attempts: u32,
    backoff: Duration,
}

impl std::fmt::Debug for RoleSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleSynchronizer")
            .field("attempts", &self.attempts)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl RoleSynchronizer {
    pub fn new(provider: Arc<dyn IdentityProvider>, attempts: u32, backoff: Duration) -> Self {
        Self {
            provider,
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(provider: Arc<dyn IdentityProvider>, config: &IdentityConfig) -> Self {
        Self::new(
            provider,
            config.metadata_write_attempts,
            Duration::from_millis(config.metadata_retry_backoff_ms),
        )
    }

    /// Writes `role` (or the default role) unless the session already
    /// carries it. Returns whether a write happened.
    pub async fn sync(&self, principal: &Principal, role: Option<Role>) -> Result<bool> {
        let role = role.unwrap_or_default();
        if principal.metadata.role == Some(role) {
            debug!("session metadata of {} already holds {}", principal.id, role);
            return Ok(false);
        }
        self.write(&principal.id, role).await?;
        Ok(true)
    }

    /// Unconditional write, retried with linear backoff.
    pub async fn write(&self, principal_id: &str, role: Role) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.provider.write_role(principal_id, role).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.attempts => {
                    warn!(
                        "metadata write for {} failed (attempt {}/{}): {}",
                        principal_id, attempt, self.attempts, err
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
