use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::{
    config::IdentityConfig,
    consts::identity_const::METADATA_PATH,
    errors::{Error, Result},
    identity::IdentityProvider,
    models::role::Role,
};

/// Backend API client of the hosted identity provider.
#[derive(Debug, Clone)]
pub struct IdentityAdminClient {
    url: String,
    secret_key: String,
    http_client: Client,
}

impl IdentityAdminClient {
    pub fn new(url: &str, secret_key: &str, http_client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
            http_client,
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(&config.api_url, &config.secret_key, Client::new())
    }
}

#[async_trait]
impl IdentityProvider for IdentityAdminClient {
    async fn write_role(&self, principal_id: &str, role: Role) -> Result<()> {
        let url = format!("{}{}/{}/metadata", self.url, METADATA_PATH, principal_id);
        let metadata_error = |reason: String| Error::ExternalMetadataWrite {
            principal_id: principal_id.to_string(),
            reason,
        };

        let response = self
            .http_client
            .patch(&url)
            .bearer_auth(&self.secret_key)
            .json(&json!({ "private_metadata": { "role": role } }))
            .send()
            .await
            .map_err(|e| metadata_error(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(metadata_error(format!("{}: {}", status, error_text)));
        }

        debug!("role {} written for {}", role, principal_id);
        Ok(())
    }
}
