use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::errors::Result;

pub const CONFIG_PATH_ENV: &str = "AGENCY_CONFIG";
pub const ENV_PREFIX: &str = "AGENCY_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// `ws://host:port` for a server, `mem://` for the embedded engine.
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityConfig {
    /// Base URL of the identity provider's backend API.
    pub api_url: String,
    pub secret_key: String,
    /// HS256 secret the provider signs session tokens with.
    pub session_secret: String,
    pub issuer: Option<String>,
    pub metadata_write_attempts: u32,
    pub metadata_retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    pub filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3587,
            },
            database: DatabaseConfig {
                endpoint: "ws://localhost:8050".to_string(),
                namespace: "test".to_string(),
                database: "test".to_string(),
                username: Some("root".to_string()),
                password: Some("secret".to_string()),
            },
            identity: IdentityConfig {
                api_url: "https://api.clerk.com".to_string(),
                secret_key: String::new(),
                session_secret: String::new(),
                issuer: None,
                metadata_write_attempts: 3,
                metadata_retry_backoff_ms: 200,
            },
            log: LogConfig {
                filter: "info".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Defaults, then the YAML file named by `AGENCY_CONFIG` (or
    /// `config.yaml`), then `AGENCY_SECTION__KEY` environment variables.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.yaml".to_string());
        Self::figment(&path).extract().map_err(Into::into)
    }

    pub fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
