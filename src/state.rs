use std::sync::Arc;

use surrealdb::{
    Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
};
use tracing::info;

use crate::{
    config::{AppConfig, DatabaseConfig},
    errors::Result,
    identity::{IdentityProvider, client::IdentityAdminClient},
    membership::{MembershipService, RoleSynchronizer},
    store::{SurrealStore, schema::define_schema},
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: SurrealStore,
    pub membership: Arc<MembershipService<SurrealStore>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> Result<Self> {
        let sdb = connect_database(&config.database).await?;
        let provider = Arc::new(IdentityAdminClient::from_config(&config.identity));
        Self::with_parts(sdb, provider, config).await
    }

    /// Wires the state around an already connected database and identity
    /// provider.
    pub async fn with_parts(
        sdb: Surreal<Any>,
        provider: Arc<dyn IdentityProvider>,
        config: AppConfig,
    ) -> Result<Self> {
        define_schema(&sdb).await?;
        let store = SurrealStore::new(sdb);
        let synchronizer = RoleSynchronizer::from_config(provider, &config.identity);
        Ok(Self {
            membership: Arc::new(MembershipService::new(store.clone(), synchronizer)),
            store,
            config: Arc::new(config),
        })
    }
}

async fn connect_database(config: &DatabaseConfig) -> Result<Surreal<Any>> {
    let sdb = connect(config.endpoint.as_str()).await?;
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        sdb.signin(Root {
            username: username.as_str(),
            password: password.as_str(),
        })
        .await?;
    }
    sdb.use_ns(config.namespace.as_str())
        .use_db(config.database.as_str())
        .await?;
    info!("connected to {}", config.endpoint);
    Ok(sdb)
}
