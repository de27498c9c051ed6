use agency_auth::{app, config::AppConfig, errors::Result, state::AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.filter.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let address = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::init(config).await?;

    info!("Starting server");

    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Serving membership API at http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;

    Ok(())
}
