use axum::Router;

use crate::{routes::api_router, state::AppState};

pub mod config;
pub mod consts;
pub mod errors;
pub mod identity;
pub mod membership;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

#[cfg(test)]
mod testing;

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(api_router(state.clone()))
        .with_state(state)
}
