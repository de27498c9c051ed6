use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::{
    middleware::session_middleware,
    routes::{
        agency::{delete_agency, list_notifications, upsert_agency},
        membership::{init_user, resolve_membership, user_details},
    },
    state::AppState,
};

pub mod agency;
pub mod membership;

pub fn api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/membership", get(resolve_membership))
        .route("/users/init", post(init_user))
        .route("/users/me", get(user_details))
        .route("/agencies", put(upsert_agency))
        .route("/agencies/{agency_id}", delete(delete_agency))
        .route("/agencies/{agency_id}/notifications", get(list_notifications))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .with_state(state)
}
