use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::consts::identity_const::SESSION_HEADER_SCHEME;
use crate::errors::{Error, Result as RResult};
use crate::models::principal::Principal;
use crate::state::AppState;
use crate::utils::jwt::decode_session;

/// Authenticates the identity provider's session token and stores the
/// resulting [`Principal`] in the request extensions.
pub async fn session_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, Response> {
    let request = authenticate_request(&state, request)?;

    Ok(next.run(request).await)
}

fn authenticate_request(state: &AppState, request: Request) -> Result<Request, Response> {
    let (mut parts, body) = request.into_parts();
    let principal = check_auth_parts(state, &parts).map_err(IntoResponse::into_response)?;

    parts.extensions.insert(principal);

    Ok(Request::from_parts(parts, body))
}

fn check_auth_parts(state: &AppState, parts: &Parts) -> RResult<Principal> {
    let header_value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(Error::MissingToken)?
        .to_str()
        .map_err(|_| Error::InvalidToken)?;

    let mut header_parts = header_value.trim().splitn(2, ' ');

    let scheme = header_parts.next().ok_or(Error::MissingToken)?;
    let token = header_parts.next().ok_or(Error::MissingToken)?;

    if scheme != SESSION_HEADER_SCHEME {
        tracing::warn!("Invalid auth scheme: {scheme}");
        return Err(Error::InvalidScheme);
    }

    let identity = &state.config.identity;
    decode_session(token.trim(), &identity.session_secret, identity.issuer.as_deref())
}
