use axum::{http::StatusCode, response::IntoResponse};
use jsonwebtoken::errors::{Error as JWError, ErrorKind as JWErrorKind};
use surrealdb::Error as SError;

use thiserror::Error;
use tracing::error;

use crate::models::permission::Permission;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SurrealDb Error: {0}")]
    SurrealError(#[from] SError),

    #[error("Jason web token Error: {0}")]
    JwTError(#[from] JWError),

    #[error("Http Error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Config Error: {0}")]
    ConfigError(#[from] figment::Error),

    #[error("Io Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Validator Error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Json Rejection Error: {0}")]
    AxumJsonRejection(#[from] axum::extract::rejection::JsonRejection),

    // ! Membership workflow
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Principal `{0}` has no email address")]
    PrincipalWithoutEmail(String),

    #[error("Invitation for `{email}` references missing agency `{agency_id}`")]
    ReferentialError { email: String, agency_id: String },

    #[error("User with email `{0}` was provisioned by a concurrent request")]
    DuplicateProvisioning(String),

    #[error("Metadata write for principal `{principal_id}` failed: {reason}")]
    ExternalMetadataWrite {
        principal_id: String,
        reason: String,
    },

    #[error("Activity needs an agency or a sub-account")]
    MissingActivityScope,

    #[error("User with email `{0}` does not exists!")]
    EmailNotExist(String),

    #[error("Access denied, missing `{0:?}`")]
    AccessDenied(Permission),

    #[error("Invalid record id `{0}`")]
    InvalidRecordId(String),

    #[error("Not Found")]
    NotFound,

    // ! Auth
    #[error("Missing authorization token")]
    MissingToken,
    #[error("Invalid authorization token")]
    InvalidToken,
    #[error("Invalid authorization scheme")]
    InvalidScheme,
    #[error("Token expired")]
    TokenExpired,
}

impl Error {
    /// Session-token failures collapse to the two cases a client can act on.
    pub fn from_token_error(error: JWError) -> Self {
        match error.kind() {
            JWErrorKind::ExpiredSignature => Error::TokenExpired,
            _ => Error::InvalidToken,
        }
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Error".to_string(),
    )
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            Error::SurrealError(error) => {
                error!("Surreal Error:{:#?}", error);
                internal()
            }
            Error::JwTError(error) => {
                error!("JWT Error:{:#?}", error);
                internal()
            }
            Error::HttpError(error) => {
                error!("Http Error:{:#?}", error);
                internal()
            }
            Error::ConfigError(error) => {
                error!("Config Error:{:#?}", error);
                internal()
            }
            Error::IoError(error) => {
                error!("Io Error:{:#?}", error);
                internal()
            }
            Error::ValidationError(error) => {
                let message = format!("Input validation error: [{}]", error).replace('\n', ", ");
                error!("Validation Error:{:#?}", error);
                (StatusCode::BAD_REQUEST, message)
            }
            Error::AxumJsonRejection(error) => {
                error!("Axum Json Rejection Error:{:#?}", error);
                (StatusCode::BAD_REQUEST, error.to_string())
            }
            Error::NotAuthenticated => (StatusCode::UNAUTHORIZED, "Sign in required".to_string()),
            Error::PrincipalWithoutEmail(id) => {
                error!("Principal {} has no email", id);
                (StatusCode::UNAUTHORIZED, "Sign in required".to_string())
            }
            Error::ReferentialError { email, agency_id } => {
                error!(
                    %email,
                    %agency_id,
                    "invitation references a missing agency, left pending for cleanup"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not provision your account".to_string(),
                )
            }
            Error::DuplicateProvisioning(email) => {
                error!("Duplicate provisioning surfaced for {}", email);
                (
                    StatusCode::CONFLICT,
                    "Account is already being provisioned".to_string(),
                )
            }
            Error::ExternalMetadataWrite {
                principal_id,
                reason,
            } => {
                error!("Metadata write for {} failed: {}", principal_id, reason);
                (
                    StatusCode::BAD_GATEWAY,
                    "Identity provider unavailable".to_string(),
                )
            }
            Error::MissingActivityScope => {
                error!("Activity recorded without agency or sub-account");
                internal()
            }
            Error::EmailNotExist(email) => (
                StatusCode::BAD_REQUEST,
                format!("User with email {} does not exists!", email),
            ),
            Error::AccessDenied(permission) => (
                StatusCode::FORBIDDEN,
                format!("Access denied, missing {:?}", permission),
            ),
            Error::InvalidRecordId(id) => (StatusCode::BAD_REQUEST, format!("Invalid id {}", id)),
            Error::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            Error::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Missing authorization token".to_string(),
            ),
            Error::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization token".to_string(),
            ),
            Error::InvalidScheme => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization scheme".to_string(),
            ),
            Error::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired".to_string()),
        };
        (status, message).into_response()
    }
}
