use crate::errors::{Error, Result};
use crate::models::principal::{Principal, PrincipalMetadata};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Claims of the identity provider's session token.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub metadata: PrincipalMetadata,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
}

impl From<SessionClaims> for Principal {
    fn from(claims: SessionClaims) -> Self {
        Principal {
            id: claims.sub,
            email: claims.email,
            first_name: claims.first_name,
            last_name: claims.last_name,
            image_url: claims.image_url,
            metadata: claims.metadata,
        }
    }
}

pub fn encode_session(claims: &SessionClaims, secret: &str) -> Result<String> {
    let token = encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn decode_session(token: &str, secret: &str, issuer: Option<&str>) -> Result<Principal> {
    let mut validation = Validation::new(Algorithm::HS256);
    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
    }
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(Error::from_token_error)?;

    Ok(data.claims.into())
}
