use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::{HeaderValue, AUTHORIZATION};
use actix_web::web::Data;
use actix_web::{FromRequest, HttpRequest};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;

use crate::error::ApiError;

/// Decoded token payload
pub type Claims = serde_json::Map<String, Value>;

pub const ROLE_CLAIM: &str = "role";
/// The only role allowed to use the books api
pub const ADMIN_ROLE: &str = "admin";

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Authorization header missing")]
    MissingCredentials,

    #[error("Authorization header is not a bearer credential")]
    MalformedHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Token has no role claim")]
    MissingRole,

    #[error("Role {0} is not allowed")]
    InsufficientRole(String),

    #[error("Signing secret must not be empty")]
    EmptySecret,

    #[error("Algorithm {0:?} is not a shared secret algorithm")]
    UnsupportedAlgorithm(Algorithm),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InsufficientRole(_) => ApiError::Authorization,
            _ => ApiError::Authentication,
        }
    }
}

/// Verifies signature and expiry of bearer tokens signed with a shared secret
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(secret: &str, algorithm: Algorithm) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::EmptySecret);
        }
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::UnsupportedAlgorithm(algorithm));
        }

        let mut validation = Validation::new(algorithm);
        // exp is verified only when the token carries it
        validation.required_spec_claims.clear();
        validation.leeway = 0;
        validation.validate_aud = false;

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

/// Extracts the credential from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;
    let (scheme, token) = header
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?
        .split_once(' ')
        .ok_or(AuthError::MalformedHeader)?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

/// Lets the claims through only if the role claim is the admin role
pub fn authorize(claims: Claims) -> Result<Claims, AuthError> {
    match claims.get(ROLE_CLAIM) {
        None | Some(Value::Null) => Err(AuthError::MissingRole),
        Some(Value::String(role)) if role == ADMIN_ROLE => Ok(claims),
        Some(Value::String(role)) => Err(AuthError::InsufficientRole(role.clone())),
        Some(other) => Err(AuthError::InsufficientRole(other.to_string())),
    }
}

/// Claims of a request that passed both the token check and the admin gate
#[derive(Debug)]
pub struct AdminClaims(pub Claims);

impl AdminClaims {
    fn from_http_request(req: &HttpRequest) -> Result<Self, ApiError> {
        let validator = req.app_data::<Data<TokenValidator>>().ok_or_else(|| {
            tracing::error!("Token validator is not registered in app data");
            ApiError::Internal
        })?;

        bearer_token(req.headers().get(AUTHORIZATION))
            .and_then(|token| validator.validate(token))
            .and_then(authorize)
            .map(AdminClaims)
            .map_err(|err| {
                tracing::warn!("Rejected request to {}: {}", req.path(), err);
                ApiError::from(err)
            })
    }
}

impl FromRequest for AdminClaims {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http_request(req))
    }
}

impl paperclip::v2::schema::Apiv2Schema for AdminClaims {}

impl paperclip::actix::OperationModifier for AdminClaims {}
