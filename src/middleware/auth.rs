//! Authentication middleware
//!
//! The identity provider is external: it issues the JWTs, manages accounts
//! and sessions. This extractor only verifies the token signature and
//! expiry, and surfaces `{ user_id, role }` to handlers.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Claims, UserRole};
use crate::workflow::Actor;

/// Verifies access tokens issued by the external identity provider
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Decode and verify a bearer token
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Authenticated user extracted from the bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// The workflow actor this user acts as
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }
}

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct AuthError {
    success: bool,
    message: String,
}

impl AuthError {
    fn new(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthError::new("Authorization header with Bearer token required")
                        .into_response()
                })?;

        let verifier = Arc::<JwtVerifier>::from_ref(state);

        let claims = verifier.verify(bearer.token()).map_err(|e| {
            let message = if e.to_string().contains("Expired") {
                "Token has expired"
            } else {
                "Invalid token"
            };
            AuthError::new(message).into_response()
        })?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::new("Invalid user ID in token").into_response())?;

        let role = match claims.role.as_str() {
            "client" => UserRole::Client,
            "transporteur" => UserRole::Transporteur,
            "admin" => UserRole::Admin,
            _ => return Err(AuthError::new("Invalid role in token").into_response()),
        };

        Ok(AuthenticatedUser { user_id, role })
    }
}
