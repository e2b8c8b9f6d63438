use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::service::TokenService;

const BEARER_PREFIX: &str = "Bearer ";

/// Caller identity established from `Authorization: Bearer <token>`.
///
/// Only produced for tokens that pass [`TokenService::verify`] and name a non-empty `sub`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
    pub token: String,
}

impl AuthContext {
    pub fn subject(&self) -> &str {
        self.claims.subject().unwrap_or_default()
    }

    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = Arc::<TokenService>::from_ref(state).verify(token)?;

        match claims.subject() {
            Some(sub) if !sub.is_empty() => Ok(Self {
                token: token.to_owned(),
                claims,
            }),
            _ => Err(AuthError::InvalidAuthorization),
        }
    }
}

/// Borrow the compact token out of the request's `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> AuthResult<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorization)?;
    let credentials = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?
        .trim();

    match credentials.strip_prefix(BEARER_PREFIX).map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidAuthorization),
    }
}
