use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Why a presented token was refused. Exactly one kind is reported per call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("token must have exactly three non-empty segments")]
    MalformedToken,
    #[error("token segment is not valid Base64URL")]
    InvalidEncoding,
    #[error("unsupported token algorithm")]
    UnsupportedAlgorithm,
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token missing required claim '{0}'")]
    MissingClaim(&'static str),
    #[error("token has expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
}

impl VerifyError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::MalformedToken => "malformed_token",
            VerifyError::InvalidEncoding => "invalid_encoding",
            VerifyError::UnsupportedAlgorithm => "unsupported_algorithm",
            VerifyError::InvalidSignature => "invalid_signature",
            VerifyError::MissingClaim(_) => "missing_claim",
            VerifyError::Expired => "expired",
            VerifyError::NotYetValid => "not_yet_valid",
        }
    }
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to serialize token part: {0}")]
    Serialize(String),
    #[error("expiry for issue time {issued_at} with ttl {ttl_seconds}s is out of range")]
    ExpiryOutOfRange { issued_at: i64, ttl_seconds: i64 },
}

impl From<serde_json::Error> for IssueError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value.to_string())
    }
}

/// Startup misconfiguration. Callers are expected to abort rather than recover.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET environment variable must be set")]
    MissingSecret,
    #[error("JWT_SECRET must be at least {min} bytes long (got {actual})")]
    SecretTooShort { min: usize, actual: usize },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("signing secret rejected as HMAC key")]
    InvalidSigningKey,
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Rejection produced while authenticating an HTTP request.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
    #[error("bearer token rejected: {0}")]
    Token(#[from] VerifyError),
}

impl AuthError {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingAuthorization => "missing_authorization",
            AuthError::InvalidAuthorization => "invalid_authorization",
            AuthError::Token(err) => err.kind(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Every failure looks the same to the client; the detail only goes to logs.
        warn!(reason = self.kind(), error = %self, "rejected bearer authentication");
        let body = ErrorBody {
            code: "UNAUTHENTICATED",
            message: "authentication required",
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}
