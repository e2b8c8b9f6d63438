use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::AuthContext;

/// Source of truth for a subject's current roles.
///
/// Roles are resolved on every request instead of being carried in the token,
/// so role changes apply immediately even though tokens are not revocable.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// `None` when the subject is unknown.
    async fn roles_for(&self, subject: &str) -> Option<Vec<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    UnknownSubject,
    Forbidden { required: Vec<String> },
}

#[derive(Debug, Serialize)]
struct GuardBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            GuardError::UnknownSubject => (
                StatusCode::UNAUTHORIZED,
                GuardBody {
                    code: "UNAUTHENTICATED",
                    message: "authentication required".to_string(),
                },
            ),
            GuardError::Forbidden { required } => (
                StatusCode::FORBIDDEN,
                GuardBody {
                    code: "FORBIDDEN",
                    message: if required.is_empty() {
                        "Insufficient role".to_string()
                    } else {
                        format!(
                            "Insufficient role. Required one of: {}",
                            required.join(", ")
                        )
                    },
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

pub fn ensure_role(roles: &[String], allowed: &[&str]) -> Result<(), GuardError> {
    if allowed.is_empty() {
        return Ok(());
    }

    let has_role = roles
        .iter()
        .any(|role| allowed.iter().any(|required| role == required));

    if has_role {
        Ok(())
    } else {
        Err(GuardError::Forbidden {
            required: allowed.iter().map(|value| value.to_string()).collect(),
        })
    }
}

/// Resolve the caller's roles and require one of `allowed`.
pub async fn authorize<D>(
    directory: &D,
    auth: &AuthContext,
    allowed: &[&str],
) -> Result<Vec<String>, GuardError>
where
    D: RoleDirectory + ?Sized,
{
    let roles = match directory.roles_for(auth.subject()).await {
        Some(roles) => roles,
        None => {
            warn!(sub = auth.subject(), "verified token names unknown subject");
            return Err(GuardError::UnknownSubject);
        }
    };
    ensure_role(&roles, allowed)?;
    Ok(roles)
}
