use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use common_auth::{authorize, AuthContext, AuthError as BearerError, GuardError};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::directory::LoginCheck;
use crate::AppState;

pub(crate) const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code,
                message: message.into(),
            },
        }
    }

    fn missing_credentials() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "MISSING_CREDENTIALS",
            "Username and password are required.",
        )
    }

    fn invalid_credentials() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "Invalid credentials. Please try again.",
        )
    }

    fn not_activated() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "USER_NOT_ACTIVATED",
            "User is not activated.",
        )
    }

    fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub username: String,
    pub roles: Vec<String>,
    pub expires_at: String,
}

pub async fn login_user(
    State(state): State<AppState>,
    Json(login): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let LoginRequest { username, password } = login;
    let username = username.trim();

    if username.is_empty() || password.is_empty() {
        state.record_login_metric("missing_credentials");
        return Err(ApiError::missing_credentials());
    }

    match state.directory.check_login(username, &password) {
        LoginCheck::Accepted => {}
        LoginCheck::UnknownUser | LoginCheck::WrongPassword => {
            warn!(username, "Login rejected: invalid credentials");
            state.record_login_metric("invalid_credentials");
            return Err(ApiError::invalid_credentials());
        }
        LoginCheck::NotActivated => {
            warn!(username, "Login rejected: user not activated");
            state.record_login_metric("not_activated");
            return Err(ApiError::not_activated());
        }
    }

    let token = state.tokens.issue(username).map_err(|err| {
        error!(username, error = %err, "Failed to issue token");
        state.record_login_metric("error");
        ApiError::internal_error("Unable to issue token")
    })?;

    info!(username, "Login succeeded");
    state.record_login_metric("success");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.config().ttl_seconds,
    }))
}

pub async fn current_user(
    State(state): State<AppState>,
    auth: Result<AuthContext, BearerError>,
) -> Response {
    let auth = match authenticated(&state, auth) {
        Ok(auth) => auth,
        Err(rejection) => return rejection.into_response(),
    };

    match authorize(state.directory.as_ref(), &auth, &[]).await {
        Ok(roles) => Json(CurrentUserResponse {
            username: auth.subject().to_string(),
            roles,
            expires_at: format_timestamp(auth.claims.expires_at),
        })
        .into_response(),
        Err(err) => guard_rejection(&state, err),
    }
}

pub async fn admin_ping(
    State(state): State<AppState>,
    auth: Result<AuthContext, BearerError>,
) -> Response {
    let auth = match authenticated(&state, auth) {
        Ok(auth) => auth,
        Err(rejection) => return rejection.into_response(),
    };

    match authorize(state.directory.as_ref(), &auth, &[ROLE_ADMIN]).await {
        Ok(_) => Json(serde_json::json!({ "status": "ok" })).into_response(),
        Err(err) => guard_rejection(&state, err),
    }
}

fn authenticated(
    state: &AppState,
    auth: Result<AuthContext, BearerError>,
) -> Result<AuthContext, BearerError> {
    auth.inspect_err(|err| state.record_rejection_metric(err.kind()))
}

fn guard_rejection(state: &AppState, err: GuardError) -> Response {
    if matches!(err, GuardError::UnknownSubject) {
        state.record_rejection_metric("unknown_subject");
    }
    err.into_response()
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}
