use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::VerifyError;

pub const TOKEN_TYPE: &str = "JWT";
pub const ALGORITHM: &str = "HS256";

/// JOSE header. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub typ: String,
    pub alg: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            typ: TOKEN_TYPE.to_string(),
            alg: ALGORITHM.to_string(),
        }
    }
}

/// Registered claims written by issuance, in wire order.
#[derive(Debug, Serialize)]
pub(crate) struct IssuedClaims<'a> {
    pub iss: &'a str,
    pub sub: &'a str,
    pub aud: [&'a str; 1],
    pub exp: i64,
    pub nbf: i64,
    pub iat: i64,
    pub jti: &'a str,
}

/// Claims recovered from a verified token.
#[derive(Debug, Clone, Serialize)]
pub struct Claims {
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub audience: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub not_before: Option<DateTime<Utc>>,
    pub issued_at: Option<DateTime<Utc>>,
    pub token_id: Option<String>,
    /// The full payload object, including any unregistered claims.
    pub raw: Value,
}

impl Claims {
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.raw.get(claim)
    }

    /// Build from a payload object whose `exp` (and `nbf`, if any) already parsed.
    pub(crate) fn from_payload(
        payload: Map<String, Value>,
        exp: i64,
        nbf: Option<i64>,
    ) -> Self {
        let string_claim = |name: &str| {
            payload
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
        };
        let subject = string_claim("sub");
        let issuer = string_claim("iss");
        let token_id = string_claim("jti");

        let audience = match payload.get("aud") {
            Some(Value::String(item)) => vec![item.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect(),
            _ => Vec::new(),
        };

        let issued_at = payload
            .get("iat")
            .and_then(|value| timestamp_value(value, Rounding::Floor))
            .and_then(to_datetime);

        Self {
            subject,
            issuer,
            audience,
            expires_at: to_datetime(exp).unwrap_or(DateTime::<Utc>::MAX_UTC),
            not_before: nbf.and_then(to_datetime),
            issued_at,
            token_id,
            raw: Value::Object(payload),
        }
    }
}

/// Direction in which a fractional NumericDate is snapped to whole seconds.
///
/// Clock readings are whole seconds, so `now > exp` holds exactly when `now > floor(exp)`
/// and `now < nbf` holds exactly when `now < ceil(nbf)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rounding {
    Floor,
    Ceil,
}

/// Read a NumericDate claim. `Ok(None)` when absent; an error when present but not a number.
pub(crate) fn timestamp_claim(
    payload: &Map<String, Value>,
    name: &'static str,
    rounding: Rounding,
) -> Result<Option<i64>, VerifyError> {
    match payload.get(name) {
        None => Ok(None),
        Some(value) => timestamp_value(value, rounding)
            .map(Some)
            .ok_or(VerifyError::MissingClaim(name)),
    }
}

fn timestamp_value(value: &Value, rounding: Rounding) -> Option<i64> {
    if let Some(seconds) = value.as_i64() {
        return Some(seconds);
    }
    let seconds = value.as_f64().filter(|seconds| seconds.is_finite())?;
    let whole = match rounding {
        Rounding::Floor => seconds.floor(),
        Rounding::Ceil => seconds.ceil(),
    };
    Some(whole as i64)
}

fn to_datetime(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}
