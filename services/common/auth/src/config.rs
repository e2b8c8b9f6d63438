use std::env;
use std::fmt;

use zeroize::Zeroizing;

use crate::error::ConfigError;

pub const MIN_SECRET_LENGTH: usize = 32;
pub const DEFAULT_ISSUER: &str = "pseduca-backend";
pub const DEFAULT_AUDIENCE: &str = "pseduca-frontend";
/// Three hours.
pub const DEFAULT_TTL_SECONDS: i64 = 3 * 60 * 60;
/// Upper bound accepted for `JWT_TTL_SECONDS`: one year.
pub const MAX_TTL_SECONDS: i64 = 366 * 24 * 60 * 60;

/// HMAC key material, fixed for the lifetime of the process.
#[derive(Clone)]
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let bytes = Zeroizing::new(bytes.into());
        if bytes.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if bytes.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::SecretTooShort {
                min: MIN_SECRET_LENGTH,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    /// Read `JWT_SECRET`; its raw UTF-8 bytes are the key.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = lookup("JWT_SECRET").ok_or(ConfigError::MissingSecret)?;
        Self::new(value.into_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSecret")
            .field("bytes", &"***redacted***")
            .finish()
    }
}

/// Claim values stamped onto every issued token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    /// Issuer claim (iss).
    pub issuer: String,
    /// Sole entry of the audience claim (aud).
    pub audience: String,
    /// Seconds between iat and exp.
    pub ttl_seconds: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl TokenConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Overlay `JWT_ISSUER`, `JWT_AUDIENCE` and `JWT_TTL_SECONDS` onto the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(issuer) = lookup("JWT_ISSUER").and_then(|v| normalize_optional(&v)) {
            config.issuer = issuer;
        }
        if let Some(audience) = lookup("JWT_AUDIENCE").and_then(|v| normalize_optional(&v)) {
            config.audience = audience;
        }
        if let Some(raw) = lookup("JWT_TTL_SECONDS").and_then(|v| normalize_optional(&v)) {
            config.ttl_seconds = match raw.parse::<i64>() {
                Ok(ttl) if (1..=MAX_TTL_SECONDS).contains(&ttl) => ttl,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "JWT_TTL_SECONDS",
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
