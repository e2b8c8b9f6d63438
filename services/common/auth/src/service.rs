use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use serde_json::Value;
use tracing::debug;

use crate::claims::{timestamp_claim, Claims, Header, IssuedClaims, Rounding, ALGORITHM};
use crate::codec;
use crate::config::{SigningSecret, TokenConfig};
use crate::error::{ConfigError, IssueError, VerifyError};
use crate::signer::Signer;

const JTI_BYTES: usize = 16;

/// Issues and verifies HS256 compact tokens. Holds no mutable state; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TokenService {
    config: TokenConfig,
    signer: Signer,
}

impl TokenService {
    pub fn new(config: TokenConfig, secret: &SigningSecret) -> Result<Self, ConfigError> {
        Ok(Self {
            config,
            signer: Signer::new(secret)?,
        })
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn issue(&self, subject: &str) -> Result<String, IssueError> {
        self.issue_at(subject, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now` (seconds since epoch).
    pub fn issue_at(&self, subject: &str, now: i64) -> Result<String, IssueError> {
        let exp = now
            .checked_add(self.config.ttl_seconds)
            .ok_or(IssueError::ExpiryOutOfRange {
                issued_at: now,
                ttl_seconds: self.config.ttl_seconds,
            })?;
        let jti = generate_jti();
        let claims = IssuedClaims {
            iss: &self.config.issuer,
            sub: subject,
            aud: [self.config.audience.as_str()],
            exp,
            nbf: now,
            iat: now,
            jti: &jti,
        };

        let header = codec::encode(serde_json::to_vec(&Header::default())?);
        let payload = codec::encode(serde_json::to_vec(&claims)?);
        Ok(self.seal(&header, &payload))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify `token` against the clock reading `now` (seconds since epoch).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, VerifyError> {
        let mut parts = token.split('.');
        let (enc_header, enc_payload, enc_signature) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(p), Some(s), None)
                    if !h.is_empty() && !p.is_empty() && !s.is_empty() =>
                {
                    (h, p, s)
                }
                _ => return Err(VerifyError::MalformedToken),
            };

        let header = codec::decode(enc_header)?;
        let payload = codec::decode(enc_payload)?;
        let signature = codec::decode(enc_signature)?;

        let alg = serde_json::from_slice::<Value>(&header)
            .ok()
            .and_then(|value| value.get("alg").and_then(Value::as_str).map(str::to_owned));
        if alg.as_deref() != Some(ALGORITHM) {
            return Err(VerifyError::UnsupportedAlgorithm);
        }

        let signing_input = signing_input(enc_header, enc_payload);
        if !self.signer.verify(signing_input.as_bytes(), &signature) {
            return Err(VerifyError::InvalidSignature);
        }

        let payload = match serde_json::from_slice::<Value>(&payload) {
            Ok(Value::Object(map)) => map,
            _ => return Err(VerifyError::MissingClaim("exp")),
        };

        let exp = timestamp_claim(&payload, "exp", Rounding::Floor)?
            .ok_or(VerifyError::MissingClaim("exp"))?;
        if now > exp {
            return Err(VerifyError::Expired);
        }

        let nbf = timestamp_claim(&payload, "nbf", Rounding::Ceil)?;
        if nbf.is_some_and(|nbf| now < nbf) {
            return Err(VerifyError::NotYetValid);
        }

        let claims = Claims::from_payload(payload, exp, nbf);
        debug!(sub = claims.subject().unwrap_or_default(), "verified token");
        Ok(claims)
    }

    fn seal(&self, enc_header: &str, enc_payload: &str) -> String {
        let signing_input = signing_input(enc_header, enc_payload);
        let signature = codec::encode(self.signer.sign(signing_input.as_bytes()));
        format!("{signing_input}.{signature}")
    }
}

fn signing_input(enc_header: &str, enc_payload: &str) -> String {
    format!("{enc_header}.{enc_payload}")
}

fn generate_jti() -> String {
    let mut bytes = [0u8; JTI_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
