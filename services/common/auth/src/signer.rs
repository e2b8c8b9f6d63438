use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::SigningSecret;
use crate::error::ConfigError;

type HmacSha256 = Hmac<Sha256>;

pub const MAC_LENGTH: usize = 32;

/// HMAC-SHA256 keyed once with the process signing secret.
#[derive(Clone)]
pub struct Signer {
    keyed: HmacSha256,
}

impl Signer {
    pub fn new(secret: &SigningSecret) -> Result<Self, ConfigError> {
        let keyed = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
            .map_err(|_| ConfigError::InvalidSigningKey)?;
        Ok(Self { keyed })
    }

    pub fn sign(&self, message: &[u8]) -> [u8; MAC_LENGTH] {
        let mut mac = self.keyed.clone();
        mac.update(message);
        let digest = mac.finalize().into_bytes();
        let mut out = [0u8; MAC_LENGTH];
        out.copy_from_slice(&digest);
        out
    }

    /// Constant-time check of `candidate` against the MAC of `message`.
    /// A length mismatch is reported as unequal without inspecting contents.
    pub fn verify(&self, message: &[u8], candidate: &[u8]) -> bool {
        let expected = self.sign(message);
        expected.as_slice().ct_eq(candidate).into()
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").field("alg", &"HS256").finish()
    }
}
