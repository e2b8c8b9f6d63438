use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::VerifyError;

/// Encode bytes as unpadded Base64URL.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Strictly decode an unpadded Base64URL segment.
///
/// Rejects `+`, `/`, `=` and anything else outside `[A-Za-z0-9_-]`, impossible
/// lengths, and non-canonical trailing bits.
pub fn decode(segment: &str) -> Result<Vec<u8>, VerifyError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| VerifyError::InvalidEncoding)
}
