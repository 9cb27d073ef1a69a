//! Request signers for the two phases of the OAuth flow.
//!
//! Bootstrap calls (request token, access token, live session token) are
//! signed with RSA-SHA256 and embed the raw base64 signature in the header.
//! Every call after the handshake is signed with HMAC-SHA256 keyed by the
//! live session token, and that signature is percent-encoded before it goes
//! into the header. The two conventions are deliberately kept as separate
//! functions; the server accepts exactly one form per step.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, Rng};
use rsa::pkcs1v15::SigningKey;
use rsa::sha2::Sha256;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use zeroize::Zeroize;

use crate::auth::base_string;
use crate::{Error, Result};

/// Length of the random nonce attached to every signed request.
const NONCE_LEN: usize = 16;

/// RSA-SHA256 signer for the bootstrap steps of the token exchange.
pub struct RsaSigner {
    key: RsaPrivateKey,
}

impl RsaSigner {
    /// Create a signer from the private signing key.
    pub fn new(key: RsaPrivateKey) -> Self {
        Self { key }
    }

    /// Sign a base string with PKCS#1 v1.5 padding and a SHA-256 digest.
    ///
    /// Returns the raw base64 signature. No URL-encoding is applied at this
    /// layer; the bootstrap header embeds this value as-is.
    pub fn sign(&self, base: &str) -> String {
        let signing_key = SigningKey::<Sha256>::new(self.key.clone());
        let signature = signing_key.sign(base.as_bytes());
        BASE64.encode(signature.to_bytes())
    }
}

impl std::fmt::Debug for RsaSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaSigner")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signer keyed by the live session token.
///
/// The token is stored and transmitted as base64 but the raw decoded bytes
/// are the HMAC key; using the base64 text directly would produce signatures
/// the server silently rejects.
pub struct HmacSigner {
    key: Vec<u8>,
}

impl HmacSigner {
    /// Create a signer from the base64-encoded live session token.
    pub fn from_live_session_token(lst_base64: &str) -> Result<Self> {
        let key = BASE64
            .decode(lst_base64)
            .map_err(|e| Error::Signature(format!("live session token is not base64: {e}")))?;
        Ok(Self { key })
    }

    /// Sign a base string; returns the raw base64 signature.
    ///
    /// Callers embedding the result in an `Authorization` header must pass it
    /// through [`header_encode`] first.
    pub fn sign(&self, base: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| Error::Signature(format!("invalid HMAC key: {e}")))?;
        mac.update(base.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

impl Drop for HmacSigner {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Percent-encode a base64 signature for embedding in a quoted header value.
///
/// Only the HMAC-signed session calls use this; the RSA bootstrap calls embed
/// their signature raw.
pub fn header_encode(signature: &str) -> String {
    base_string::percent_encode(signature)
}

/// Generate a fresh random nonce.
///
/// Drawn from the thread-local CSPRNG, never a counter, so two requests
/// sharing a timestamp still carry distinct nonces.
pub fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// Current Unix timestamp in seconds, as the decimal string OAuth expects.
pub fn timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4231 test case 2: key "Jefe", data "what do ya want for nothing?".
    // The key is supplied the way the client stores it, as base64.
    const JEFE_B64: &str = "SmVmZQ==";
    const JEFE_DATA: &str = "what do ya want for nothing?";
    const JEFE_HMAC_SHA256_B64: &str = "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=";

    #[test]
    fn test_hmac_signer_golden_vector() {
        let signer = HmacSigner::from_live_session_token(JEFE_B64).unwrap();
        assert_eq!(signer.sign(JEFE_DATA).unwrap(), JEFE_HMAC_SHA256_B64);
    }

    #[test]
    fn test_hmac_signer_deterministic() {
        let signer = HmacSigner::from_live_session_token(JEFE_B64).unwrap();
        assert_eq!(
            signer.sign("base string").unwrap(),
            signer.sign("base string").unwrap()
        );
        assert_ne!(
            signer.sign("base string").unwrap(),
            signer.sign("base string 2").unwrap()
        );
    }

    #[test]
    fn test_hmac_signer_rejects_invalid_base64() {
        assert!(HmacSigner::from_live_session_token("not base64!!!").is_err());
    }

    #[test]
    fn test_header_encode_escapes_base64_specials() {
        // '+', '/' and '=' all appear in base64 output and must be escaped
        // inside a quoted header value.
        assert_eq!(header_encode("a+b/c="), "a%2Bb%2Fc%3D");
    }

    #[test]
    fn test_nonce_shape_and_uniqueness() {
        let a = nonce();
        let b = nonce();
        assert_eq!(a.len(), NONCE_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_timestamp_is_decimal_seconds() {
        let ts: i64 = timestamp().parse().unwrap();
        // Well past 2020, well before the year 3000.
        assert!(ts > 1_577_836_800);
        assert!(ts < 32_503_680_000);
    }

    #[test]
    fn test_debug_redacts_key_material() {
        let signer = HmacSigner::from_live_session_token(JEFE_B64).unwrap();
        assert!(!format!("{:?}", signer).contains("Jefe"));
    }
}
