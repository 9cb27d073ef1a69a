//! Diffie-Hellman key agreement and live session token derivation.
//!
//! The live session token is the only long-lived secret of an authenticated
//! session. It is derived from the DH shared secret and the encrypted access
//! token secret, never transmitted, and must match the server's own
//! derivation byte for byte. The one subtlety is the sign convention: the
//! server's big-integer library treats the shared secret as a signed
//! two's-complement value, so a shared secret whose top bit is set gets a
//! leading zero byte before keying the HMAC. Omitting that byte produces a
//! token the server silently rejects on first use.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use rand::RngCore;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use sha1::Sha1;
use zeroize::Zeroizing;

use crate::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// DH domain parameters: the prime modulus and the generator.
#[derive(Debug, Clone)]
pub struct DhParams {
    /// Prime modulus `p`
    pub prime: BigUint,
    /// Generator `g`, typically 2
    pub generator: BigUint,
}

impl DhParams {
    /// Parse parameters from a hexadecimal prime string.
    pub fn from_hex(prime_hex: &str, generator: u32) -> Result<Self> {
        let cleaned: String = prime_hex
            .lines()
            .map(|l| l.split('#').next().unwrap_or(""))
            .collect::<String>()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let prime = BigUint::parse_bytes(cleaned.as_bytes(), 16)
            .ok_or_else(|| Error::Config("DH prime is not valid hexadecimal".to_string()))?;
        let generator = BigUint::from(generator);

        if prime <= generator {
            return Err(Error::Config(
                "DH prime must be larger than the generator".to_string(),
            ));
        }
        Ok(Self { prime, generator })
    }

    /// Load parameters from a file containing the prime in hexadecimal.
    ///
    /// Whitespace and `#` comments are ignored.
    pub fn from_file(path: &std::path::Path, generator: u32) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read DH parameter file {}: {e}", path.display()))
        })?;
        Self::from_hex(&text, generator)
    }
}

/// One side of a DH exchange: the ephemeral private exponent and the public
/// challenge derived from it.
///
/// Scoped to a single live-session-token derivation; the private exponent is
/// never persisted and the whole value is dropped once the shared secret is
/// computed.
pub struct DhChallenge {
    private_exponent: BigUint,
    challenge_hex: String,
}

impl DhChallenge {
    /// Generate a uniformly random 256-bit exponent and compute the public
    /// challenge `A = g^a mod p`.
    pub fn generate(params: &DhParams) -> Self {
        let mut buf = [0u8; 32];
        let mut rng = rand::thread_rng();
        loop {
            rng.fill_bytes(&mut buf);
            let a = BigUint::from_bytes_be(&buf);
            if a > BigUint::from(1u8) {
                let public = params.generator.modpow(&a, &params.prime);
                return Self {
                    private_exponent: a,
                    challenge_hex: format!("{:x}", public),
                };
            }
        }
    }

    /// The public challenge as a lowercase hex string (no `0x` prefix).
    pub fn challenge_hex(&self) -> &str {
        &self.challenge_hex
    }

    /// Compute the shared secret `K = B^a mod p` from the server's response
    /// and return its byte representation under the signed convention.
    pub fn shared_secret(self, response_hex: &str, params: &DhParams) -> Result<Zeroizing<Vec<u8>>> {
        let b = BigUint::parse_bytes(response_hex.as_bytes(), 16).ok_or_else(|| {
            Error::Signature("diffie_hellman_response is not valid hexadecimal".to_string())
        })?;
        let k = b.modpow(&self.private_exponent, &params.prime);
        Ok(Zeroizing::new(signed_magnitude_bytes(&k)))
    }
}

impl std::fmt::Debug for DhChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DhChallenge")
            .field("private_exponent", &"[REDACTED]")
            .field("challenge_hex", &self.challenge_hex)
            .finish()
    }
}

/// Big-endian bytes of a non-negative big integer under two's-complement
/// sign-extension semantics: a set top bit gains a leading zero byte.
fn signed_magnitude_bytes(value: &BigUint) -> Vec<u8> {
    let mut bytes = value.to_bytes_be();
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    bytes
}

/// Decrypt the access token secret with the private encryption key.
///
/// Returns the raw plaintext; its hex encoding becomes the base-string
/// prepend for the live session token request. The plaintext is held only in
/// a zeroizing buffer.
pub fn decrypt_access_secret(
    encryption_key: &RsaPrivateKey,
    secret_base64: &str,
) -> Result<Zeroizing<Vec<u8>>> {
    let ciphertext = BASE64
        .decode(secret_base64)
        .map_err(|e| Error::Signature(format!("access token secret is not base64: {e}")))?;
    let plaintext = encryption_key
        .decrypt(Pkcs1v15Encrypt, &ciphertext)
        .map_err(|e| Error::Signature(format!("cannot decrypt access token secret: {e}")))?;
    Ok(Zeroizing::new(plaintext))
}

/// Derive the live session token.
///
/// `LST = HMAC-SHA1(key = shared secret bytes, message = base64-decoded
/// encrypted access token secret)`, returned as base64.
pub fn derive_live_session_token(
    shared_secret: &[u8],
    access_token_secret_base64: &str,
) -> Result<String> {
    let message = BASE64
        .decode(access_token_secret_base64)
        .map_err(|e| Error::Signature(format!("access token secret is not base64: {e}")))?;
    let mut mac = HmacSha1::new_from_slice(shared_secret)
        .map_err(|e| Error::Signature(format!("invalid HMAC key: {e}")))?;
    mac.update(&message);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Check the server-supplied live session token signature.
///
/// The server proves it derived the same token by sending
/// `hex(HMAC-SHA1(key = decoded LST, message = consumer key))`. A mismatch
/// indicates a derivation or encoding bug; callers log it and proceed, since
/// the token may still work for read-only calls.
pub fn verify_live_session_token(
    lst_base64: &str,
    consumer_key: &str,
    server_signature_hex: &str,
) -> Result<bool> {
    let key = BASE64
        .decode(lst_base64)
        .map_err(|e| Error::Signature(format!("live session token is not base64: {e}")))?;
    let mut mac = HmacSha1::new_from_slice(&key)
        .map_err(|e| Error::Signature(format!("invalid HMAC key: {e}")))?;
    mac.update(consumer_key.as_bytes());
    let local = hex::encode(mac.finalize().into_bytes());
    Ok(local == server_signature_hex.to_lowercase())
}
