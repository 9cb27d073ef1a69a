//! Credential material for the OAuth handshake.
//!
//! A [`Credentials`] value holds everything the consumer was provisioned
//! with: the consumer key, the realm, the RSA signing and encryption keys,
//! and the DH domain parameters. It is loaded once at startup and immutable
//! for the process lifetime.

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;

use crate::auth::dh::DhParams;
use crate::{Error, Result};

/// Realm for institutional consumer keys.
pub const DEFAULT_REALM: &str = "limited_poa";

/// Environment variable names understood by [`Credentials::from_env`].
const ENV_CONSUMER_KEY: &str = "IBKR_CONSUMER_KEY";
const ENV_REALM: &str = "IBKR_REALM";
const ENV_SIGNING_KEY_PATH: &str = "IBKR_SIGNING_KEY_PATH";
const ENV_ENCRYPTION_KEY_PATH: &str = "IBKR_ENCRYPTION_KEY_PATH";
const ENV_DH_PARAM_PATH: &str = "IBKR_DH_PARAM_PATH";
const ENV_DH_GENERATOR: &str = "IBKR_DH_GENERATOR";
const ENV_ACCESS_TOKEN: &str = "IBKR_ACCESS_TOKEN";
const ENV_ACCESS_TOKEN_SECRET: &str = "IBKR_ACCESS_TOKEN_SECRET";

/// Immutable credential set for one consumer key.
pub struct Credentials {
    consumer_key: String,
    realm: String,
    signing_key: RsaPrivateKey,
    encryption_key: RsaPrivateKey,
    dh: DhParams,
    access_token: Option<String>,
    access_token_secret: Option<SecretString>,
}

impl Credentials {
    /// Create credentials from in-memory PEM key material.
    ///
    /// Keys are accepted in PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1
    /// (`BEGIN RSA PRIVATE KEY`) form.
    pub fn new(
        consumer_key: impl Into<String>,
        realm: impl Into<String>,
        signing_key_pem: &str,
        encryption_key_pem: &str,
        dh: DhParams,
    ) -> Result<Self> {
        Ok(Self {
            consumer_key: consumer_key.into(),
            realm: realm.into(),
            signing_key: parse_private_key(signing_key_pem, "signing key")?,
            encryption_key: parse_private_key(encryption_key_pem, "encryption key")?,
            dh,
            access_token: None,
            access_token_secret: None,
        })
    }

    /// Create credentials from key files on disk.
    pub fn from_files(
        consumer_key: impl Into<String>,
        realm: impl Into<String>,
        signing_key_path: &Path,
        encryption_key_path: &Path,
        dh_param_path: &Path,
        dh_generator: u32,
    ) -> Result<Self> {
        let signing_pem = read_key_file(signing_key_path)?;
        let encryption_pem = read_key_file(encryption_key_path)?;
        let dh = DhParams::from_file(dh_param_path, dh_generator)?;
        Self::new(consumer_key, realm, &signing_pem, &encryption_pem, dh)
    }

    /// Load credentials from the environment.
    ///
    /// `IBKR_CONSUMER_KEY`, `IBKR_SIGNING_KEY_PATH`, `IBKR_ENCRYPTION_KEY_PATH`
    /// and `IBKR_DH_PARAM_PATH` are required; `IBKR_REALM` defaults to
    /// [`DEFAULT_REALM`] and `IBKR_DH_GENERATOR` to 2. A pre-authorized
    /// access token pair may be supplied via `IBKR_ACCESS_TOKEN` and
    /// `IBKR_ACCESS_TOKEN_SECRET` to skip the request/access token steps.
    pub fn from_env() -> Result<Self> {
        let consumer_key = require_env(ENV_CONSUMER_KEY)?;
        let realm = std::env::var(ENV_REALM).unwrap_or_else(|_| DEFAULT_REALM.to_string());
        let signing_key_path = require_env(ENV_SIGNING_KEY_PATH)?;
        let encryption_key_path = require_env(ENV_ENCRYPTION_KEY_PATH)?;
        let dh_param_path = require_env(ENV_DH_PARAM_PATH)?;
        let dh_generator = match std::env::var(ENV_DH_GENERATOR) {
            Ok(v) => v.parse::<u32>().map_err(|_| {
                Error::Config(format!("{ENV_DH_GENERATOR} must be a small integer"))
            })?,
            Err(_) => 2,
        };

        let mut credentials = Self::from_files(
            consumer_key,
            realm,
            Path::new(&signing_key_path),
            Path::new(&encryption_key_path),
            Path::new(&dh_param_path),
            dh_generator,
        )?;

        if let (Ok(token), Ok(secret)) = (
            std::env::var(ENV_ACCESS_TOKEN),
            std::env::var(ENV_ACCESS_TOKEN_SECRET),
        ) {
            credentials = credentials.with_access_token(token, secret);
        }
        Ok(credentials)
    }

    /// Attach a pre-authorized access token and its encrypted secret,
    /// enabling the fast path that skips the request/access token steps.
    pub fn with_access_token(
        mut self,
        token: impl Into<String>,
        encrypted_secret: impl Into<String>,
    ) -> Self {
        self.access_token = Some(token.into());
        self.access_token_secret = Some(SecretString::from(encrypted_secret.into()));
        self
    }

    /// The OAuth consumer key.
    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    /// The OAuth realm.
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// The private key used for RSA-SHA256 request signing.
    pub fn signing_key(&self) -> &RsaPrivateKey {
        &self.signing_key
    }

    /// The private key used to decrypt the access token secret.
    pub fn encryption_key(&self) -> &RsaPrivateKey {
        &self.encryption_key
    }

    /// The DH domain parameters.
    pub fn dh(&self) -> &DhParams {
        &self.dh
    }

    /// The pre-authorized access token pair, if configured.
    ///
    /// The secret stays in its encrypted base64 form.
    pub fn preauthorized_tokens(&self) -> Option<(String, String)> {
        match (&self.access_token, &self.access_token_secret) {
            (Some(token), Some(secret)) => {
                Some((token.clone(), secret.expose_secret().to_string()))
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("realm", &self.realm)
            .field("signing_key", &"[REDACTED]")
            .field("encryption_key", &"[REDACTED]")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"[REDACTED]")
            .finish()
    }
}

fn parse_private_key(pem: &str, label: &str) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| Error::Config(format!("cannot parse {label}: {e}")))
}

fn read_key_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read key file {}: {e}", path.display())))
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Config(format!("missing environment variable: {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::EncodePrivateKey;

    fn test_dh() -> DhParams {
        DhParams::from_hex("ffffffffffffffffc90fdaa22168c234", 2).unwrap()
    }

    fn generate_pem() -> String {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        key.to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_new_parses_pkcs8_keys() {
        let pem = generate_pem();
        let creds = Credentials::new("TESTCONS", DEFAULT_REALM, &pem, &pem, test_dh()).unwrap();
        assert_eq!(creds.consumer_key(), "TESTCONS");
        assert_eq!(creds.realm(), "limited_poa");
        assert!(creds.preauthorized_tokens().is_none());
    }

    #[test]
    fn test_invalid_pem_is_config_error() {
        let result = Credentials::new(
            "TESTCONS",
            DEFAULT_REALM,
            "not a pem",
            "not a pem",
            test_dh(),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_with_access_token_enables_fast_path() {
        let pem = generate_pem();
        let creds = Credentials::new("TESTCONS", DEFAULT_REALM, &pem, &pem, test_dh())
            .unwrap()
            .with_access_token("token", "c2VjcmV0");
        let (token, secret) = creds.preauthorized_tokens().unwrap();
        assert_eq!(token, "token");
        assert_eq!(secret, "c2VjcmV0");
    }

    #[test]
    fn test_from_env_reports_missing_variable() {
        std::env::remove_var(ENV_CONSUMER_KEY);
        let err = Credentials::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_CONSUMER_KEY));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let pem = generate_pem();
        let creds = Credentials::new("TESTCONS", DEFAULT_REALM, &pem, &pem, test_dh())
            .unwrap()
            .with_access_token("token", "c2VjcmV0");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("c2VjcmV0"));
    }
}
