//! The ordered token exchange that establishes a live session.
//!
//! The flow walks `Unauthenticated → HasRequestToken → HasAccessToken →
//! HasLiveSessionToken → SessionInitialized`. Pre-authorized consumers enter
//! at `HasAccessToken` directly. Each step is one signed POST; any failure
//! aborts the attempt and reports the failing step, leaving retry policy to
//! the caller.

use std::collections::HashMap;

use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use crate::auth::base_string;
use crate::auth::credentials::Credentials;
use crate::auth::dh::{self, DhChallenge};
use crate::auth::signer::{self, HmacSigner, RsaSigner};
use crate::{AuthStep, Error, Result};

/// The token set produced by a completed handshake.
#[derive(Clone)]
pub struct SessionTokens {
    /// OAuth access token
    pub access_token: String,
    /// Access token secret, still RSA-encrypted, base64
    pub access_token_secret: String,
    /// Derived live session token, base64
    pub live_session_token: String,
}

/// Result of the live session token derivation step.
pub struct DerivedToken {
    /// The live session token, base64
    pub token: String,
    /// Server-reported expiration, milliseconds since epoch
    pub expiration: Option<i64>,
}

/// Executes the token exchange against the OAuth and session endpoints.
///
/// Borrows the HTTP client and credentials; one value is built per
/// authentication attempt.
pub struct TokenFlow<'a> {
    http: &'a reqwest::Client,
    credentials: &'a Credentials,
    cloud_base: &'a str,
    gateway_base: &'a str,
    verifier: Option<&'a str>,
}

#[derive(Deserialize)]
struct RequestTokenResponse {
    oauth_token: String,
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    oauth_token: String,
    oauth_token_secret: String,
}

#[derive(Deserialize)]
struct LiveSessionTokenResponse {
    diffie_hellman_response: String,
    live_session_token_signature: String,
    #[serde(default)]
    live_session_token_expiration: Option<i64>,
}

impl<'a> TokenFlow<'a> {
    /// Create a flow over the given transport and credential set.
    pub fn new(
        http: &'a reqwest::Client,
        credentials: &'a Credentials,
        cloud_base: &'a str,
        gateway_base: &'a str,
    ) -> Self {
        Self {
            http,
            credentials,
            cloud_base,
            gateway_base,
            verifier: None,
        }
    }

    /// Attach an `oauth_verifier` for interactive flows.
    pub fn with_verifier(mut self, verifier: Option<&'a str>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Run the full exchange to `SessionInitialized`.
    ///
    /// Takes the fast path when the credentials carry a pre-authorized
    /// access token pair. A 401 from the session init step means the freshly
    /// derived token is unusable; the flow restarts once from
    /// `HasAccessToken` before giving up.
    pub async fn authenticate(&self) -> Result<SessionTokens> {
        let (access_token, access_token_secret) = match self.credentials.preauthorized_tokens() {
            Some(pair) => pair,
            None => {
                let request_token = self.request_token().await?;
                self.access_token(&request_token).await?
            }
        };

        let mut derived = self
            .live_session_token(&access_token, &access_token_secret)
            .await?;

        if let Err(err) = self
            .init_brokerage_session(&access_token, &derived.token)
            .await
        {
            match err {
                Error::Protocol {
                    step: AuthStep::BrokerageSession,
                    status: 401,
                    ..
                } => {
                    tracing::debug!("session init rejected the live session token, re-deriving");
                    derived = self
                        .live_session_token(&access_token, &access_token_secret)
                        .await?;
                    self.init_brokerage_session(&access_token, &derived.token)
                        .await?;
                }
                other => return Err(other),
            }
        }

        Ok(SessionTokens {
            access_token,
            access_token_secret,
            live_session_token: derived.token,
        })
    }

    /// `Unauthenticated → HasRequestToken`.
    pub async fn request_token(&self) -> Result<String> {
        let url = format!("{}/oauth/request_token", self.cloud_base);
        let mut params = self.oauth_params();
        params.insert("oauth_callback".to_string(), "oob".to_string());

        let body = self
            .rsa_signed_post(AuthStep::RequestToken, &url, params, None)
            .await?;
        let parsed: RequestTokenResponse = serde_json::from_str(&body)?;
        tracing::debug!("obtained request token");
        Ok(parsed.oauth_token)
    }

    /// `HasRequestToken → HasAccessToken`.
    ///
    /// Returns the access token and its encrypted secret.
    pub async fn access_token(&self, request_token: &str) -> Result<(String, String)> {
        let url = format!("{}/oauth/access_token", self.cloud_base);
        let mut params = self.oauth_params();
        params.insert("oauth_token".to_string(), request_token.to_string());
        if let Some(verifier) = self.verifier {
            params.insert("oauth_verifier".to_string(), verifier.to_string());
        }

        let body = self
            .rsa_signed_post(AuthStep::AccessToken, &url, params, None)
            .await?;
        let parsed: AccessTokenResponse = serde_json::from_str(&body)?;
        tracing::debug!("obtained access token");
        Ok((parsed.oauth_token, parsed.oauth_token_secret))
    }

    /// `HasAccessToken → HasLiveSessionToken`.
    pub async fn live_session_token(
        &self,
        access_token: &str,
        access_token_secret: &str,
    ) -> Result<DerivedToken> {
        let url = format!("{}/oauth/live_session_token", self.cloud_base);

        let plaintext = dh::decrypt_access_secret(self.credentials.encryption_key(), access_token_secret)?;
        let prepend = hex::encode(&plaintext[..]);

        let challenge = DhChallenge::generate(self.credentials.dh());
        let mut params = self.oauth_params();
        params.insert("oauth_token".to_string(), access_token.to_string());
        params.insert(
            "diffie_hellman_challenge".to_string(),
            challenge.challenge_hex().to_string(),
        );

        let body = self
            .rsa_signed_post(AuthStep::LiveSessionToken, &url, params, Some(&prepend))
            .await?;
        let parsed: LiveSessionTokenResponse = serde_json::from_str(&body)?;

        let shared_secret =
            challenge.shared_secret(&parsed.diffie_hellman_response, self.credentials.dh())?;
        let token = dh::derive_live_session_token(&shared_secret, access_token_secret)?;

        match dh::verify_live_session_token(
            &token,
            self.credentials.consumer_key(),
            &parsed.live_session_token_signature,
        ) {
            Ok(true) => tracing::debug!("live session token verified"),
            Ok(false) => tracing::warn!(
                "live session token signature mismatch; proceeding with locally derived token"
            ),
            Err(e) => tracing::warn!("cannot verify live session token signature: {e}"),
        }

        Ok(DerivedToken {
            token,
            expiration: parsed.live_session_token_expiration,
        })
    }

    /// `HasLiveSessionToken → SessionInitialized`.
    ///
    /// The init endpoint lives on the local gateway in gateway deployments
    /// and on the cloud surface otherwise, so the gateway is tried first and
    /// the cloud second. A 401 is returned immediately: it means the live
    /// session token itself is invalid and no other surface will accept it.
    pub async fn init_brokerage_session(&self, access_token: &str, lst: &str) -> Result<()> {
        let mut last_err: Option<Error> = None;
        for base in [self.gateway_base, self.cloud_base] {
            let url = format!("{}/iserver/auth/ssodh/init", base);
            match self.try_init(&url, access_token, lst).await {
                Ok(()) => {
                    tracing::debug!(base, "brokerage session initialized");
                    return Ok(());
                }
                Err(err @ Error::Protocol { status: 401, .. }) => return Err(err),
                Err(err) => {
                    tracing::warn!(base, "brokerage session init failed, trying next surface: {err}");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| Error::Config("no session surface configured".to_string())))
    }

    async fn try_init(&self, url: &str, access_token: &str, lst: &str) -> Result<()> {
        let mut params = self.oauth_params();
        params.insert("oauth_token".to_string(), access_token.to_string());
        params.insert(
            "oauth_signature_method".to_string(),
            "HMAC-SHA256".to_string(),
        );
        params.insert("oauth_version".to_string(), "1.0".to_string());

        let request_params = [("publish", "true"), ("compete", "false")];
        let mut signing_params = params.clone();
        for (k, v) in request_params {
            signing_params.insert(k.to_string(), v.to_string());
        }

        let base = base_string::signature_base_string("POST", url, &signing_params, None);
        let signer = HmacSigner::from_live_session_token(lst)?;
        params.insert(
            "oauth_signature".to_string(),
            signer::header_encode(&signer.sign(&base)?),
        );
        let header = base_string::oauth_header(self.credentials.realm(), &params);

        let response = self
            .http
            .post(url)
            .query(&request_params)
            .header(AUTHORIZATION, header)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Protocol {
                step: AuthStep::BrokerageSession,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    /// Fresh OAuth parameters shared by every bootstrap request.
    fn oauth_params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert(
            "oauth_consumer_key".to_string(),
            self.credentials.consumer_key().to_string(),
        );
        params.insert("oauth_nonce".to_string(), signer::nonce());
        params.insert("oauth_timestamp".to_string(), signer::timestamp());
        params.insert(
            "oauth_signature_method".to_string(),
            "RSA-SHA256".to_string(),
        );
        params
    }

    /// POST one bootstrap step, RSA-signed.
    ///
    /// The signature is embedded in the header as raw base64; this is the
    /// convention the bootstrap endpoints require, unlike the percent-encoded
    /// form used after the handshake.
    async fn rsa_signed_post(
        &self,
        step: AuthStep,
        url: &str,
        mut params: HashMap<String, String>,
        prepend: Option<&str>,
    ) -> Result<String> {
        let base = base_string::signature_base_string("POST", url, &params, prepend);
        let signature = RsaSigner::new(self.credentials.signing_key().clone()).sign(&base);
        params.insert("oauth_signature".to_string(), signature);

        let header = base_string::oauth_header(self.credentials.realm(), &params);
        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, header)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_success() {
            Ok(body)
        } else {
            Err(Error::Protocol {
                step,
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_tokens_are_cloneable() {
        let tokens = SessionTokens {
            access_token: "a".to_string(),
            access_token_secret: "b".to_string(),
            live_session_token: "c".to_string(),
        };
        let copy = tokens.clone();
        assert_eq!(copy.access_token, "a");
        assert_eq!(copy.live_session_token, "c");
    }
}
