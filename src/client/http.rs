//! The authenticated HTTP client façade.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

use crate::api::{AccountsService, ContractsService, PortfolioService};
use crate::auth::base_string;
use crate::auth::credentials::Credentials;
use crate::auth::flow::{SessionTokens, TokenFlow};
use crate::auth::session::LiveSession;
use crate::auth::signer::{self, HmacSigner};
use crate::auth::token_store::{TokenRecord, TokenStore};
use crate::{Error, Result};

use super::config::ClientConfig;

/// The main client for the IBKR Web API.
///
/// `connect` runs the OAuth handshake (or revives a persisted session) and
/// returns a handle that signs every request with the live session token.
/// The handle is cheap to clone and safe to share across tasks; a 401 on any
/// call triggers a single, serialized re-derivation of the token.
///
/// # Example
///
/// ```no_run
/// use ibkr_rs::{Credentials, IbkrClient};
///
/// # async fn example() -> ibkr_rs::Result<()> {
/// let credentials = Credentials::from_env()?;
/// let client = IbkrClient::connect(credentials).await?;
///
/// let accounts = client.accounts().list().await?;
/// println!("found {} accounts", accounts.len());
/// # Ok(())
/// # }
/// ```
pub struct IbkrClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) http: reqwest::Client,
    pub(crate) credentials: Credentials,
    pub(crate) session: LiveSession,
    pub(crate) config: ClientConfig,
    pub(crate) store: Option<TokenStore>,
}

impl IbkrClient {
    /// Connect with the default configuration.
    pub async fn connect(credentials: Credentials) -> Result<Self> {
        Self::connect_with_config(credentials, ClientConfig::default()).await
    }

    /// Connect with a custom configuration.
    pub async fn connect_with_config(
        credentials: Credentials,
        config: ClientConfig,
    ) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let store = if config.persist_tokens {
            let path = config
                .token_path
                .clone()
                .or_else(TokenStore::default_path)
                .ok_or_else(|| {
                    Error::Config("no token path configured and $HOME is unset".to_string())
                })?;
            Some(TokenStore::new(path))
        } else {
            None
        };

        let client = Self {
            inner: Arc::new(ClientInner {
                http,
                credentials,
                session: LiveSession::new(),
                config,
                store,
            }),
        };
        client.inner.establish_session().await?;
        Ok(client)
    }

    /// Whether a brokerage session is currently established.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.session.is_authenticated().await
    }

    /// Get a reference to the session state.
    pub fn session(&self) -> &LiveSession {
        &self.inner.session
    }

    /// Keep the brokerage session alive.
    ///
    /// Also serves as the liveness probe for a freshly loaded token set.
    pub async fn tickle(&self) -> Result<serde_json::Value> {
        self.inner.signed(Method::POST, "/tickle", &[]).await
    }

    /// Re-initialize the brokerage session, e.g. after a competing session
    /// took over the trading endpoints.
    pub async fn init_brokerage_session(&self) -> Result<()> {
        let (access_token, _) = self.inner.session.access_pair().await?;
        let lst = self.inner.session.live_session_token().await?;
        self.inner
            .flow()
            .init_brokerage_session(&access_token, lst.expose_secret())
            .await
    }

    /// End the brokerage session on the server and drop the local one.
    pub async fn logout(&self) -> Result<()> {
        let _: serde_json::Value = self.inner.signed(Method::POST, "/logout", &[]).await?;
        self.inner.session.invalidate().await;
        Ok(())
    }

    /// Get the accounts service.
    pub fn accounts(&self) -> AccountsService {
        AccountsService::new(self.inner.clone())
    }

    /// Get the portfolio service.
    pub fn portfolio(&self) -> PortfolioService {
        PortfolioService::new(self.inner.clone())
    }

    /// Get the contracts service.
    pub fn contracts(&self) -> ContractsService {
        ContractsService::new(self.inner.clone())
    }
}

impl ClientInner {
    fn flow(&self) -> TokenFlow<'_> {
        TokenFlow::new(
            &self.http,
            &self.credentials,
            &self.config.cloud_base,
            &self.config.gateway_base,
        )
        .with_verifier(self.config.oauth_verifier.as_deref())
    }

    /// Establish a session: revive a persisted token set when possible,
    /// otherwise run the token exchange.
    async fn establish_session(&self) -> Result<()> {
        if let Some(store) = &self.store {
            if let Some(record) = store.load()? {
                if record.consumer_key == self.credentials.consumer_key()
                    && record.realm == self.credentials.realm()
                {
                    self.session
                        .install(SessionTokens {
                            access_token: record.access_token,
                            access_token_secret: record.access_token_secret,
                            live_session_token: record.live_session_token,
                        })
                        .await;

                    match self
                        .try_signed::<serde_json::Value>(Method::POST, "/tickle", &[])
                        .await
                    {
                        Ok(_) => {
                            tracing::debug!("revived persisted session");
                            return Ok(());
                        }
                        Err(err) => {
                            tracing::debug!("stored live session token failed liveness check: {err}");
                            self.session.invalidate().await;
                        }
                    }

                    // The access pair may still be good; re-derive before
                    // falling back to the full bootstrap.
                    if let Ok((token, secret)) = self.session.access_pair().await {
                        match self.derive_and_install(token, secret).await {
                            Ok(()) => return Ok(()),
                            Err(err) => {
                                tracing::debug!(
                                    "re-derivation from stored access token failed: {err}"
                                );
                            }
                        }
                    }
                }
            }
        }

        let tokens = self.flow().authenticate().await?;
        self.install_and_persist(tokens).await
    }

    /// Derive a live session token from an access pair, initialize the
    /// brokerage session, and persist the result.
    async fn derive_and_install(
        &self,
        access_token: String,
        access_token_secret: String,
    ) -> Result<()> {
        let flow = self.flow();
        let derived = flow
            .live_session_token(&access_token, &access_token_secret)
            .await?;
        flow.init_brokerage_session(&access_token, &derived.token)
            .await?;
        self.install_and_persist(SessionTokens {
            access_token,
            access_token_secret,
            live_session_token: derived.token,
        })
        .await
    }

    /// Re-derive the live session token after a 401.
    ///
    /// Serialized behind the session's re-derivation mutex; a caller that
    /// loses the race observes the bumped generation and returns without
    /// running a second exchange.
    async fn reauthenticate(&self) -> Result<()> {
        let before = self.session.generation().await;
        let mutex = self.session.reauth_mutex();
        let _guard = mutex.lock().await;
        if self.session.generation().await != before {
            return Ok(());
        }

        let (access_token, access_token_secret) = self.session.access_pair().await?;
        self.session.invalidate().await;
        self.derive_and_install(access_token, access_token_secret)
            .await
    }

    async fn install_and_persist(&self, tokens: SessionTokens) -> Result<()> {
        self.session.install(tokens.clone()).await;
        if let Some(store) = &self.store {
            store.save(&TokenRecord {
                access_token: tokens.access_token,
                access_token_secret: tokens.access_token_secret,
                live_session_token: tokens.live_session_token,
                consumer_key: self.credentials.consumer_key().to_string(),
                realm: self.credentials.realm().to_string(),
                updated_at: Utc::now(),
            })?;
        }
        Ok(())
    }

    /// Make a signed GET request.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.signed(Method::GET, path, &[]).await
    }

    /// Make a signed GET request with query parameters.
    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        self.signed(Method::GET, path, params).await
    }

    /// Issue a signed request, re-deriving the live session token once if
    /// the server answers 401.
    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        match self.try_signed(method.clone(), path, params).await {
            Err(Error::SessionExpired) => {
                tracing::debug!(path, "authenticated call returned 401, re-deriving token");
                self.reauthenticate().await?;
                self.try_signed(method, path, params).await
            }
            other => other,
        }
    }

    /// Build, sign and issue one request, without recovery.
    async fn try_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.config.cloud_base, path);
        let access_token = self.session.access_token().await?;
        let lst = self.session.live_session_token().await?;

        let mut oauth: HashMap<String, String> = HashMap::new();
        oauth.insert(
            "oauth_consumer_key".to_string(),
            self.credentials.consumer_key().to_string(),
        );
        oauth.insert("oauth_token".to_string(), access_token);
        oauth.insert("oauth_nonce".to_string(), signer::nonce());
        oauth.insert("oauth_timestamp".to_string(), signer::timestamp());
        oauth.insert(
            "oauth_signature_method".to_string(),
            "HMAC-SHA256".to_string(),
        );
        oauth.insert("oauth_version".to_string(), "1.0".to_string());

        // Request parameters are part of the signed set but travel in the
        // query string, not the header.
        let mut signing = oauth.clone();
        for (k, v) in params {
            signing.insert(k.to_string(), v.clone());
        }

        let base = base_string::signature_base_string(method.as_str(), &url, &signing, None);
        let hmac = HmacSigner::from_live_session_token(lst.expose_secret())?;
        oauth.insert(
            "oauth_signature".to_string(),
            signer::header_encode(&hmac.sign(&base)?),
        );
        let header = base_string::oauth_header(self.credentials.realm(), &oauth);

        let mut request = self.http.request(method, &url).header(AUTHORIZATION, header);
        if !params.is_empty() {
            request = request.query(params);
        }
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::from_api_response(status.as_u16(), body))
        }
    }
}

impl Clone for IbkrClient {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for IbkrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IbkrClient")
            .field("config", &self.inner.config)
            .finish()
    }
}
