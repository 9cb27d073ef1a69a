//! Shared session state for an authenticated client.
//!
//! The live session token is a shared mutable resource: any call site can hit
//! a 401 and trigger a re-derivation. [`LiveSession`] keeps the token set
//! behind a read/write lock and hands out a dedicated re-derivation mutex so
//! at most one Diffie-Hellman exchange runs at a time; losers of that race
//! observe the bumped generation counter and reuse the fresh token instead of
//! deriving another one.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, RwLock};

use crate::auth::flow::SessionTokens;
use crate::{Error, Result};

/// Authentication state of a session, shared across tasks.
#[derive(Clone)]
pub struct LiveSession {
    inner: Arc<RwLock<SessionInner>>,
    reauth: Arc<Mutex<()>>,
}

struct SessionInner {
    access_token: Option<String>,
    access_token_secret: Option<SecretString>,
    live_session_token: Option<SecretString>,
    authenticated: bool,
    generation: u64,
}

impl LiveSession {
    /// Create an unauthenticated session.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionInner {
                access_token: None,
                access_token_secret: None,
                live_session_token: None,
                authenticated: false,
                generation: 0,
            })),
            reauth: Arc::new(Mutex::new(())),
        }
    }

    /// Whether a brokerage session is currently established.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.authenticated
    }

    /// Install a freshly derived token set and mark the session established.
    pub(crate) async fn install(&self, tokens: SessionTokens) {
        let mut inner = self.inner.write().await;
        inner.access_token = Some(tokens.access_token);
        inner.access_token_secret = Some(SecretString::from(tokens.access_token_secret));
        inner.live_session_token = Some(SecretString::from(tokens.live_session_token));
        inner.authenticated = true;
        inner.generation += 1;
    }

    /// Drop the live session token but keep the access pair, returning the
    /// session to the state from which the token can be re-derived.
    pub(crate) async fn invalidate(&self) {
        let mut inner = self.inner.write().await;
        inner.live_session_token = None;
        inner.authenticated = false;
    }

    /// The current live session token (base64).
    pub(crate) async fn live_session_token(&self) -> Result<SecretString> {
        let inner = self.inner.read().await;
        if !inner.authenticated {
            return Err(Error::NotAuthenticated);
        }
        inner
            .live_session_token
            .clone()
            .ok_or(Error::NotAuthenticated)
    }

    /// The current access token.
    pub(crate) async fn access_token(&self) -> Result<String> {
        self.inner
            .read()
            .await
            .access_token
            .clone()
            .ok_or(Error::NotAuthenticated)
    }

    /// The access token and its encrypted secret, for re-derivation.
    pub(crate) async fn access_pair(&self) -> Result<(String, String)> {
        let inner = self.inner.read().await;
        match (&inner.access_token, &inner.access_token_secret) {
            (Some(token), Some(secret)) => {
                Ok((token.clone(), secret.expose_secret().to_string()))
            }
            _ => Err(Error::NotAuthenticated),
        }
    }

    /// Monotonic counter bumped on every [`install`](Self::install).
    pub(crate) async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    /// The mutex serializing live-session-token re-derivation.
    pub(crate) fn reauth_mutex(&self) -> Arc<Mutex<()>> {
        self.reauth.clone()
    }
}

impl Default for LiveSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSession")
            .field("access_token", &"[REDACTED]")
            .field("live_session_token", &"[REDACTED]")
            .finish()
    }
}
