//! Error types for the IBKR Web API client.
//!
//! This module provides a comprehensive error type that covers all possible
//! failure modes of the OAuth handshake and of authenticated API calls.

use std::fmt;

use thiserror::Error;

/// A specialized `Result` type for IBKR operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The step of the token exchange flow that failed.
///
/// Carried inside [`Error::Protocol`] so callers can tell which state
/// transition of the handshake aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    /// `POST /oauth/request_token`
    RequestToken,
    /// `POST /oauth/access_token`
    AccessToken,
    /// `POST /oauth/live_session_token`
    LiveSessionToken,
    /// `POST /iserver/auth/ssodh/init`
    BrokerageSession,
}

impl fmt::Display for AuthStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthStep::RequestToken => "request_token",
            AuthStep::AccessToken => "access_token",
            AuthStep::LiveSessionToken => "live_session_token",
            AuthStep::BrokerageSession => "brokerage_session_init",
        };
        write!(f, "{}", name)
    }
}

/// The main error type for all IBKR API operations.
///
/// Configuration and signature problems are local and fatal for the current
/// attempt; protocol errors carry the failing handshake step; a
/// [`Error::SessionExpired`] after a successful handshake is recoverable by
/// re-deriving the live session token.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error (key files, token store)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Missing or unreadable key files, DH parameters, or settings.
    ///
    /// Fatal; no retry is possible without operator intervention.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local signing or decryption failure (bad key format, corrupted
    /// ciphertext). Fatal for the current attempt.
    #[error("Signature error: {0}")]
    Signature(String),

    /// The server returned a non-success status for a handshake step.
    #[error("Handshake step {step} failed: status={status}, body={body}")]
    Protocol {
        /// Which state transition of the token exchange failed
        step: AuthStep,
        /// HTTP status code
        status: u16,
        /// Raw response body for debugging
        body: String,
    },

    /// The server returned a non-success status for a resource endpoint.
    #[error("API error: status={status}, body={body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body for debugging
        body: String,
    },

    /// A 401 on an authenticated call after the session was established.
    ///
    /// Recoverable by one automatic re-derivation of the live session token;
    /// surfaced to the caller only if re-derivation also fails.
    #[error("Session expired; live session token re-derivation required")]
    SessionExpired,

    /// No session has been established yet.
    ///
    /// Distinct from [`Error::SessionExpired`] so callers can decide whether
    /// to run the handshake or to prompt for new credentials.
    #[error("Not authenticated; run the token exchange first")]
    NotAuthenticated,

    /// Invalid input provided to a function
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Returns `true` if this error is potentially transient and the
    /// operation could be retried by the caller.
    ///
    /// The core never retries on its own; retry policy belongs to callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is an authentication-related error.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Error::SessionExpired | Error::NotAuthenticated | Error::Signature(_)
        ) || matches!(self, Error::Protocol { status: 401, .. } | Error::Api { status: 401, .. })
    }

    /// Returns `true` if this error indicates a client-side issue.
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::Api { status, .. } | Error::Protocol { status, .. } => {
                *status >= 400 && *status < 500
            }
            Error::Config(_) | Error::InvalidInput(_) => true,
            _ => false,
        }
    }

    /// Create an error from a non-success resource response.
    pub(crate) fn from_api_response(status: u16, body: String) -> Self {
        if status == 401 {
            Error::SessionExpired
        } else {
            Error::Api { status, body }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_step_display() {
        assert_eq!(AuthStep::RequestToken.to_string(), "request_token");
        assert_eq!(
            AuthStep::BrokerageSession.to_string(),
            "brokerage_session_init"
        );
    }

    #[test]
    fn test_error_auth_predicates() {
        assert!(Error::SessionExpired.is_auth_error());
        assert!(Error::NotAuthenticated.is_auth_error());
        assert!(Error::Protocol {
            step: AuthStep::BrokerageSession,
            status: 401,
            body: String::new(),
        }
        .is_auth_error());
        assert!(!Error::Config("missing key".into()).is_auth_error());
    }

    #[test]
    fn test_expired_distinct_from_not_authenticated() {
        // Callers rely on this distinction to choose between re-running the
        // handshake and prompting for new credentials.
        let expired = Error::SessionExpired;
        let fresh = Error::NotAuthenticated;
        assert!(!matches!(expired, Error::NotAuthenticated));
        assert!(!matches!(fresh, Error::SessionExpired));
    }

    #[test]
    fn test_from_api_response_maps_401() {
        assert!(matches!(
            Error::from_api_response(401, String::new()),
            Error::SessionExpired
        ));
        assert!(matches!(
            Error::from_api_response(500, "oops".into()),
            Error::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_retryable() {
        assert!(Error::Api {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!Error::Signature("bad key".into()).is_retryable());
    }
}
