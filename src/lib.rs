//! # ibkr-rs
//!
//! A headless OAuth 1.0a client for the Interactive Brokers Web API.
//!
//! This crate establishes a fully signed session with the brokerage REST API
//! without a browser flow or a local gateway login: an RSA-signed token
//! bootstrap, a Diffie-Hellman exchange that derives the live session token,
//! and HMAC-SHA256 signing of every subsequent call.
//!
//! ## Features
//!
//! - **Headless authentication**: request token → access token → live
//!   session token → brokerage session, with a fast path for pre-authorized
//!   access tokens
//! - **Per-call signing**: canonical OAuth base strings with the encoding
//!   corrections the server expects, byte for byte
//! - **Session recovery**: a 401 triggers exactly one serialized
//!   re-derivation of the live session token
//! - **Token persistence**: owner-only token file, revived across restarts
//! - **Typed resources**: accounts, portfolio and contract lookups
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ibkr_rs::{AccountId, Credentials, IbkrClient};
//!
//! #[tokio::main]
//! async fn main() -> ibkr_rs::Result<()> {
//!     // Reads IBKR_CONSUMER_KEY, key paths and DH parameters from the
//!     // environment; IBKR_ACCESS_TOKEN enables the pre-authorized fast path.
//!     let credentials = Credentials::from_env()?;
//!     let client = IbkrClient::connect(credentials).await?;
//!
//!     let accounts = client.accounts().list().await?;
//!     for account in &accounts {
//!         println!("account: {}", account.account_id);
//!     }
//!
//!     if let Some(first) = accounts.first() {
//!         let account = AccountId::new(first.account_id.as_str());
//!         let summary = client.portfolio().summary(&account).await?;
//!         if let Some(funds) = summary.get("availablefunds") {
//!             println!("available funds: {:?}", funds.amount);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Custom configuration
//!
//! ```rust,no_run
//! use ibkr_rs::{ClientConfig, Credentials, IbkrClient};
//! use std::time::Duration;
//!
//! # async fn example() -> ibkr_rs::Result<()> {
//! let credentials = Credentials::from_env()?;
//! let config = ClientConfig::default()
//!     .with_timeout(Duration::from_secs(60))
//!     .with_token_path("/var/lib/myapp/ibkr-tokens.json");
//! let client = IbkrClient::connect_with_config(credentials, config).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod models;

// Re-export primary types at crate root for convenience
pub use auth::{Credentials, DhParams, LiveSession, TokenRecord, TokenStore, DEFAULT_REALM};
pub use client::{ClientConfig, IbkrClient, CLOUD_BASE_URL, GATEWAY_BASE_URL};
pub use error::{AuthStep, Error, Result};
pub use models::{AccountId, Conid};

/// Prelude module for convenient imports.
///
/// ```rust
/// use ibkr_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::auth::{Credentials, DhParams, LiveSession, TokenStore};
    pub use crate::client::{ClientConfig, IbkrClient};
    pub use crate::error::{AuthStep, Error, Result};
    pub use crate::models::{
        Account, AccountId, BrokerageAccounts, Conid, ContractInfo, ContractSearchResult, Ledger,
        PortfolioSummary, Position,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_creation() {
        let account = AccountId::new("U1234567");
        assert_eq!(account.as_str(), "U1234567");
    }

    #[test]
    fn test_default_base_urls() {
        assert_eq!(CLOUD_BASE_URL, "https://api.ibkr.com/v1/api");
        assert_eq!(GATEWAY_BASE_URL, "https://localhost:5000/v1/api");
    }
}
