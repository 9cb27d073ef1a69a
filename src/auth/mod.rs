//! OAuth 1.0a authentication for the IBKR Web API.
//!
//! The handshake is a multi-step token exchange: an RSA-signed request token
//! and access token bootstrap, a Diffie-Hellman exchange that derives the
//! live session token, and a brokerage session initialization. After the
//! handshake every call is HMAC-SHA256-signed with the live session token.
//!
//! Modules:
//!
//! - [`credentials`] - consumer key, realm, RSA keys, DH parameters
//! - [`base_string`] - canonical signature base string and header assembly
//! - [`signer`] - RSA-SHA256 and HMAC-SHA256 request signers
//! - [`dh`] - DH key agreement and live session token derivation
//! - [`flow`] - the ordered token exchange state machine
//! - [`session`] - shared authenticated-session state
//! - [`token_store`] - owner-only persistence of the token set

pub mod base_string;
pub mod credentials;
pub mod dh;
pub mod flow;
pub mod session;
pub mod signer;
pub mod token_store;

pub use credentials::{Credentials, DEFAULT_REALM};
pub use dh::DhParams;
pub use flow::{SessionTokens, TokenFlow};
pub use session::LiveSession;
pub use token_store::{TokenRecord, TokenStore};
