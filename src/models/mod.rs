//! Data models for the IBKR Web API.
//!
//! Models are organized by domain:
//!
//! - [`primitives`] - core newtypes like [`AccountId`] and [`Conid`]
//! - [`account`] - account models
//! - [`portfolio`] - summary, position and ledger models
//! - [`contract`] - contract search and detail models

pub mod account;
pub mod contract;
pub mod portfolio;
pub mod primitives;

pub use account::*;
pub use contract::*;
pub use portfolio::*;
pub use primitives::*;
