//! API service modules for the authenticated resource endpoints.
//!
//! Each service provides methods for one subset of the Web API; all calls
//! are HMAC-signed through the shared client.

mod accounts;
mod contracts;
mod portfolio;

pub use accounts::AccountsService;
pub use contracts::ContractsService;
pub use portfolio::PortfolioService;
