//! Account models.

use serde::{Deserialize, Serialize};

/// A brokerage account as returned by `GET /portfolio/accounts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Internal identifier
    #[serde(default)]
    pub id: Option<String>,
    /// The account number, e.g. `U1234567`
    pub account_id: String,
    /// Virtual account number
    #[serde(default)]
    pub account_van: Option<String>,
    /// Account title
    #[serde(default)]
    pub account_title: Option<String>,
    /// Display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// User-assigned alias
    #[serde(default)]
    pub account_alias: Option<String>,
    /// Base currency
    #[serde(default)]
    pub currency: Option<String>,
    /// Account type, e.g. `INDIVIDUAL`
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    /// Trading permission type
    #[serde(default)]
    pub trading_type: Option<String>,
    /// Clearing status
    #[serde(default)]
    pub clearing_status: Option<String>,
    /// Free-text description
    #[serde(default)]
    pub desc: Option<String>,
}

/// Response of `GET /iserver/accounts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerageAccounts {
    /// Account numbers the session may trade
    #[serde(default)]
    pub accounts: Vec<String>,
    /// The currently selected account
    #[serde(default)]
    pub selected_account: Option<String>,
}
