//! Portfolio models: summary values, positions and cash ledgers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One field of the portfolio summary, e.g. `availablefunds`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryValue {
    /// Numeric amount
    #[serde(default)]
    pub amount: Option<f64>,
    /// Currency the amount is denominated in
    #[serde(default)]
    pub currency: Option<String>,
    /// Whether the server reported the field as null
    #[serde(default)]
    pub is_null: Option<bool>,
    /// Server timestamp for the value
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// String rendering, set for non-numeric fields
    #[serde(default)]
    pub value: Option<String>,
}

/// The full summary map keyed by field name.
pub type PortfolioSummary = HashMap<String, SummaryValue>;

/// A position as returned by `GET /portfolio/{accountId}/positions/{page}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Owning account
    #[serde(default)]
    pub acct_id: Option<String>,
    /// Contract identifier
    pub conid: i64,
    /// Human-readable contract description
    #[serde(default)]
    pub contract_desc: Option<String>,
    /// Signed position size
    pub position: f64,
    /// Last market price
    #[serde(default)]
    pub mkt_price: Option<f64>,
    /// Market value of the position
    #[serde(default)]
    pub mkt_value: Option<f64>,
    /// Denominating currency
    #[serde(default)]
    pub currency: Option<String>,
    /// Average acquisition cost
    #[serde(default)]
    pub avg_cost: Option<f64>,
    /// Average acquisition price
    #[serde(default)]
    pub avg_price: Option<f64>,
    /// Realized profit and loss
    #[serde(default)]
    pub realized_pnl: Option<f64>,
    /// Unrealized profit and loss
    #[serde(default)]
    pub unrealized_pnl: Option<f64>,
    /// Asset class, e.g. `STK`
    #[serde(default)]
    pub asset_class: Option<String>,
}

/// Per-currency cash ledger entry.
///
/// The ledger endpoint reports keys in all-lowercase run-together form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Currency of this ledger slice
    #[serde(default)]
    pub currency: Option<String>,
    /// Cash balance
    #[serde(rename = "cashbalance", default)]
    pub cash_balance: Option<f64>,
    /// Net liquidation value
    #[serde(rename = "netliquidationvalue", default)]
    pub net_liquidation_value: Option<f64>,
    /// Stock market value
    #[serde(rename = "stockmarketvalue", default)]
    pub stock_market_value: Option<f64>,
    /// Exchange rate to the base currency
    #[serde(rename = "exchangerate", default)]
    pub exchange_rate: Option<f64>,
    /// Unrealized profit and loss
    #[serde(rename = "unrealizedpnl", default)]
    pub unrealized_pnl: Option<f64>,
    /// Realized profit and loss
    #[serde(rename = "realizedpnl", default)]
    pub realized_pnl: Option<f64>,
    /// Settled cash
    #[serde(rename = "settledcash", default)]
    pub settled_cash: Option<f64>,
    /// Accrued interest
    #[serde(default)]
    pub interest: Option<f64>,
    /// Accrued dividends
    #[serde(default)]
    pub dividends: Option<f64>,
}

/// The full ledger keyed by currency (plus a `BASE` aggregate).
pub type Ledger = HashMap<String, LedgerEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_value_map() {
        let json = r#"{
            "availablefunds": {"amount": 1000.5, "currency": "USD", "isNull": false, "timestamp": 1700000000},
            "accounttype": {"value": "INDIVIDUAL"}
        }"#;
        let summary: PortfolioSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary["availablefunds"].amount, Some(1000.5));
        assert_eq!(summary["accounttype"].value.as_deref(), Some("INDIVIDUAL"));
    }

    #[test]
    fn test_position_deserializes() {
        let json = r#"{
            "acctId": "U1234567",
            "conid": 265598,
            "contractDesc": "AAPL",
            "position": 100.0,
            "mktPrice": 190.25,
            "mktValue": 19025.0,
            "avgCost": 150.0,
            "unrealizedPnl": 4025.0,
            "assetClass": "STK"
        }"#;
        let position: Position = serde_json::from_str(json).unwrap();
        assert_eq!(position.conid, 265598);
        assert_eq!(position.position, 100.0);
        assert_eq!(position.asset_class.as_deref(), Some("STK"));
    }

    #[test]
    fn test_ledger_lowercase_keys() {
        let json = r#"{
            "USD": {"currency": "USD", "cashbalance": 5000.0, "netliquidationvalue": 25000.0, "settledcash": 5000.0}
        }"#;
        let ledger: Ledger = serde_json::from_str(json).unwrap();
        assert_eq!(ledger["USD"].cash_balance, Some(5000.0));
        assert_eq!(ledger["USD"].net_liquidation_value, Some(25000.0));
    }
}
