//! Contract models for symbol search and contract details.

use serde::{Deserialize, Serialize};

/// One hit from `GET /iserver/secdef/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSearchResult {
    /// Contract identifier
    #[serde(default)]
    pub conid: Option<i64>,
    /// Ticker symbol
    #[serde(default)]
    pub symbol: Option<String>,
    /// Company name with exchange suffix
    #[serde(default)]
    pub company_header: Option<String>,
    /// Company name
    #[serde(default)]
    pub company_name: Option<String>,
    /// Instrument description
    #[serde(default)]
    pub description: Option<String>,
    /// Whether trading is restricted
    #[serde(default)]
    pub restricted: Option<bool>,
    /// Tradable instrument types for this symbol
    #[serde(default)]
    pub sections: Vec<ContractSection>,
}

/// One tradable instrument type of a search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSection {
    /// Instrument type, e.g. `STK` or `OPT`
    #[serde(default)]
    pub sec_type: Option<String>,
    /// Expiration months for derivatives
    #[serde(default)]
    pub months: Option<String>,
    /// Exchange list
    #[serde(default)]
    pub exchange: Option<String>,
    /// Contract identifier for this section
    #[serde(default)]
    pub conid: Option<String>,
}

/// Contract details from `GET /iserver/contract/{conid}/info`.
///
/// This endpoint reports snake_case keys, unlike the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractInfo {
    /// Contract identifier
    #[serde(default)]
    pub con_id: Option<i64>,
    /// Ticker symbol
    #[serde(default)]
    pub symbol: Option<String>,
    /// Instrument type
    #[serde(default)]
    pub instrument_type: Option<String>,
    /// Exchange-local symbol
    #[serde(default)]
    pub local_symbol: Option<String>,
    /// Trading currency
    #[serde(default)]
    pub currency: Option<String>,
    /// Company name
    #[serde(default)]
    pub company_name: Option<String>,
    /// Primary exchange
    #[serde(default)]
    pub exchange: Option<String>,
    /// All exchanges the contract trades on
    #[serde(default)]
    pub valid_exchanges: Option<String>,
    /// Trading class
    #[serde(default)]
    pub trading_class: Option<String>,
    /// Industry classification
    #[serde(default)]
    pub industry: Option<String>,
    /// Category within the industry
    #[serde(default)]
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_result_deserializes() {
        let json = r#"{
            "conid": 265598,
            "symbol": "AAPL",
            "companyHeader": "APPLE INC - NASDAQ",
            "companyName": "APPLE INC",
            "sections": [{"secType": "STK"}, {"secType": "OPT", "months": "JAN26"}]
        }"#;
        let hit: ContractSearchResult = serde_json::from_str(json).unwrap();
        assert_eq!(hit.conid, Some(265598));
        assert_eq!(hit.sections.len(), 2);
        assert_eq!(hit.sections[1].sec_type.as_deref(), Some("OPT"));
    }

    #[test]
    fn test_contract_info_snake_case() {
        let json = r#"{
            "con_id": 265598,
            "symbol": "AAPL",
            "instrument_type": "STK",
            "company_name": "APPLE INC",
            "valid_exchanges": "SMART,NASDAQ"
        }"#;
        let info: ContractInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.con_id, Some(265598));
        assert_eq!(info.instrument_type.as_deref(), Some("STK"));
    }
}
