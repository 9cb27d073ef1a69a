//! Contracts service.

use std::sync::Arc;

use crate::client::ClientInner;
use crate::models::{Conid, ContractInfo, ContractSearchResult};
use crate::Result;

/// Service for contract search and detail lookups.
pub struct ContractsService {
    inner: Arc<ClientInner>,
}

impl ContractsService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Search contracts by ticker symbol.
    pub async fn search(&self, symbol: &str) -> Result<Vec<ContractSearchResult>> {
        self.inner
            .get_with_params(
                "/iserver/secdef/search",
                &[("symbol", symbol.to_string())],
            )
            .await
    }

    /// Search contracts by company name.
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<ContractSearchResult>> {
        self.inner
            .get_with_params(
                "/iserver/secdef/search",
                &[("symbol", name.to_string()), ("name", "true".to_string())],
            )
            .await
    }

    /// Get details for a contract.
    pub async fn info(&self, conid: Conid) -> Result<ContractInfo> {
        self.inner
            .get(&format!("/iserver/contract/{}/info", conid))
            .await
    }
}
