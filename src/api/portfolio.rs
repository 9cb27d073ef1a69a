//! Portfolio service.

use std::sync::Arc;

use crate::client::ClientInner;
use crate::models::{AccountId, Ledger, PortfolioSummary, Position};
use crate::Result;

/// Service for portfolio summary, position and ledger lookups.
///
/// # Example
///
/// ```no_run
/// use ibkr_rs::AccountId;
///
/// # async fn example(client: ibkr_rs::IbkrClient) -> ibkr_rs::Result<()> {
/// let account = AccountId::new("U1234567");
/// let positions = client.portfolio().positions(&account, 0).await?;
/// for position in positions {
///     println!("{}: {}", position.conid, position.position);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PortfolioService {
    inner: Arc<ClientInner>,
}

impl PortfolioService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Get the account summary (funds, margin, equity fields).
    pub async fn summary(&self, account: &AccountId) -> Result<PortfolioSummary> {
        self.inner
            .get(&format!("/portfolio/{}/summary", account))
            .await
    }

    /// Get one page of positions. Pages hold 100 positions; `page` starts
    /// at 0.
    pub async fn positions(&self, account: &AccountId, page: u32) -> Result<Vec<Position>> {
        self.inner
            .get(&format!("/portfolio/{}/positions/{}", account, page))
            .await
    }

    /// Get the per-currency cash ledger.
    pub async fn ledger(&self, account: &AccountId) -> Result<Ledger> {
        self.inner
            .get(&format!("/portfolio/{}/ledger", account))
            .await
    }
}
