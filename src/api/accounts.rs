//! Accounts service.

use std::sync::Arc;

use crate::client::ClientInner;
use crate::models::{Account, BrokerageAccounts};
use crate::Result;

/// Service for account-related operations.
///
/// # Example
///
/// ```no_run
/// # async fn example(client: ibkr_rs::IbkrClient) -> ibkr_rs::Result<()> {
/// let accounts = client.accounts().list().await?;
/// for account in accounts {
///     println!("account: {}", account.account_id);
/// }
/// # Ok(())
/// # }
/// ```
pub struct AccountsService {
    inner: Arc<ClientInner>,
}

impl AccountsService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// List all portfolio accounts visible to the credentials.
    pub async fn list(&self) -> Result<Vec<Account>> {
        self.inner.get("/portfolio/accounts").await
    }

    /// List the accounts the brokerage session may trade, with the
    /// currently selected one.
    pub async fn brokerage_accounts(&self) -> Result<BrokerageAccounts> {
        self.inner.get("/iserver/accounts").await
    }
}
