//! Account repository trait.

use super::model::Account;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, account_id: &str) -> Result<Option<Account>>;

    async fn save(&self, account: &Account) -> Result<()>;

    /// Subtracts `cost` and returns the new balance.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account does not exist
    /// - `InsufficientBalance` if the balance would go negative; nothing is
    ///   written in that case
    async fn debit(&self, account_id: &str, cost: i64) -> Result<i64>;
}
