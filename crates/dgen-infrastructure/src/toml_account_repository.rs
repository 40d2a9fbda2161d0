//! TOML-based AccountRepository implementation

use crate::storage::DocumentDir;
use async_trait::async_trait;
use dgen_core::account::{Account, AccountRepository};
use dgen_core::{DgenError, Result};
use std::path::Path;

/// Stores each account as `accounts/<id>.toml`.
///
/// `debit` runs under the document's file lock, so concurrent debits from
/// separate processes cannot lose an update.
pub struct TomlAccountRepository {
    documents: DocumentDir<Account>,
}

impl TomlAccountRepository {
    pub fn new(accounts_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            documents: DocumentDir::open(accounts_dir, "account")?,
        })
    }
}

#[async_trait]
impl AccountRepository for TomlAccountRepository {
    async fn find_by_id(&self, account_id: &str) -> Result<Option<Account>> {
        self.documents.load(account_id)
    }

    async fn save(&self, account: &Account) -> Result<()> {
        self.documents.save(&account.id, account)
    }

    async fn debit(&self, account_id: &str, cost: i64) -> Result<i64> {
        self.documents
            .file(account_id)?
            .update(|account: &mut Account| account.debit(cost))?
            .ok_or_else(|| DgenError::not_found("account", account_id))
    }
}
