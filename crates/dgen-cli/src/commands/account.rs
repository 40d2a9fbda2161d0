use anyhow::{Result, bail};
use dgen_core::account::{Account, AccountRepository};

use super::with_status;
use crate::bootstrap::AppBootstrap;

pub async fn create(app: &AppBootstrap, id: &str, balance: i64) -> Result<()> {
    if id.trim().is_empty() {
        bail!("account id must not be empty");
    }
    if balance < 0 {
        bail!("balance must not be negative");
    }
    if app.accounts.find_by_id(id).await?.is_some() {
        bail!("account '{}' already exists", id);
    }

    app.accounts.save(&Account::new(id, balance)).await?;
    println!("Created account {} with balance {}", id, balance);
    Ok(())
}

pub async fn show(app: &AppBootstrap, id: &str) -> Result<()> {
    let account = app
        .accounts
        .find_by_id(id)
        .await?
        .ok_or_else(|| with_status(dgen_core::DgenError::not_found("account", id)))?;
    println!("{}\tbalance {}", account.id, account.balance);
    Ok(())
}
