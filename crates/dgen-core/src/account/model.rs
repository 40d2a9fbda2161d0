//! Account domain model.

use crate::error::{DgenError, Result};
use serde::{Deserialize, Serialize};

/// Balance units charged for one completed generation.
pub const USAGE_COST: i64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    /// Consumable credit units
    pub balance: i64,
}

impl Account {
    pub fn new(id: impl Into<String>, balance: i64) -> Self {
        Self {
            id: id.into(),
            balance,
        }
    }

    pub fn can_afford(&self, cost: i64) -> bool {
        self.balance >= cost
    }

    /// Fails with `InsufficientBalance` if `cost` is not covered. The balance
    /// is left untouched on failure.
    pub fn ensure_affordable(&self, cost: i64) -> Result<()> {
        if self.can_afford(cost) {
            Ok(())
        } else {
            Err(DgenError::InsufficientBalance {
                required: cost,
                available: self.balance,
            })
        }
    }

    pub fn debit(&mut self, cost: i64) -> Result<i64> {
        self.ensure_affordable(cost)?;
        self.balance -= cost;
        Ok(self.balance)
    }
}
