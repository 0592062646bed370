//! Nullable reward vault: a balance and a payout ledger.

use accrue_custody::{RewardTransfer, TransferError};
use accrue_types::AccountId;
use std::collections::HashMap;

/// Holds the pool's reward currency and records who was paid what.
#[derive(Clone, Debug, Default)]
pub struct NullRewardVault {
    balance: u128,
    paid: HashMap<AccountId, u128>,
}

impl NullRewardVault {
    pub fn funded(balance: u128) -> Self {
        Self {
            balance,
            paid: HashMap::new(),
        }
    }

    /// Top up the pool's balance.
    pub fn fund(&mut self, amount: u128) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Total paid to `account` so far.
    pub fn paid_to(&self, account: &AccountId) -> u128 {
        self.paid.get(account).copied().unwrap_or(0)
    }

    pub fn total_paid(&self) -> u128 {
        self.paid.values().sum()
    }
}

impl RewardTransfer for NullRewardVault {
    fn available(&self) -> u128 {
        self.balance
    }

    fn transfer(&mut self, to: &AccountId, amount: u128) -> Result<(), TransferError> {
        if amount > self.balance {
            return Err(TransferError::InsufficientPoolBalance {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        *self.paid.entry(to.clone()).or_default() += amount;
        Ok(())
    }
}
