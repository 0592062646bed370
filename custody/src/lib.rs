//! Capability traits the staking pool calls out to.
//!
//! The pool never moves items or currency itself. Custody of deposited
//! positions, validation of their category and payout of rewards are owned
//! by collaborators behind these traits:
//! - [`Custody`]: ownership lookups, transfers in/out, consumer marking
//! - [`CategoryValidator`]: whether a position belongs to a supported category
//! - [`RewardTransfer`]: paying reward currency out of the pool's balance
//!
//! All collaborators are synchronous and either fully succeed or fail
//! without side effects.

pub mod error;

pub use error::{CustodyError, TransferError};

use accrue_types::{AccountId, PositionId};

/// Ownership and transfer of depositable positions.
pub trait Custody {
    /// Current external owner of a position.
    fn owner_of(&self, position: PositionId) -> Result<AccountId, CustodyError>;

    /// Check, without side effects, that `from` could hand `position` to the
    /// ledger right now.
    fn ensure_transferable(&self, from: &AccountId, position: PositionId)
        -> Result<(), CustodyError>;

    /// Check, without side effects, that the ledger currently has custody of
    /// `position` and could hand it back.
    fn ensure_returnable(&self, position: PositionId) -> Result<(), CustodyError>;

    /// Move `position` from `from` into the ledger's custody.
    fn transfer_in(&mut self, from: &AccountId, position: PositionId) -> Result<(), CustodyError>;

    /// Return `position` from the ledger's custody to `to`.
    fn transfer_out(&mut self, position: PositionId, to: &AccountId) -> Result<(), CustodyError>;

    /// Record (or clear, with `None`) who holds usage rights over a position
    /// while the ledger has custody of it.
    fn set_consumer(
        &mut self,
        position: PositionId,
        consumer: Option<&AccountId>,
    ) -> Result<(), CustodyError>;
}

/// Category/registry check applied once per position at deposit time.
pub trait CategoryValidator {
    /// Whether `position` belongs to the collection `category_id` and the
    /// registry accepts it.
    fn is_supported(&self, category_id: u64, position: PositionId) -> bool;
}

/// Payout of reward currency from the pool's balance.
pub trait RewardTransfer {
    /// Reward currency currently held by the pool.
    fn available(&self) -> u128;

    /// Pay `amount` to `to`. Never partially fills.
    fn transfer(&mut self, to: &AccountId, amount: u128) -> Result<(), TransferError>;
}
