//! Collaborator errors.

use accrue_types::{AccountId, PositionId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    #[error("position {0} does not exist")]
    UnknownPosition(PositionId),

    #[error("{caller} does not own position {position}")]
    NotOwner {
        position: PositionId,
        caller: AccountId,
    },

    #[error("ledger is not approved to move position {position} for {owner}")]
    NotApproved {
        position: PositionId,
        owner: AccountId,
    },

    #[error("position {0} is not held by the ledger")]
    NotHeld(PositionId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("insufficient pool balance: requested {requested}, available {available}")]
    InsufficientPoolBalance { requested: u128, available: u128 },
}
