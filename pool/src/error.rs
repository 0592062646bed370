//! Pool errors.
//!
//! Every error aborts the whole operation; no pool state is mutated on the
//! error path.

use accrue_custody::{CustodyError, TransferError};
use accrue_store::StoreError;
use accrue_types::{AccountId, PositionId, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("position {0} is not in a supported category")]
    InvalidAsset(PositionId),

    #[error("{caller} does not own position {position}")]
    NotOwner {
        position: PositionId,
        caller: AccountId,
    },

    #[error("pool is not approved to take position {position} from {owner}")]
    NotApproved {
        position: PositionId,
        owner: AccountId,
    },

    #[error("insufficient pool balance: requested {requested}, available {available}")]
    InsufficientPoolBalance { requested: u128, available: u128 },

    #[error("clock moved backwards: last update {last}, now {now}")]
    ClockRegression { last: Timestamp, now: Timestamp },

    #[error("position {0} appears more than once in the batch")]
    DuplicatePosition(PositionId),

    #[error("batch contains no positions")]
    EmptyBatch,

    #[error("position {0} does not exist")]
    UnknownPosition(PositionId),

    #[error("arithmetic overflow in reward accrual")]
    Overflow,

    #[error("pool invariant violated: {0}")]
    InvariantViolation(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CustodyError> for PoolError {
    fn from(e: CustodyError) -> Self {
        match e {
            CustodyError::UnknownPosition(position) => PoolError::UnknownPosition(position),
            CustodyError::NotOwner { position, caller } => PoolError::NotOwner { position, caller },
            CustodyError::NotApproved { position, owner } => {
                PoolError::NotApproved { position, owner }
            }
            CustodyError::NotHeld(position) => PoolError::InvariantViolation(format!(
                "position {position} recorded as held but custody does not have it"
            )),
        }
    }
}

impl From<TransferError> for PoolError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::InsufficientPoolBalance {
                requested,
                available,
            } => PoolError::InsufficientPoolBalance {
                requested,
                available,
            },
        }
    }
}
