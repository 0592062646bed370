//! Proportional reward accrual over deposited positions.
//!
//! A pool streams `reward_rate` units per second to its depositors, split in
//! proportion to how many positions each one has deposited:
//! `earned(a) = weight(a) × (acc − acc_paid(a)) / PRECISION + rewards(a)`
//!
//! This crate handles:
//! - The global reward-per-weight accumulator, refreshed lazily on every call
//! - Per-account settlement against that accumulator
//! - Batch deposit and withdrawal of positions through a custody collaborator
//! - Reward claims through a payout collaborator
//! - Persisting pool state to a [`accrue_store::PoolStore`]

pub mod account;
pub mod accumulator;
pub mod error;
pub mod event;
pub mod math;
pub mod pool;

pub use account::AccountState;
pub use accumulator::Accumulator;
pub use error::PoolError;
pub use event::{EventBus, PoolEvent};
pub use pool::{PoolInfo, StakingPool};
