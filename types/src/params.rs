//! Pool parameters fixed at construction.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Fixed-point scale of the reward-per-weight accumulator.
///
/// Accrual per unit weight is stored multiplied by this factor so that
/// fractional shares survive integer division. Every division rounds toward
/// zero. At this scale a single unit of weight can accumulate up to ~3.4e26
/// reward units before the accumulator saturates.
pub const PRECISION: u128 = 1_000_000_000_000;

/// Parameters of a staking pool. Immutable once the pool exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    /// Reward units issued per second across the whole pool.
    pub reward_rate: u128,

    /// Identifier of the collection/category whose positions may be deposited.
    /// Every deposited position is checked against it by the category
    /// validator; the pool itself never interprets it.
    #[serde(default = "default_category_id")]
    pub category_id: u64,

    /// Pool inception; the accumulator's `last_update` starts here.
    #[serde(default)]
    pub genesis: Timestamp,
}

fn default_category_id() -> u64 {
    1
}

impl PoolParams {
    pub fn new(reward_rate: u128, genesis: Timestamp) -> Self {
        Self {
            reward_rate,
            category_id: default_category_id(),
            genesis,
        }
    }

    pub fn with_category(mut self, category_id: u64) -> Self {
        self.category_id = category_id;
        self
    }

    /// Upper bound on reward issued between genesis and `now`.
    pub fn max_issuance(&self, now: Timestamp) -> Option<u128> {
        let elapsed = self.genesis.checked_elapsed_until(now)?;
        self.reward_rate.checked_mul(elapsed as u128)
    }
}

impl Default for PoolParams {
    fn default() -> Self {
        Self::new(100, Timestamp::EPOCH)
    }
}
