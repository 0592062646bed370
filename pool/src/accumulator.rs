//! Global reward-per-weight accumulator.

use crate::error::PoolError;
use crate::math::{add_u128, mul_div_floor};
use accrue_types::{Timestamp, PRECISION};
use serde::{Deserialize, Serialize};

/// Cumulative reward issued per unit of weight since pool inception.
///
/// `reward_per_weight` is scaled by [`PRECISION`]. Both fields only ever move
/// forward; intervals during which total weight is zero add nothing and
/// their reward is never issued to anyone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accumulator {
    pub reward_per_weight: u128,
    pub last_update: Timestamp,
}

impl Accumulator {
    pub fn new(genesis: Timestamp) -> Self {
        Self {
            reward_per_weight: 0,
            last_update: genesis,
        }
    }

    /// The accumulator brought forward to `now`.
    ///
    /// `reward_per_weight += dt × rate × PRECISION / total_weight`, rounded
    /// down, so the reward credited per interval never exceeds
    /// `dt × rate`. With zero weight only `last_update` moves.
    pub fn refreshed(
        &self,
        now: Timestamp,
        total_weight: u64,
        reward_rate: u128,
    ) -> Result<Self, PoolError> {
        let dt = self
            .last_update
            .checked_elapsed_until(now)
            .ok_or(PoolError::ClockRegression {
                last: self.last_update,
                now,
            })?;

        let mut reward_per_weight = self.reward_per_weight;
        if total_weight > 0 && dt > 0 {
            let issued = (dt as u128)
                .checked_mul(reward_rate)
                .ok_or(PoolError::Overflow)?;
            let increment = mul_div_floor(issued, PRECISION, total_weight as u128)?;
            reward_per_weight = add_u128(reward_per_weight, increment)?;
        }

        Ok(Self {
            reward_per_weight,
            last_update: now,
        })
    }

    /// Refresh in place. Nothing changes on error.
    pub fn refresh(
        &mut self,
        now: Timestamp,
        total_weight: u64,
        reward_rate: u128,
    ) -> Result<(), PoolError> {
        *self = self.refreshed(now, total_weight, reward_rate)?;
        Ok(())
    }
}
