//! Per-depositor ledger entry and settlement.

use crate::accumulator::Accumulator;
use crate::error::PoolError;
use crate::math::{add_u128, mul_div_floor};
use accrue_types::PRECISION;
use serde::{Deserialize, Serialize};

/// Ledger entry for one depositor.
///
/// Created on first deposit and never removed; a fully withdrawn and
/// claimed account simply has zero weight and zero rewards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Number of positions currently deposited by this account.
    pub weight: u64,
    /// Accumulator value at this account's last settlement.
    pub reward_per_weight_paid: u128,
    /// Settled, unclaimed reward.
    pub rewards: u128,
}

impl AccountState {
    /// Everything claimable against `acc`: settled rewards plus accrual since
    /// the last settlement at the current weight. Rounds down.
    ///
    /// `acc` must already be refreshed.
    pub fn earned(&self, acc: &Accumulator) -> Result<u128, PoolError> {
        let delta = acc
            .reward_per_weight
            .checked_sub(self.reward_per_weight_paid)
            .ok_or_else(|| {
                PoolError::InvariantViolation(format!(
                    "account snapshot {} ahead of accumulator {}",
                    self.reward_per_weight_paid, acc.reward_per_weight
                ))
            })?;
        let pending = mul_div_floor(delta, self.weight as u128, PRECISION)?;
        add_u128(pending, self.rewards)
    }

    /// This account with its pending reward crystallized into `rewards` and
    /// its snapshot moved to `acc`.
    ///
    /// Must be computed after the refresh and before the weight changes, so
    /// the elapsed interval is paid at the weight that was actually held.
    pub fn settled(&self, acc: &Accumulator) -> Result<Self, PoolError> {
        Ok(Self {
            weight: self.weight,
            reward_per_weight_paid: acc.reward_per_weight,
            rewards: self.earned(acc)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accrue_types::Timestamp;

    fn acc_at(reward_per_weight: u128) -> Accumulator {
        Accumulator {
            reward_per_weight,
            last_update: Timestamp::new(0),
        }
    }

    #[test]
    fn earned_combines_settled_and_pending() {
        let account = AccountState {
            weight: 4,
            reward_per_weight_paid: 10 * PRECISION,
            rewards: 7,
        };
        assert_eq!(account.earned(&acc_at(30 * PRECISION)).unwrap(), 4 * 20 + 7);
    }

    #[test]
    fn zero_weight_earns_only_settled_rewards() {
        let account = AccountState {
            weight: 0,
            reward_per_weight_paid: 0,
            rewards: 55,
        };
        assert_eq!(account.earned(&acc_at(1_000 * PRECISION)).unwrap(), 55);
    }

    #[test]
    fn settle_moves_snapshot_and_keeps_weight() {
        let account = AccountState {
            weight: 2,
            reward_per_weight_paid: 0,
            rewards: 0,
        };
        let acc = acc_at(50 * PRECISION);
        let settled = account.settled(&acc).unwrap();
        assert_eq!(settled.weight, 2);
        assert_eq!(settled.rewards, 100);
        assert_eq!(settled.reward_per_weight_paid, acc.reward_per_weight);
        // settling twice against the same accumulator changes nothing
        assert_eq!(settled.settled(&acc).unwrap(), settled);
    }

    #[test]
    fn pending_rounds_down() {
        let account = AccountState {
            weight: 1,
            reward_per_weight_paid: 0,
            rewards: 0,
        };
        assert_eq!(account.earned(&acc_at(PRECISION - 1)).unwrap(), 0);
        assert_eq!(account.earned(&acc_at(3 * PRECISION / 2)).unwrap(), 1);
    }

    #[test]
    fn snapshot_ahead_of_accumulator_is_an_invariant_violation() {
        let account = AccountState {
            weight: 1,
            reward_per_weight_paid: 10,
            rewards: 0,
        };
        assert!(matches!(
            account.earned(&acc_at(5)),
            Err(PoolError::InvariantViolation(_))
        ));
    }
}
