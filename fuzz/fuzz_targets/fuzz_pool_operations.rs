#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use accrue_custody::RewardTransfer;
use accrue_nullables::{NullCustody, NullRewardVault, NullValidator};
use accrue_pool::StakingPool;
use accrue_types::{AccountId, PoolParams, PositionId, Timestamp};

const ACCOUNTS: u8 = 4;
const POSITIONS_PER_ACCOUNT: u64 = 8;

#[derive(Arbitrary, Debug)]
enum Op {
    Deposit { account: u8, positions: Vec<u8> },
    Withdraw { account: u8, positions: Vec<u8> },
    Claim { account: u8 },
    /// Seconds to move the clock; large values probe overflow handling.
    Wait(u32),
    /// Move the clock backwards.
    Rewind(u16),
}

#[derive(Arbitrary, Debug)]
struct Input {
    reward_rate: u32,
    funding: u64,
    ops: Vec<Op>,
}

fn account(index: u8) -> AccountId {
    AccountId::new(format!("acct-{}", index % ACCOUNTS))
}

fn positions(account: u8, raw: &[u8]) -> Vec<PositionId> {
    // Mostly the caller's own positions, sometimes someone else's.
    raw.iter()
        .map(|&p| {
            let owner = if p & 0x80 != 0 { account.wrapping_add(1) } else { account };
            let base = u64::from(owner % ACCOUNTS) * POSITIONS_PER_ACCOUNT;
            PositionId::new(base + u64::from(p) % POSITIONS_PER_ACCOUNT)
        })
        .collect()
}

// Drive arbitrary operation sequences through the pool. Operations may be
// rejected, but none may panic and the bookkeeping must always hold.
fuzz_target!(|input: Input| {
    let mut custody = NullCustody::new();
    for a in 0..ACCOUNTS {
        let owner = account(a);
        let base = u64::from(a) * POSITIONS_PER_ACCOUNT;
        custody.mint_many(&owner, (base..base + POSITIONS_PER_ACCOUNT).map(PositionId::new));
        custody.approve_all(&owner);
    }
    let params = PoolParams::new(u128::from(input.reward_rate), Timestamp::EPOCH);
    let mut pool = StakingPool::new(
        params.clone(),
        custody,
        NullValidator::accept_all(),
        NullRewardVault::funded(u128::from(input.funding)),
    );

    let mut now = 0u64;
    for op in input.ops.iter().take(256) {
        let before = pool.total_weight();
        let result = match op {
            Op::Deposit { account: a, positions: raw } => {
                pool.deposit(&account(*a), &positions(*a, raw), Timestamp::new(now))
            }
            Op::Withdraw { account: a, positions: raw } => {
                pool.withdraw(&account(*a), &positions(*a, raw), Timestamp::new(now))
            }
            Op::Claim { account: a } => pool.claim(&account(*a), Timestamp::new(now)).map(|_| ()),
            Op::Wait(secs) => {
                now = now.saturating_add(u64::from(*secs));
                Ok(())
            }
            Op::Rewind(secs) => {
                now = now.saturating_sub(u64::from(*secs));
                Ok(())
            }
        };
        if result.is_err() {
            assert_eq!(pool.total_weight(), before);
        }
        pool.check_invariants().expect("bookkeeping holds");
    }

    let last = pool.accumulator().last_update;
    if let Some(issued) = params.max_issuance(last) {
        assert!(pool.total_paid() <= issued);
    }
    assert_eq!(
        pool.payout().available() + pool.total_paid(),
        u128::from(input.funding)
    );
});
