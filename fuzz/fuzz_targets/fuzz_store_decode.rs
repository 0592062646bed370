#![no_main]

use libfuzzer_sys::fuzz_target;

use accrue_nullables::{NullCustody, NullRewardVault, NullStore, NullValidator};
use accrue_pool::StakingPool;
use accrue_store::PoolStore;
use accrue_types::{AccountId, PositionId};

// Feed arbitrary bytes into every stored record and restore a pool from
// them. Corrupt input must surface as an error, never a panic.
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let (head, rest) = data.split_at(data.len() / 2);
    let store = NullStore::new();
    let _ = store.put_meta(b"params", head);
    let _ = store.put_meta(b"accumulator", rest);
    let _ = store.put_meta(b"total_paid", &rest[..rest.len().min(16)]);
    let _ = store.put_account_state(&AccountId::new("fuzz"), rest);
    let _ = store.put_position_owner(PositionId::new(u64::from(data[0])), &AccountId::new("fuzz"));

    if let Ok(pool) = StakingPool::load_from_store(
        &store,
        NullCustody::new(),
        NullValidator::accept_all(),
        NullRewardVault::default(),
    ) {
        let _ = pool.check_invariants();
    }
});
