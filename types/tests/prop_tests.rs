use proptest::prelude::*;

use accrue_types::{AccountId, PoolParams, PositionId, Timestamp};

proptest! {
    /// PositionId survives its own textual form.
    #[test]
    fn position_id_display_parse(id in any::<u64>()) {
        let pos = PositionId::new(id);
        prop_assert_eq!(pos.to_string().parse::<PositionId>().unwrap(), pos);
    }

    /// Timestamp ordering matches the elapsed-time helper.
    #[test]
    fn elapsed_defined_iff_ordered(a in any::<u64>(), b in any::<u64>()) {
        let (ta, tb) = (Timestamp::new(a), Timestamp::new(b));
        prop_assert_eq!(ta.checked_elapsed_until(tb).is_some(), ta <= tb);
    }

    /// Max issuance never decreases as time moves forward.
    #[test]
    fn max_issuance_monotonic(
        rate in 0u128..1_000_000,
        t1 in 0u64..1_000_000,
        dt in 0u64..1_000_000,
    ) {
        let params = PoolParams::new(rate, Timestamp::EPOCH);
        let a = params.max_issuance(Timestamp::new(t1)).unwrap();
        let b = params.max_issuance(Timestamp::new(t1 + dt)).unwrap();
        prop_assert!(b >= a);
    }

    /// PoolParams bincode roundtrip keeps every field.
    #[test]
    fn params_bincode_roundtrip(rate in any::<u128>(), category in any::<u64>(), genesis in any::<u64>()) {
        let params = PoolParams::new(rate, Timestamp::new(genesis)).with_category(category);
        let encoded = bincode::serialize(&params).unwrap();
        let decoded: PoolParams = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, params);
    }

    /// Account ids parse back from their display form.
    #[test]
    fn account_id_display_parse(name in "[a-z][a-z0-9_]{0,20}") {
        let id = AccountId::new(name.clone());
        prop_assert_eq!(id.to_string().parse::<AccountId>().unwrap(), id);
    }
}
