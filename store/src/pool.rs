use accrue_types::{AccountId, PositionId};
use crate::StoreError;

/// Store trait for persisting staking pool state.
///
/// Values are opaque `Vec<u8>` so the store doesn't depend on the pool crate.
/// The pool serializes and deserializes its own types.
pub trait PoolStore {
    fn get_account_state(&self, account: &AccountId) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_account_state(&self, account: &AccountId, state: &[u8]) -> Result<(), StoreError>;
    fn iter_account_states(&self) -> Result<Vec<(AccountId, Vec<u8>)>, StoreError>;

    fn put_position_owner(&self, position: PositionId, owner: &AccountId) -> Result<(), StoreError>;
    fn delete_position_owner(&self, position: PositionId) -> Result<(), StoreError>;
    fn iter_position_owners(&self) -> Result<Vec<(PositionId, AccountId)>, StoreError>;

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
}
