//! Nullable store: thread-safe in-memory pool storage for testing.

use accrue_store::{PoolStore, StoreError};
use accrue_types::{AccountId, PositionId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// An in-memory [`PoolStore`].
#[derive(Default)]
pub struct NullStore {
    accounts: Mutex<HashMap<AccountId, Vec<u8>>>,
    positions: Mutex<HashMap<PositionId, AccountId>>,
    meta: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_count(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.accounts)?.len())
    }
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    m.lock()
        .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
}

impl PoolStore for NullStore {
    fn get_account_state(&self, account: &AccountId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.accounts)?.get(account).cloned())
    }

    fn put_account_state(&self, account: &AccountId, state: &[u8]) -> Result<(), StoreError> {
        lock(&self.accounts)?.insert(account.clone(), state.to_vec());
        Ok(())
    }

    fn iter_account_states(&self) -> Result<Vec<(AccountId, Vec<u8>)>, StoreError> {
        Ok(lock(&self.accounts)?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn put_position_owner(&self, position: PositionId, owner: &AccountId) -> Result<(), StoreError> {
        lock(&self.positions)?.insert(position, owner.clone());
        Ok(())
    }

    fn delete_position_owner(&self, position: PositionId) -> Result<(), StoreError> {
        lock(&self.positions)?.remove(&position);
        Ok(())
    }

    fn iter_position_owners(&self) -> Result<Vec<(PositionId, AccountId)>, StoreError> {
        Ok(lock(&self.positions)?
            .iter()
            .map(|(p, o)| (*p, o.clone()))
            .collect())
    }

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.meta)?.get(key).cloned())
    }

    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        lock(&self.meta)?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_owners_can_be_deleted() {
        let store = NullStore::new();
        let alice = AccountId::new("alice");
        store.put_position_owner(PositionId::new(1), &alice).unwrap();
        store.put_position_owner(PositionId::new(2), &alice).unwrap();
        store.delete_position_owner(PositionId::new(1)).unwrap();

        let owners = store.iter_position_owners().unwrap();
        assert_eq!(owners, vec![(PositionId::new(2), alice)]);
    }

    #[test]
    fn meta_roundtrip() {
        let store = NullStore::new();
        assert_eq!(store.get_meta(b"k").unwrap(), None);
        store.put_meta(b"k", b"v").unwrap();
        assert_eq!(store.get_meta(b"k").unwrap(), Some(b"v".to_vec()));
    }
}
