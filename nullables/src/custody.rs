//! Nullable custody: an in-memory ownership registry.

use accrue_custody::{Custody, CustodyError};
use accrue_types::{AccountId, PositionId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One custody movement, recorded in call order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustodyRecord {
    TransferIn { from: AccountId, position: PositionId },
    TransferOut { position: PositionId, to: AccountId },
    ConsumerChanged { position: PositionId, consumer: Option<AccountId> },
}

/// Ownership registry for tests.
///
/// Positions are minted to owners up front. An owner must approve the
/// ledger (for all positions or one at a time) before deposits succeed.
/// While in custody a position reports [`NullCustody::LEDGER`] as its owner;
/// custody itself is tracked separately, so an account that happens to be
/// named `ledger` is an ordinary owner.
#[derive(Clone, Debug, Default)]
pub struct NullCustody {
    /// Last external owner of every minted position.
    owners: HashMap<PositionId, AccountId>,
    held: HashSet<PositionId>,
    approved_owners: HashSet<AccountId>,
    approved_positions: HashSet<PositionId>,
    consumers: HashMap<PositionId, AccountId>,
    records: Vec<CustodyRecord>,
}

impl NullCustody {
    /// Identity that owns positions while they are deposited.
    pub const LEDGER: &'static str = "ledger";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger_id() -> AccountId {
        AccountId::new(Self::LEDGER)
    }

    /// Create a position owned by `owner`.
    pub fn mint(&mut self, owner: &AccountId, position: PositionId) {
        self.owners.insert(position, owner.clone());
    }

    pub fn mint_many(&mut self, owner: &AccountId, positions: impl IntoIterator<Item = PositionId>) {
        for position in positions {
            self.mint(owner, position);
        }
    }

    /// Approve the ledger to move every position `owner` holds.
    pub fn approve_all(&mut self, owner: &AccountId) {
        self.approved_owners.insert(owner.clone());
    }

    pub fn revoke_all(&mut self, owner: &AccountId) {
        self.approved_owners.remove(owner);
    }

    /// Approve the ledger to move one position.
    pub fn approve(&mut self, position: PositionId) {
        self.approved_positions.insert(position);
    }

    pub fn is_held(&self, position: PositionId) -> bool {
        self.held.contains(&position)
    }

    pub fn consumer_of(&self, position: PositionId) -> Option<&AccountId> {
        self.consumers.get(&position)
    }

    /// Positions owned (outside the ledger) by `owner`, sorted.
    pub fn positions_of(&self, owner: &AccountId) -> Vec<PositionId> {
        let mut owned: Vec<PositionId> = self
            .owners
            .iter()
            .filter(|(p, o)| *o == owner && !self.held.contains(*p))
            .map(|(p, _)| *p)
            .collect();
        owned.sort();
        owned
    }

    /// Every custody movement so far, oldest first.
    pub fn records(&self) -> &[CustodyRecord] {
        &self.records
    }
}

impl Custody for NullCustody {
    fn owner_of(&self, position: PositionId) -> Result<AccountId, CustodyError> {
        let owner = self
            .owners
            .get(&position)
            .ok_or(CustodyError::UnknownPosition(position))?;
        if self.is_held(position) {
            Ok(Self::ledger_id())
        } else {
            Ok(owner.clone())
        }
    }

    fn ensure_transferable(
        &self,
        from: &AccountId,
        position: PositionId,
    ) -> Result<(), CustodyError> {
        let owner = self.owner_of(position)?;
        if self.is_held(position) || owner != *from {
            return Err(CustodyError::NotOwner {
                position,
                caller: from.clone(),
            });
        }
        if !self.approved_owners.contains(from) && !self.approved_positions.contains(&position) {
            return Err(CustodyError::NotApproved {
                position,
                owner: from.clone(),
            });
        }
        Ok(())
    }

    fn ensure_returnable(&self, position: PositionId) -> Result<(), CustodyError> {
        if self.is_held(position) {
            Ok(())
        } else {
            Err(CustodyError::NotHeld(position))
        }
    }

    fn transfer_in(&mut self, from: &AccountId, position: PositionId) -> Result<(), CustodyError> {
        self.ensure_transferable(from, position)?;
        self.held.insert(position);
        self.approved_positions.remove(&position);
        self.records.push(CustodyRecord::TransferIn {
            from: from.clone(),
            position,
        });
        Ok(())
    }

    fn transfer_out(&mut self, position: PositionId, to: &AccountId) -> Result<(), CustodyError> {
        self.ensure_returnable(position)?;
        self.held.remove(&position);
        self.owners.insert(position, to.clone());
        self.records.push(CustodyRecord::TransferOut {
            position,
            to: to.clone(),
        });
        Ok(())
    }

    fn set_consumer(
        &mut self,
        position: PositionId,
        consumer: Option<&AccountId>,
    ) -> Result<(), CustodyError> {
        if !self.owners.contains_key(&position) {
            return Err(CustodyError::UnknownPosition(position));
        }
        match consumer {
            Some(account) => self.consumers.insert(position, account.clone()),
            None => self.consumers.remove(&position),
        };
        self.records.push(CustodyRecord::ConsumerChanged {
            position,
            consumer: consumer.cloned(),
        });
        Ok(())
    }
}
