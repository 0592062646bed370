//! The staking pool: accrual engine and account ledger behind one API.

use crate::account::AccountState;
use crate::accumulator::Accumulator;
use crate::error::PoolError;
use crate::event::{EventBus, PoolEvent};
use accrue_custody::{CategoryValidator, Custody, CustodyError, RewardTransfer};
use accrue_store::{PoolStore, StoreError};
use accrue_types::{AccountId, PoolParams, PositionId, Timestamp};
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, warn};

/// Snapshot of pool-wide figures, refreshed to the query time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolInfo {
    pub reward_rate: u128,
    pub category_id: u64,
    pub total_weight: u64,
    pub reward_per_weight: u128,
    pub last_update: Timestamp,
    pub total_paid: u128,
    pub accounts: usize,
    pub positions: usize,
}

/// A single-reward staking pool over discrete positions.
///
/// Every mutating call refreshes the accumulator to `now`, settles the
/// calling account against it and only then changes weight or pays out.
/// Validation runs before any of that, so a rejected call leaves the pool
/// exactly as it was.
///
/// Calls take `&mut self`; the host serializes them. There are no locks and
/// no suspension points inside an operation.
pub struct StakingPool<C, V, R> {
    params: PoolParams,
    accumulator: Accumulator,
    total_weight: u64,
    accounts: HashMap<AccountId, AccountState>,
    /// Recorded depositor of every position the pool currently holds.
    positions: HashMap<PositionId, AccountId>,
    /// Reward paid out over the pool's lifetime.
    total_paid: u128,
    custody: C,
    validator: V,
    payout: R,
    events: Vec<PoolEvent>,
    bus: EventBus,
}

impl<C, V, R> StakingPool<C, V, R>
where
    C: Custody,
    V: CategoryValidator,
    R: RewardTransfer,
{
    pub fn new(params: PoolParams, custody: C, validator: V, payout: R) -> Self {
        Self {
            accumulator: Accumulator::new(params.genesis),
            params,
            total_weight: 0,
            accounts: HashMap::new(),
            positions: HashMap::new(),
            total_paid: 0,
            custody,
            validator,
            payout,
            events: Vec::new(),
            bus: EventBus::new(),
        }
    }

    // ── Reads ──────────────────────────────────────────────────────────

    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    pub fn reward_rate(&self) -> u128 {
        self.params.reward_rate
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Number of positions `account` has deposited (0 for unknown accounts).
    pub fn weight_of(&self, account: &AccountId) -> u64 {
        self.accounts.get(account).map(|a| a.weight).unwrap_or(0)
    }

    /// Stored ledger entry, as of the account's last settlement.
    pub fn account(&self, account: &AccountId) -> Option<&AccountState> {
        self.accounts.get(account)
    }

    /// Depositor currently recorded for `position`, if the pool holds it.
    pub fn holder_of(&self, position: PositionId) -> Option<&AccountId> {
        self.positions.get(&position)
    }

    /// Accumulator as last committed (not refreshed).
    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    pub fn total_paid(&self) -> u128 {
        self.total_paid
    }

    /// Accumulator value as of `now`. Does not mutate the pool.
    pub fn reward_per_weight(&self, now: Timestamp) -> Result<u128, PoolError> {
        Ok(self.refreshed(now)?.reward_per_weight)
    }

    /// Reward `account` could claim at `now`. Does not mutate the pool.
    pub fn earned(&self, account: &AccountId, now: Timestamp) -> Result<u128, PoolError> {
        let acc = self.refreshed(now)?;
        match self.accounts.get(account) {
            Some(entry) => entry.earned(&acc),
            None => Ok(0),
        }
    }

    pub fn info(&self, now: Timestamp) -> Result<PoolInfo, PoolError> {
        let acc = self.refreshed(now)?;
        Ok(PoolInfo {
            reward_rate: self.params.reward_rate,
            category_id: self.params.category_id,
            total_weight: self.total_weight,
            reward_per_weight: acc.reward_per_weight,
            last_update: acc.last_update,
            total_paid: self.total_paid,
            accounts: self.accounts.len(),
            positions: self.positions.len(),
        })
    }

    /// Every event emitted so far, oldest first.
    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&PoolEvent) + Send + Sync>) {
        self.bus.subscribe(listener);
    }

    pub fn custody(&self) -> &C {
        &self.custody
    }

    pub fn custody_mut(&mut self) -> &mut C {
        &mut self.custody
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    pub fn payout(&self) -> &R {
        &self.payout
    }

    pub fn payout_mut(&mut self) -> &mut R {
        &mut self.payout
    }

    // ── Mutations ──────────────────────────────────────────────────────

    /// Deposit `positions` for `account`, all or nothing.
    ///
    /// Each position must be in a supported category, owned by `account`
    /// and approved for transfer to the pool.
    pub fn deposit(
        &mut self,
        account: &AccountId,
        positions: &[PositionId],
        now: Timestamp,
    ) -> Result<(), PoolError> {
        self.try_deposit(account, positions, now)
            .map_err(|e| rejected("deposit", account, e))
    }

    /// Withdraw `positions` back to `account`, all or nothing.
    ///
    /// Every position must currently be held for `account`.
    pub fn withdraw(
        &mut self,
        account: &AccountId,
        positions: &[PositionId],
        now: Timestamp,
    ) -> Result<(), PoolError> {
        self.try_withdraw(account, positions, now)
            .map_err(|e| rejected("withdraw", account, e))
    }

    /// Pay out everything `account` has earned. Returns the amount paid.
    ///
    /// Nothing to pay is a successful no-op that leaves the pool untouched.
    pub fn claim(&mut self, account: &AccountId, now: Timestamp) -> Result<u128, PoolError> {
        self.try_claim(account, now)
            .map_err(|e| rejected("claim", account, e))
    }

    fn try_deposit(
        &mut self,
        account: &AccountId,
        positions: &[PositionId],
        now: Timestamp,
    ) -> Result<(), PoolError> {
        let acc = self.refreshed(now)?;
        check_batch(positions)?;
        for &position in positions {
            if self.positions.contains_key(&position) {
                return Err(PoolError::NotOwner {
                    position,
                    caller: account.clone(),
                });
            }
            if !self.validator.is_supported(self.params.category_id, position) {
                return Err(PoolError::InvalidAsset(position));
            }
            self.custody.ensure_transferable(account, position)?;
        }

        let mut entry = self
            .accounts
            .get(account)
            .copied()
            .unwrap_or_default()
            .settled(&acc)?;
        let added = positions.len() as u64;
        entry.weight = entry.weight.checked_add(added).ok_or(PoolError::Overflow)?;
        let total_weight = self
            .total_weight
            .checked_add(added)
            .ok_or(PoolError::Overflow)?;

        for (taken, &position) in positions.iter().enumerate() {
            if let Err(e) = self.take_position(account, position) {
                self.undo_takes(account, &positions[..taken]);
                return Err(collaborator_broke(e));
            }
        }

        self.accumulator = acc;
        self.accounts.insert(account.clone(), entry);
        for &position in positions {
            self.positions.insert(position, account.clone());
        }
        self.total_weight = total_weight;

        info!(
            account = %account,
            count = positions.len(),
            account_weight = entry.weight,
            total_weight,
            "positions deposited"
        );
        self.emit(PoolEvent::Staked {
            account: account.clone(),
            positions: positions.to_vec(),
            account_weight: entry.weight,
            total_weight,
            at: now,
        });
        Ok(())
    }

    fn try_withdraw(
        &mut self,
        account: &AccountId,
        positions: &[PositionId],
        now: Timestamp,
    ) -> Result<(), PoolError> {
        let acc = self.refreshed(now)?;
        check_batch(positions)?;
        for &position in positions {
            match self.positions.get(&position) {
                Some(holder) if holder == account => {}
                _ => {
                    return Err(PoolError::NotOwner {
                        position,
                        caller: account.clone(),
                    })
                }
            }
            self.custody.ensure_returnable(position)?;
        }

        let mut entry = self
            .accounts
            .get(account)
            .copied()
            .ok_or_else(|| {
                PoolError::InvariantViolation(format!("{account} holds positions but has no entry"))
            })?
            .settled(&acc)?;
        let removed = positions.len() as u64;
        entry.weight = entry.weight.checked_sub(removed).ok_or_else(|| {
            PoolError::InvariantViolation(format!("{account} weight below its position count"))
        })?;
        let total_weight = self.total_weight.checked_sub(removed).ok_or_else(|| {
            PoolError::InvariantViolation("total weight below position count".into())
        })?;

        for (returned, &position) in positions.iter().enumerate() {
            if let Err(e) = self.return_position(account, position) {
                self.undo_returns(account, &positions[..returned]);
                return Err(collaborator_broke(e));
            }
        }

        self.accumulator = acc;
        self.accounts.insert(account.clone(), entry);
        for position in positions {
            self.positions.remove(position);
        }
        self.total_weight = total_weight;

        info!(
            account = %account,
            count = positions.len(),
            account_weight = entry.weight,
            total_weight,
            "positions withdrawn"
        );
        self.emit(PoolEvent::Withdrawn {
            account: account.clone(),
            positions: positions.to_vec(),
            account_weight: entry.weight,
            total_weight,
            at: now,
        });
        Ok(())
    }

    fn try_claim(&mut self, account: &AccountId, now: Timestamp) -> Result<u128, PoolError> {
        let acc = self.refreshed(now)?;
        let Some(current) = self.accounts.get(account).copied() else {
            debug!(account = %account, "claim by unknown account, nothing to pay");
            return Ok(0);
        };
        let mut entry = current.settled(&acc)?;
        let amount = entry.rewards;
        if amount == 0 {
            debug!(account = %account, "claim with nothing pending");
            return Ok(0);
        }

        let total_paid = self
            .total_paid
            .checked_add(amount)
            .ok_or(PoolError::Overflow)?;
        self.payout.transfer(account, amount)?;

        entry.rewards = 0;
        self.accumulator = acc;
        self.accounts.insert(account.clone(), entry);
        self.total_paid = total_paid;

        info!(account = %account, amount, "rewards claimed");
        self.emit(PoolEvent::RewardsClaimed {
            account: account.clone(),
            amount,
            at: now,
        });
        Ok(amount)
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn refreshed(&self, now: Timestamp) -> Result<Accumulator, PoolError> {
        let acc = self
            .accumulator
            .refreshed(now, self.total_weight, self.params.reward_rate)?;
        debug!(
            reward_per_weight = acc.reward_per_weight,
            last_update = acc.last_update.as_secs(),
            total_weight = self.total_weight,
            "accumulator refreshed"
        );
        Ok(acc)
    }

    // ── Custody moves ──────────────────────────────────────────────────
    //
    // A position is either fully moved (transfer plus consumer mark) or left
    // where it was. When a batch fails partway, the positions already moved
    // are moved back so pool records and custody keep agreeing.

    fn take_position(&mut self, account: &AccountId, position: PositionId) -> Result<(), CustodyError> {
        self.custody.transfer_in(account, position)?;
        if let Err(e) = self.custody.set_consumer(position, Some(account)) {
            let undone = self.custody.transfer_out(position, account);
            rolled_back(position, undone);
            return Err(e);
        }
        Ok(())
    }

    fn return_position(&mut self, account: &AccountId, position: PositionId) -> Result<(), CustodyError> {
        self.custody.set_consumer(position, None)?;
        if let Err(e) = self.custody.transfer_out(position, account) {
            let undone = self.custody.set_consumer(position, Some(account));
            rolled_back(position, undone);
            return Err(e);
        }
        Ok(())
    }

    fn undo_takes(&mut self, account: &AccountId, taken: &[PositionId]) {
        for &position in taken.iter().rev() {
            let undone = self
                .custody
                .set_consumer(position, None)
                .and_then(|()| self.custody.transfer_out(position, account));
            rolled_back(position, undone);
        }
    }

    fn undo_returns(&mut self, account: &AccountId, returned: &[PositionId]) {
        for &position in returned.iter().rev() {
            let undone = self
                .custody
                .transfer_in(account, position)
                .and_then(|()| self.custody.set_consumer(position, Some(account)));
            rolled_back(position, undone);
        }
    }

    fn emit(&mut self, event: PoolEvent) {
        self.bus.emit(&event);
        self.events.push(event);
    }

    /// Verify the weight bookkeeping and the payout bound.
    pub fn check_invariants(&self) -> Result<(), PoolError> {
        let summed = self
            .accounts
            .values()
            .try_fold(0u64, |sum, a| sum.checked_add(a.weight))
            .ok_or(PoolError::Overflow)?;
        if summed != self.total_weight {
            return Err(PoolError::InvariantViolation(format!(
                "total weight {} != sum of account weights {}",
                self.total_weight, summed
            )));
        }

        let mut held: HashMap<&AccountId, u64> = HashMap::new();
        for owner in self.positions.values() {
            *held.entry(owner).or_default() += 1;
        }
        for (account, entry) in &self.accounts {
            let count = held.get(account).copied().unwrap_or(0);
            if count != entry.weight {
                return Err(PoolError::InvariantViolation(format!(
                    "{account} has weight {} but holds {count} positions",
                    entry.weight
                )));
            }
        }
        if let Some(orphan) = held.keys().find(|a| !self.accounts.contains_key(**a)) {
            return Err(PoolError::InvariantViolation(format!(
                "{orphan} holds positions but has no ledger entry"
            )));
        }

        if self.accumulator.last_update < self.params.genesis {
            return Err(PoolError::InvariantViolation(
                "accumulator predates genesis".into(),
            ));
        }
        if let Some(cap) = self.params.max_issuance(self.accumulator.last_update) {
            if self.total_paid > cap {
                return Err(PoolError::InvariantViolation(format!(
                    "paid {} exceeds maximum issuance {}",
                    self.total_paid, cap
                )));
            }
        }
        Ok(())
    }
}

impl<C, V, R> StakingPool<C, V, R>
where
    C: Custody,
    V: CategoryValidator,
    R: RewardTransfer,
{
    /// Persist all pool state to a store.
    ///
    /// Positions no longer held are deleted from the store.
    pub fn save_to_store(&self, store: &dyn PoolStore) -> Result<(), PoolError> {
        store.put_meta(b"params", &encode(&self.params)?)?;
        store.put_meta(b"accumulator", &encode(&self.accumulator)?)?;
        store.put_meta(b"total_paid", &self.total_paid.to_be_bytes())?;

        for (account, entry) in &self.accounts {
            store.put_account_state(account, &encode(entry)?)?;
        }
        for (position, _) in store.iter_position_owners()? {
            if !self.positions.contains_key(&position) {
                store.delete_position_owner(position)?;
            }
        }
        for (position, owner) in &self.positions {
            store.put_position_owner(*position, owner)?;
        }
        debug!(
            accounts = self.accounts.len(),
            positions = self.positions.len(),
            "pool state saved"
        );
        Ok(())
    }

    /// Restore a pool from a store, attaching fresh collaborators.
    ///
    /// Total weight is recomputed from the account entries and the restored
    /// state is checked against the pool invariants before it is returned.
    pub fn load_from_store(
        store: &dyn PoolStore,
        custody: C,
        validator: V,
        payout: R,
    ) -> Result<Self, PoolError> {
        let params: PoolParams = match store.get_meta(b"params")? {
            Some(bytes) => decode(&bytes)?,
            None => return Err(StoreError::NotFound("params".into()).into()),
        };
        let accumulator = match store.get_meta(b"accumulator")? {
            Some(bytes) => decode(&bytes)?,
            None => Accumulator::new(params.genesis),
        };
        let total_paid = match store.get_meta(b"total_paid")? {
            Some(bytes) => {
                let raw: [u8; 16] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Corruption(format!("total_paid has {} bytes", bytes.len()))
                })?;
                u128::from_be_bytes(raw)
            }
            None => 0,
        };

        let mut accounts = HashMap::new();
        let mut total_weight = 0u64;
        for (account, bytes) in store.iter_account_states()? {
            let entry: AccountState = decode(&bytes)?;
            total_weight = total_weight
                .checked_add(entry.weight)
                .ok_or(PoolError::Overflow)?;
            accounts.insert(account, entry);
        }
        let positions: HashMap<PositionId, AccountId> =
            store.iter_position_owners()?.into_iter().collect();

        let pool = Self {
            params,
            accumulator,
            total_weight,
            accounts,
            positions,
            total_paid,
            custody,
            validator,
            payout,
            events: Vec::new(),
            bus: EventBus::new(),
        };
        pool.check_invariants()?;
        Ok(pool)
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, PoolError> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()).into())
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, PoolError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()).into())
}

/// Reject empty batches and repeated ids before anything else looks at them.
fn check_batch(positions: &[PositionId]) -> Result<(), PoolError> {
    if positions.is_empty() {
        return Err(PoolError::EmptyBatch);
    }
    let mut seen = HashSet::with_capacity(positions.len());
    for &position in positions {
        if !seen.insert(position) {
            return Err(PoolError::DuplicatePosition(position));
        }
    }
    Ok(())
}

/// A collaborator failed after its own pre-check passed. Positions the
/// batch had already moved are moved back before this is returned.
fn collaborator_broke(e: CustodyError) -> PoolError {
    PoolError::InvariantViolation(format!("custody failed after validation: {e}"))
}

fn rolled_back(position: PositionId, result: Result<(), CustodyError>) {
    if let Err(e) = result {
        error!(%position, error = %e, "custody could not be rolled back");
    }
}

fn rejected(op: &'static str, account: &AccountId, e: PoolError) -> PoolError {
    warn!(op, account = %account, error = %e, "operation rejected");
    e
}
