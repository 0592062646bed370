//! Notifications emitted by committed pool operations.

use accrue_types::{AccountId, PositionId, Timestamp};
use serde::{Deserialize, Serialize};

/// One entry in the pool's ordered, append-only event stream.
///
/// Exactly one event is emitted per committed deposit, withdrawal or
/// non-empty claim. Rejected operations and zero-amount claims emit nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolEvent {
    /// Positions were deposited.
    Staked {
        account: AccountId,
        positions: Vec<PositionId>,
        /// The depositor's weight after the deposit.
        account_weight: u64,
        /// Pool-wide weight after the deposit.
        total_weight: u64,
        at: Timestamp,
    },
    /// Positions were withdrawn and returned to their depositor.
    Withdrawn {
        account: AccountId,
        positions: Vec<PositionId>,
        account_weight: u64,
        total_weight: u64,
        at: Timestamp,
    },
    /// Settled rewards were paid out.
    RewardsClaimed {
        account: AccountId,
        amount: u128,
        at: Timestamp,
    },
}

impl PoolEvent {
    pub fn account(&self) -> &AccountId {
        match self {
            PoolEvent::Staked { account, .. }
            | PoolEvent::Withdrawn { account, .. }
            | PoolEvent::RewardsClaimed { account, .. } => account,
        }
    }
}

/// Synchronous fan-out of pool events to external observers.
///
/// Listeners run inline on the emitting call; keep them fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&PoolEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&PoolEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &PoolEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn every_listener_sees_every_event_in_order() {
        let mut bus = EventBus::new();
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(0usize));

        let sink = seen_a.clone();
        bus.subscribe(Box::new(move |e| sink.lock().unwrap().push(e.clone())));
        let counter = seen_b.clone();
        bus.subscribe(Box::new(move |_| *counter.lock().unwrap() += 1));

        let first = PoolEvent::RewardsClaimed {
            account: AccountId::new("alice"),
            amount: 10,
            at: Timestamp::new(1),
        };
        let second = PoolEvent::RewardsClaimed {
            account: AccountId::new("bob"),
            amount: 20,
            at: Timestamp::new(2),
        };
        bus.emit(&first);
        bus.emit(&second);

        assert_eq!(*seen_a.lock().unwrap(), vec![first, second]);
        assert_eq!(*seen_b.lock().unwrap(), 2);
        assert_eq!(bus.listener_count(), 2);
    }
}
