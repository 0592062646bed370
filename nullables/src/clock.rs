//! Nullable clock: deterministic time for testing.

use accrue_types::Timestamp;
use std::cell::Cell;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to. `set` may move it backwards,
/// which is how tests provoke clock regressions.
pub struct NullClock {
    current: Cell<u64>,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: Cell::new(initial_secs),
        }
    }

    /// Get the current time.
    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.current.get())
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: u64) -> Timestamp {
        self.current.set(self.current.get().saturating_add(secs));
        self.now()
    }

    /// Set the time to a specific value.
    pub fn set(&self, secs: u64) {
        self.current.set(secs);
    }
}

impl Default for NullClock {
    fn default() -> Self {
        Self::new(0)
    }
}
