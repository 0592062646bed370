//! Logical timestamps supplied by the host.
//!
//! Timestamps are whole seconds. The ledger never reads an ambient clock;
//! every operation receives the current time explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the host's monotonically non-decreasing clock, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds from `self` to `later`, or `None` if `later` precedes `self`.
    pub fn checked_elapsed_until(&self, later: Timestamp) -> Option<u64> {
        later.0.checked_sub(self.0)
    }

    /// This timestamp shifted forward by `secs`, saturating at `u64::MAX`.
    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
