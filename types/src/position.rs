//! Position identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// Identifier of one depositable item (one unit of weight while held).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionId(u64);

impl PositionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for PositionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for PositionId {
    type Err = TypeError;

    /// Accepts both `42` and `#42`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidPosition(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        let id = PositionId::new(17);
        assert_eq!(id.to_string(), "#17");
        assert_eq!(id.to_string().parse::<PositionId>().unwrap(), id);
        assert_eq!("17".parse::<PositionId>().unwrap(), id);
        assert!("seventeen".parse::<PositionId>().is_err());
    }
}
