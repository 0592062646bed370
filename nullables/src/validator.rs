//! Nullable category validator.

use accrue_custody::CategoryValidator;
use accrue_types::PositionId;
use std::collections::{HashMap, HashSet};

/// Category check with a programmable registry plus allow/deny lists.
///
/// Positions given a category with [`NullValidator::assign`] are only
/// supported by pools of that category. Positions without one pass the
/// category comparison and are judged by the allow/deny lists alone.
#[derive(Clone, Debug, Default)]
pub struct NullValidator {
    /// When set, only these positions are supported.
    allowed: Option<HashSet<PositionId>>,
    denied: HashSet<PositionId>,
    categories: HashMap<PositionId, u64>,
}

impl NullValidator {
    /// Every position is supported.
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Only the given positions are supported.
    pub fn only(positions: impl IntoIterator<Item = PositionId>) -> Self {
        Self {
            allowed: Some(positions.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Mark a position as belonging to an unsupported category.
    pub fn deny(&mut self, position: PositionId) {
        self.denied.insert(position);
    }

    /// Register the category a position was minted in.
    pub fn assign(&mut self, position: PositionId, category_id: u64) {
        self.categories.insert(position, category_id);
    }

    pub fn assign_many(&mut self, positions: impl IntoIterator<Item = PositionId>, category_id: u64) {
        for position in positions {
            self.assign(position, category_id);
        }
    }

    pub fn category_of(&self, position: PositionId) -> Option<u64> {
        self.categories.get(&position).copied()
    }
}

impl CategoryValidator for NullValidator {
    fn is_supported(&self, category_id: u64, position: PositionId) -> bool {
        if self.denied.contains(&position) {
            return false;
        }
        if self
            .categories
            .get(&position)
            .is_some_and(|&minted_in| minted_in != category_id)
        {
            return false;
        }
        self.allowed
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_category_must_match_the_pool() {
        let p = PositionId::new(4);
        let mut validator = NullValidator::only([p]);
        assert!(validator.is_supported(1, p));

        validator.assign(p, 2);
        assert!(!validator.is_supported(1, p));
        assert!(validator.is_supported(2, p));
        assert_eq!(validator.category_of(p), Some(2));
    }

    #[test]
    fn deny_and_allow_lists_still_apply() {
        let mut validator = NullValidator::accept_all();
        validator.assign_many([PositionId::new(1), PositionId::new(2)], 7);
        validator.deny(PositionId::new(2));
        assert!(validator.is_supported(7, PositionId::new(1)));
        assert!(!validator.is_supported(7, PositionId::new(2)));
        assert!(!NullValidator::only([PositionId::new(1)]).is_supported(7, PositionId::new(3)));
    }
}
