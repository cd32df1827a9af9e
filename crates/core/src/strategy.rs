//! Named strategies restricting which controllable actions are offered.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// A (state, action) pair permitted by a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrategyEntry {
    pub state: String,
    pub action: String,
}

impl StrategyEntry {
    pub fn new(state: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            action: action.into(),
        }
    }
}

/// Immutable per-state sets of permitted action names for one strategy.
#[derive(Debug, Clone)]
pub struct StrategyTable {
    name: String,
    permitted: HashMap<String, HashSet<String>>,
}

impl StrategyTable {
    /// Group `entries` by state.
    pub fn new(name: impl Into<String>, entries: impl IntoIterator<Item = StrategyEntry>) -> Self {
        let permitted = entries.into_iter().fold(
            HashMap::<String, HashSet<String>>::new(),
            |mut acc, entry| {
                acc.entry(entry.state).or_default().insert(entry.action);
                acc
            },
        );
        Self {
            name: name.into(),
            permitted,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Permitted actions for `state`, or `None` if the strategy has no entry
    /// for it.
    #[must_use]
    pub fn permitted_actions(&self, state: &str) -> Option<&HashSet<String>> {
        self.permitted.get(state)
    }

    /// Number of states the strategy has entries for.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.permitted.len()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn should_group_entries_per_state() {
        let table = StrategyTable::new(
            "greedy",
            vec![
                StrategyEntry::new("start", "send_offer"),
                StrategyEntry::new("start", "call"),
                StrategyEntry::new("offer", "close"),
            ],
        );
        assert_eq!(table.name(), "greedy");
        assert_eq!(table.state_count(), 2);
        assert_eq!(table.permitted_actions("start").map(HashSet::len), Some(2));
        let offer = table.permitted_actions("offer").unwrap();
        assert!(offer.contains("close"));
        assert!(!offer.contains("send_offer"));
    }

    #[test]
    fn unknown_state_has_no_entry() {
        let table = StrategyTable::new("empty", Vec::new());
        assert!(table.permitted_actions("start").is_none());
        assert_eq!(table.state_count(), 0);
    }

    #[test]
    fn duplicate_entries_collapse() {
        let table = StrategyTable::new(
            "dup",
            vec![
                StrategyEntry::new("start", "A"),
                StrategyEntry::new("start", "A"),
            ],
        );
        assert_eq!(table.permitted_actions("start").map(HashSet::len), Some(1));
    }
}
