//! Fold of terminal customer outcomes per end state.
//!
//! The fold is a persistent `OrdMap`, so intermediate aggregations can be
//! cloned cheaply and the summaries come out ordered by end state.

use im::OrdMap;
use serde::Serialize;

use crate::actors::CustomerOutcome;

/// Totals for one end state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AggregationEntry {
    pub count: u64,
    pub total_steps: u64,
    pub total_cost: f64,
}

impl AggregationEntry {
    #[must_use]
    pub fn with(self, steps: u64, cost: f64) -> Self {
        Self {
            count: self.count.saturating_add(1),
            total_steps: self.total_steps.saturating_add(steps),
            total_cost: self.total_cost + cost,
        }
    }

    /// Mean step count; 0.0 for an empty entry.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_steps(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_steps as f64 / self.count as f64
        }
    }

    /// Mean accumulated cost; 0.0 for an empty entry.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_cost(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_cost / self.count as f64
        }
    }
}

/// Per end state: count, mean steps, mean cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndStateSummary {
    pub end_state: String,
    pub count: u64,
    pub mean_steps: f64,
    pub mean_cost: f64,
}

/// Outcomes grouped by end state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationByEndState {
    entries: OrdMap<String, AggregationEntry>,
}

impl AggregationByEndState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a CustomerOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::new(), |mut acc, outcome| {
                acc.record(outcome);
                acc
            })
    }

    pub fn record(&mut self, outcome: &CustomerOutcome) {
        let entry = self
            .entries
            .get(&outcome.end_state)
            .copied()
            .unwrap_or_default()
            .with(outcome.steps, outcome.cost);
        self.entries.insert(outcome.end_state.clone(), entry);
    }

    #[must_use]
    pub fn get(&self, end_state: &str) -> Option<&AggregationEntry> {
        self.entries.get(end_state)
    }

    /// Summaries ordered by end state.
    #[must_use]
    pub fn summaries(&self) -> Vec<EndStateSummary> {
        self.entries
            .iter()
            .map(|(end_state, entry)| EndStateSummary {
                end_state: end_state.clone(),
                count: entry.count,
                mean_steps: entry.mean_steps(),
                mean_cost: entry.mean_cost(),
            })
            .collect()
    }

    #[must_use]
    pub fn total_customers(&self) -> u64 {
        self.entries.values().map(|e| e.count).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AggregationEntry)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: u64, end: &str, steps: u64, cost: f64) -> CustomerOutcome {
        CustomerOutcome {
            id,
            end_state: end.to_string(),
            steps,
            cost,
        }
    }

    #[test]
    fn should_group_by_end_state() {
        let outcomes = [
            outcome(1, "done", 2, 4.0),
            outcome(2, "done", 4, 6.0),
            outcome(3, "churned", 1, 0.5),
        ];
        let agg = AggregationByEndState::from_outcomes(&outcomes);

        assert_eq!(agg.len(), 2);
        assert_eq!(agg.total_customers(), 3);

        let done = agg.get("done").copied().unwrap_or_default();
        assert_eq!(done.count, 2);
        assert!((done.mean_steps() - 3.0).abs() < f64::EPSILON);
        assert!((done.mean_cost() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_order_summaries_by_end_state() {
        let outcomes = [outcome(1, "z", 0, 0.0), outcome(2, "a", 0, 0.0)];
        let names: Vec<_> = AggregationByEndState::from_outcomes(&outcomes)
            .summaries()
            .into_iter()
            .map(|s| s.end_state)
            .collect();
        assert_eq!(names, vec!["a".to_string(), "z".to_string()]);
    }

    #[test]
    fn should_not_divide_by_zero_for_empty_entry() {
        let entry = AggregationEntry::default();
        assert!(entry.mean_steps().abs() < f64::EPSILON);
        assert!(entry.mean_cost().abs() < f64::EPSILON);
    }

    #[test]
    fn empty_aggregation_has_no_summaries() {
        let agg = AggregationByEndState::new();
        assert!(agg.is_empty());
        assert!(agg.summaries().is_empty());
        assert_eq!(agg.total_customers(), 0);
    }
}
