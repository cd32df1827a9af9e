//! Property-based tests for aggregation and provider partitioning.
//!
//! Properties that MUST hold for any input: aggregation is exact and never
//! divides by zero; a permissive provider places every task in exactly one
//! list; a strategy with no entry for a state offers nothing controllable.

#![allow(clippy::expect_used)]

use std::sync::Arc;

use proptest::prelude::*;

use journeysim_core::{RuleCatalog, StrategyEntry, StrategyTable, TaskDefinition};
use journeysim_orchestrator::actors::CustomerOutcome;
use journeysim_orchestrator::{AggregationByEndState, StrategyMiss, WorkflowProvider};

const STATES: [&str; 4] = ["s0", "s1", "s2", "s3"];

fn outcome_strategy() -> impl Strategy<Value = CustomerOutcome> {
    (any::<u64>(), 0usize..STATES.len(), 0u64..1_000, 0.0f64..10_000.0).prop_map(
        |(id, state, steps, cost)| CustomerOutcome {
            id,
            end_state: STATES.get(state).copied().unwrap_or("s0").to_string(),
            steps,
            cost,
        },
    )
}

fn catalog_strategy() -> impl Strategy<Value = Vec<TaskDefinition>> {
    prop::collection::vec(
        (0usize..STATES.len(), 0usize..STATES.len(), any::<bool>(), 0.0f64..100.0),
        1..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (from, to, controllable, cost))| TaskDefinition {
                origin: STATES.get(from).copied().unwrap_or("s0").to_string(),
                target: STATES.get(to).copied().unwrap_or("s0").to_string(),
                action: format!("action-{i}"),
                controllable,
                cost,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn property_aggregation_counts_every_outcome_once(
        outcomes in prop::collection::vec(outcome_strategy(), 0..200)
    ) {
        let agg = AggregationByEndState::from_outcomes(&outcomes);

        prop_assert_eq!(agg.total_customers(), outcomes.len() as u64);
        for (state, entry) in agg.iter() {
            let matching: Vec<_> = outcomes.iter().filter(|o| &o.end_state == state).collect();
            prop_assert_eq!(entry.count, matching.len() as u64);
            prop_assert_eq!(entry.total_steps, matching.iter().map(|o| o.steps).sum::<u64>());
        }
    }

    #[test]
    fn property_aggregation_means_are_exact_and_finite(
        outcomes in prop::collection::vec(outcome_strategy(), 1..200)
    ) {
        let agg = AggregationByEndState::from_outcomes(&outcomes);

        for summary in agg.summaries() {
            let entry = agg.get(&summary.end_state).copied().unwrap_or_default();
            prop_assert!(summary.count > 0);
            prop_assert!(summary.mean_steps.is_finite() && summary.mean_steps >= 0.0);
            prop_assert!(summary.mean_cost.is_finite() && summary.mean_cost >= 0.0);

            let steps_back = summary.mean_steps * summary.count as f64;
            prop_assert!((steps_back - entry.total_steps as f64).abs() < 1e-6 * (1.0 + entry.total_steps as f64));
            let cost_back = summary.mean_cost * summary.count as f64;
            prop_assert!((cost_back - entry.total_cost).abs() < 1e-6 * (1.0 + entry.total_cost));
        }
    }

    #[test]
    fn property_permissive_provider_partitions_by_flag(tasks in catalog_strategy()) {
        let catalog = Arc::new(RuleCatalog::new("prop", tasks).expect("generated catalog is valid"));
        let provider = WorkflowProvider::permissive(Arc::clone(&catalog));

        for state in STATES {
            let actions = provider.available_actions(1, state);
            prop_assert!(actions.controllable.iter().all(|t| t.controllable && t.origin == state));
            prop_assert!(actions.uncontrollable.iter().all(|t| !t.controllable && t.origin == state));
            prop_assert!(actions.controllable.iter().chain(&actions.uncontrollable).all(|t| t.cost >= 0.0));
            prop_assert_eq!(
                actions.controllable.len() + actions.uncontrollable.len(),
                catalog.tasks_from(state).len()
            );
        }
    }

    #[test]
    fn property_empty_strategy_offers_only_uncontrollable(tasks in catalog_strategy()) {
        let catalog = Arc::new(RuleCatalog::new("prop", tasks).expect("generated catalog is valid"));
        let permissive = WorkflowProvider::permissive(Arc::clone(&catalog));
        let filtered = WorkflowProvider::strategy_filtered(
            Arc::clone(&catalog),
            Arc::new(StrategyTable::new("empty", Vec::<StrategyEntry>::new())),
            StrategyMiss::OfferNone,
        );

        for state in STATES {
            let open = permissive.available_actions(1, state);
            let restricted = filtered.available_actions(1, state);
            prop_assert!(restricted.controllable.is_empty());
            prop_assert_eq!(restricted.uncontrollable, open.uncontrollable);
        }
    }
}
