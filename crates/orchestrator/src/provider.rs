//! Workflow provider: which actions are available in a state.
//!
//! This is the pure lookup the provider actor serves. It reads the shared,
//! pre-indexed [`RuleCatalog`] and never mutates anything.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use journeysim_core::{
    AvailableActions, CatalogSource, Result, RuleCatalog, StrategyTable, load_strategy,
};

use crate::actors::messages::CustomerId;

/// What a strategy-filtered provider offers for a state the strategy has no
/// entry for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyMiss {
    /// No controllable actions at all.
    #[default]
    OfferNone,
    /// Every controllable action of the state.
    OfferAll,
}

/// Filtering applied on top of the catalog.
#[derive(Debug, Clone)]
pub enum ProviderVariant {
    /// All actions of the state.
    Permissive,
    /// Uncontrollable actions unconditionally; controllable actions only when
    /// the strategy permits them in this state.
    StrategyFiltered {
        strategy: Arc<StrategyTable>,
        on_miss: StrategyMiss,
    },
}

#[derive(Debug, Clone)]
pub struct WorkflowProvider {
    catalog: Arc<RuleCatalog>,
    variant: ProviderVariant,
}

impl WorkflowProvider {
    #[must_use]
    pub const fn permissive(catalog: Arc<RuleCatalog>) -> Self {
        Self {
            catalog,
            variant: ProviderVariant::Permissive,
        }
    }

    #[must_use]
    pub const fn strategy_filtered(
        catalog: Arc<RuleCatalog>,
        strategy: Arc<StrategyTable>,
        on_miss: StrategyMiss,
    ) -> Self {
        Self {
            catalog,
            variant: ProviderVariant::StrategyFiltered { strategy, on_miss },
        }
    }

    /// Build the provider for an optional strategy name, loading the strategy
    /// from `source`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownStrategy` when `strategy` names a strategy the
    /// source does not know.
    pub async fn resolve(
        source: &dyn CatalogSource,
        catalog: Arc<RuleCatalog>,
        strategy: Option<&str>,
        on_miss: StrategyMiss,
    ) -> Result<Self> {
        match strategy {
            None => Ok(Self::permissive(catalog)),
            Some(name) => {
                let table = load_strategy(source, name).await?;
                Ok(Self::strategy_filtered(catalog, Arc::new(table), on_miss))
            }
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &Arc<RuleCatalog> {
        &self.catalog
    }

    #[must_use]
    pub fn strategy_name(&self) -> Option<&str> {
        match &self.variant {
            ProviderVariant::Permissive => None,
            ProviderVariant::StrategyFiltered { strategy, .. } => Some(strategy.name()),
        }
    }

    /// Actions available in `state`. `customer_id` does not influence the
    /// result.
    #[must_use]
    pub fn available_actions(&self, _customer_id: CustomerId, state: &str) -> AvailableActions {
        let (mut controllable, uncontrollable): (Vec<_>, Vec<_>) = self
            .catalog
            .tasks_from(state)
            .iter()
            .cloned()
            .partition(|task| task.controllable);

        if let ProviderVariant::StrategyFiltered { strategy, on_miss } = &self.variant {
            match (strategy.permitted_actions(state), on_miss) {
                (Some(permitted), _) => controllable.retain(|task| permitted.contains(&task.action)),
                (None, StrategyMiss::OfferNone) => controllable.clear(),
                (None, StrategyMiss::OfferAll) => {}
            }
        }

        AvailableActions {
            controllable,
            uncontrollable,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use journeysim_core::{StrategyEntry, TaskDefinition};

    use super::*;

    fn catalog() -> Arc<RuleCatalog> {
        Arc::new(
            RuleCatalog::new(
                "onboarding",
                vec![
                    TaskDefinition::controllable("start", "offer", "send_offer", 1.0),
                    TaskDefinition::controllable("start", "call", "phone", 2.0),
                    TaskDefinition::uncontrollable("start", "churned", "cancel", 0.0),
                    TaskDefinition::controllable("offer", "done", "close", 1.0),
                    TaskDefinition::uncontrollable("offer", "churned", "ignore", 0.0),
                ],
            )
            .unwrap(),
        )
    }

    fn strategy() -> Arc<StrategyTable> {
        Arc::new(StrategyTable::new(
            "greedy",
            vec![StrategyEntry::new("start", "send_offer")],
        ))
    }

    fn actions(list: &[Arc<TaskDefinition>]) -> Vec<&str> {
        let mut names: Vec<&str> = list.iter().map(|t| t.action.as_str()).collect();
        names.sort_unstable();
        names
    }

    #[test]
    fn permissive_partitions_by_flag() {
        let provider = WorkflowProvider::permissive(catalog());
        let available = provider.available_actions(1, "start");
        assert_eq!(actions(&available.controllable), vec!["phone", "send_offer"]);
        assert_eq!(actions(&available.uncontrollable), vec!["cancel"]);
    }

    #[test]
    fn unknown_state_offers_nothing() {
        let provider = WorkflowProvider::permissive(catalog());
        assert!(provider.available_actions(1, "done").is_exhausted());
    }

    #[test]
    fn customer_id_does_not_change_result() {
        let provider = WorkflowProvider::permissive(catalog());
        assert_eq!(
            provider.available_actions(1, "start"),
            provider.available_actions(9_999, "start")
        );
    }

    #[test]
    fn strategy_restricts_controllable_actions() {
        let provider =
            WorkflowProvider::strategy_filtered(catalog(), strategy(), StrategyMiss::OfferNone);
        let available = provider.available_actions(1, "start");
        assert_eq!(actions(&available.controllable), vec!["send_offer"]);
        assert_eq!(actions(&available.uncontrollable), vec!["cancel"]);
        assert_eq!(provider.strategy_name(), Some("greedy"));
    }

    #[test]
    fn strategy_without_entry_offers_no_controllable_actions() {
        let permissive = WorkflowProvider::permissive(catalog());
        let filtered =
            WorkflowProvider::strategy_filtered(catalog(), strategy(), StrategyMiss::OfferNone);

        let available = filtered.available_actions(1, "offer");
        assert!(available.controllable.is_empty());
        assert_eq!(
            available.uncontrollable,
            permissive.available_actions(1, "offer").uncontrollable
        );
    }

    #[test]
    fn offer_all_falls_back_to_permissive_controllable_set() {
        let permissive = WorkflowProvider::permissive(catalog());
        let filtered =
            WorkflowProvider::strategy_filtered(catalog(), strategy(), StrategyMiss::OfferAll);
        assert_eq!(
            filtered.available_actions(1, "offer"),
            permissive.available_actions(1, "offer")
        );
        // States the strategy does mention stay filtered.
        assert_eq!(
            actions(&filtered.available_actions(1, "start").controllable),
            vec!["send_offer"]
        );
    }

    #[test]
    fn strategy_miss_parses_kebab_case() {
        let miss: StrategyMiss = serde_json::from_str("\"offer-all\"").unwrap();
        assert_eq!(miss, StrategyMiss::OfferAll);
    }
}
