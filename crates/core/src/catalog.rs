//! Workflow rule catalog.
//!
//! A [`RuleCatalog`] is the immutable table of allowed transitions for one
//! workflow variant. It is validated and indexed by origin state once, at
//! construction, and then shared read-only (behind an `Arc`) by every actor
//! of every experiment that uses the variant.

use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::result::Result;

/// One allowed transition of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// State the transition starts from.
    pub origin: String,
    /// State the transition leads to.
    pub target: String,
    /// Action name, unique per origin state.
    pub action: String,
    /// Whether the company may choose this action on the customer's behalf.
    pub controllable: bool,
    /// Non-negative cost accumulated by the customer taking it.
    pub cost: f64,
}

impl TaskDefinition {
    /// Create a controllable task.
    pub fn controllable(
        origin: impl Into<String>,
        target: impl Into<String>,
        action: impl Into<String>,
        cost: f64,
    ) -> Self {
        Self {
            origin: origin.into(),
            target: target.into(),
            action: action.into(),
            controllable: true,
            cost,
        }
    }

    /// Create an uncontrollable task.
    pub fn uncontrollable(
        origin: impl Into<String>,
        target: impl Into<String>,
        action: impl Into<String>,
        cost: f64,
    ) -> Self {
        Self {
            origin: origin.into(),
            target: target.into(),
            action: action.into(),
            controllable: false,
            cost,
        }
    }
}

/// Actions offered for one (customer, state) query.
///
/// Only valid for the state it was computed for; never cached across states.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailableActions {
    pub controllable: Vec<Arc<TaskDefinition>>,
    pub uncontrollable: Vec<Arc<TaskDefinition>>,
}

impl AvailableActions {
    /// No actions at all: the journey is over.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.controllable.is_empty() && self.uncontrollable.is_empty()
    }
}

/// Immutable, indexed transition table for one workflow variant.
#[derive(Debug)]
pub struct RuleCatalog {
    variant: String,
    by_origin: HashMap<String, Vec<Arc<TaskDefinition>>>,
    len: usize,
}

impl RuleCatalog {
    /// Validate `tasks` and build the origin-state index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCatalog`] when `tasks` is empty and
    /// [`Error::MalformedCatalog`] for blank names, negative or non-finite
    /// costs, or a duplicated (origin, action) pair.
    pub fn new(variant: impl Into<String>, tasks: Vec<TaskDefinition>) -> Result<Self> {
        let variant = variant.into();
        if tasks.is_empty() {
            return Err(Error::empty_catalog(variant));
        }

        if let Some(bad) = tasks
            .iter()
            .find(|t| t.origin.is_empty() || t.target.is_empty() || t.action.is_empty())
        {
            return Err(Error::malformed_catalog(
                variant,
                format!(
                    "blank state or action name in '{}' -> '{}' ({})",
                    bad.origin, bad.target, bad.action
                ),
            ));
        }

        if let Some(bad) = tasks.iter().find(|t| !t.cost.is_finite() || t.cost < 0.0) {
            return Err(Error::malformed_catalog(
                variant,
                format!(
                    "action '{}' from '{}' has invalid cost {}",
                    bad.action, bad.origin, bad.cost
                ),
            ));
        }

        if let Some((origin, action)) = tasks
            .iter()
            .map(|t| (t.origin.as_str(), t.action.as_str()))
            .duplicates()
            .next()
        {
            return Err(Error::malformed_catalog(
                &variant,
                format!("action '{action}' defined twice for state '{origin}'"),
            ));
        }

        let len = tasks.len();
        let by_origin = tasks
            .into_iter()
            .map(Arc::new)
            .into_group_map_by(|t| t.origin.clone());

        tracing::debug!(
            workflow = %variant,
            tasks = len,
            states = by_origin.len(),
            "Indexed rule catalog"
        );

        Ok(Self {
            variant,
            by_origin,
            len,
        })
    }

    /// Workflow variant this catalog was loaded for.
    #[must_use]
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Number of task definitions.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Always false for a constructed catalog.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All tasks whose origin is `state`; empty when the state has none.
    #[must_use]
    pub fn tasks_from(&self, state: &str) -> &[Arc<TaskDefinition>] {
        self.by_origin.get(state).map_or(&[], Vec::as_slice)
    }

    /// Origin states that have at least one outgoing task.
    pub fn origin_states(&self) -> impl Iterator<Item = &str> {
        self.by_origin.keys().map(String::as_str)
    }
}
