//! Catalog data sources.
//!
//! The simulation only depends on the read contract in [`CatalogSource`].
//! Two backends ship with the crate: an in-memory builder and a JSON file.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;

use crate::catalog::{RuleCatalog, TaskDefinition};
use crate::error::Error;
use crate::result::Result;
use crate::strategy::{StrategyEntry, StrategyTable};

/// Read-only access to workflow catalogs and named strategies.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Every task definition of a workflow variant.
    async fn task_definitions(&self, variant: &str) -> Result<Vec<TaskDefinition>>;

    /// Distinct strategy names, sorted.
    async fn strategy_names(&self) -> Result<Vec<String>>;

    /// Entries of one named strategy.
    async fn strategy_entries(&self, name: &str) -> Result<Vec<StrategyEntry>>;
}

/// Load and validate the catalog of `variant`.
///
/// # Errors
///
/// Propagates source errors and [`RuleCatalog::new`] validation errors.
pub async fn load_catalog(source: &dyn CatalogSource, variant: &str) -> Result<RuleCatalog> {
    let tasks = source.task_definitions(variant).await?;
    RuleCatalog::new(variant, tasks)
}

/// Load a named strategy, failing fast when the name is not known.
///
/// # Errors
///
/// Returns [`Error::UnknownStrategy`] when `name` is absent from
/// [`CatalogSource::strategy_names`].
pub async fn load_strategy(source: &dyn CatalogSource, name: &str) -> Result<StrategyTable> {
    let names = source.strategy_names().await?;
    if !names.iter().any(|known| known == name) {
        return Err(Error::unknown_strategy(name));
    }
    let entries = source.strategy_entries(name).await?;
    Ok(StrategyTable::new(name, entries))
}

/// Catalog source held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogSource {
    workflows: HashMap<String, Vec<TaskDefinition>>,
    strategies: BTreeMap<String, Vec<StrategyEntry>>,
}

impl InMemoryCatalogSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a workflow variant.
    #[must_use]
    pub fn with_workflow(
        mut self,
        variant: impl Into<String>,
        tasks: impl IntoIterator<Item = TaskDefinition>,
    ) -> Self {
        self.workflows
            .insert(variant.into(), tasks.into_iter().collect());
        self
    }

    /// Add (or replace) a named strategy.
    #[must_use]
    pub fn with_strategy(
        mut self,
        name: impl Into<String>,
        entries: impl IntoIterator<Item = StrategyEntry>,
    ) -> Self {
        self.strategies
            .insert(name.into(), entries.into_iter().collect());
        self
    }

    /// Workflow variant names, sorted.
    #[must_use]
    pub fn workflow_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.workflows.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalogSource {
    async fn task_definitions(&self, variant: &str) -> Result<Vec<TaskDefinition>> {
        self.workflows
            .get(variant)
            .cloned()
            .ok_or_else(|| Error::unknown_workflow(variant))
    }

    async fn strategy_names(&self) -> Result<Vec<String>> {
        Ok(self.strategies.keys().cloned().collect())
    }

    async fn strategy_entries(&self, name: &str) -> Result<Vec<StrategyEntry>> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_strategy(name))
    }
}

/// Controllability as stored by older exports: a boolean or a string flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ControllableFlag {
    Bool(bool),
    Text(String),
}

impl ControllableFlag {
    fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Some(true),
                "false" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TaskRow {
    origin: String,
    target: String,
    action: String,
    controllable: ControllableFlag,
    cost: f64,
}

impl TaskRow {
    fn into_task(self, variant: &str) -> Result<TaskDefinition> {
        let controllable = self.controllable.as_bool().ok_or_else(|| {
            Error::malformed_catalog(
                variant,
                format!("unrecognised controllable flag {:?}", self.controllable),
            )
        })?;
        Ok(TaskDefinition {
            origin: self.origin,
            target: self.target,
            action: self.action,
            controllable,
            cost: self.cost,
        })
    }
}

/// On-disk catalog document. Per-variant rows and per-strategy entries stay
/// raw until requested, so one bad variant never hides the others.
#[derive(Debug, Clone, Default, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    workflows: HashMap<String, Value>,
    #[serde(default)]
    strategies: BTreeMap<String, Value>,
}

/// Catalog source backed by a JSON document.
///
/// Only the document shape is checked up front. Rows of a workflow variant
/// are converted when that variant is requested and fail with
/// [`Error::MalformedCatalog`] naming it.
///
/// ```json
/// {
///   "workflows": {
///     "onboarding": [
///       { "origin": "start", "target": "offer", "action": "send_offer",
///         "controllable": "yes", "cost": 1.5 }
///     ]
///   },
///   "strategies": {
///     "greedy": [ { "state": "start", "action": "send_offer" } ]
///   }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonCatalogSource {
    document: CatalogDocument,
}

impl JsonCatalogSource {
    /// Read and parse the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileReadFailed`] if the file cannot be read and
    /// [`Error::JsonParseFailed`] if it is not a catalog document.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::file_read_failed(path, e.to_string()))?;
        let source = Self::parse(&text)?;
        tracing::info!(
            path = %path.display(),
            workflows = source.document.workflows.len(),
            strategies = source.document.strategies.len(),
            "Loaded JSON catalog"
        );
        Ok(source)
    }

    /// # Errors
    ///
    /// Returns [`Error::JsonParseFailed`] for invalid JSON or a document
    /// whose top level is not `{ "workflows": {..}, "strategies": {..} }`.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map(|document| Self { document })
            .map_err(|e| Error::json_parse_failed(e.to_string()))
    }

    /// Workflow variant names, sorted.
    #[must_use]
    pub fn workflow_names(&self) -> Vec<String> {
        self.document.workflows.keys().cloned().sorted().collect()
    }
}

#[async_trait]
impl CatalogSource for JsonCatalogSource {
    async fn task_definitions(&self, variant: &str) -> Result<Vec<TaskDefinition>> {
        let raw = self
            .document
            .workflows
            .get(variant)
            .ok_or_else(|| Error::unknown_workflow(variant))?;
        let rows: Vec<TaskRow> = Vec::<TaskRow>::deserialize(raw)
            .map_err(|e| Error::malformed_catalog(variant, e.to_string()))?;
        rows.into_iter().map(|row| row.into_task(variant)).collect()
    }

    async fn strategy_names(&self) -> Result<Vec<String>> {
        Ok(self.document.strategies.keys().cloned().collect())
    }

    async fn strategy_entries(&self, name: &str) -> Result<Vec<StrategyEntry>> {
        let raw = self
            .document
            .strategies
            .get(name)
            .ok_or_else(|| Error::unknown_strategy(name))?;
        Vec::<StrategyEntry>::deserialize(raw)
            .map_err(|e| Error::malformed_strategy(name, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::io::Write;

    use super::*;

    const DOC: &str = r#"{
        "workflows": {
            "onboarding": [
                { "origin": "start", "target": "offer", "action": "send_offer", "controllable": "Yes", "cost": 1.5 },
                { "origin": "start", "target": "churned", "action": "cancel", "controllable": false, "cost": 0 },
                { "origin": "offer", "target": "done", "action": "close", "controllable": "1", "cost": 2 }
            ]
        },
        "strategies": {
            "greedy": [ { "state": "start", "action": "send_offer" } ],
            "cautious": []
        }
    }"#;

    #[tokio::test]
    async fn should_parse_legacy_controllable_flags() {
        let source = JsonCatalogSource::parse(DOC).unwrap();
        let tasks = source.task_definitions("onboarding").await.unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks.iter().filter(|t| t.controllable).count(), 2);
    }

    #[tokio::test]
    async fn should_list_strategies_sorted() {
        let source = JsonCatalogSource::parse(DOC).unwrap();
        let names = source.strategy_names().await.unwrap();
        assert_eq!(names, vec!["cautious".to_string(), "greedy".to_string()]);
    }

    #[tokio::test]
    async fn should_reject_unknown_flag_text() {
        let doc = r#"{ "workflows": { "w": [
            { "origin": "s", "target": "t", "action": "a", "controllable": "maybe", "cost": 1 }
        ] } }"#;
        let source = JsonCatalogSource::parse(doc).unwrap();
        let err = source.task_definitions("w").await.unwrap_err();
        assert!(matches!(err, Error::MalformedCatalog { ref variant, .. } if variant == "w"));
        assert!(err.to_string().contains("maybe"));
    }

    #[tokio::test]
    async fn given_one_malformed_variant_when_loading_then_others_still_load() {
        // Given: A document where only "bad" has broken rows
        let doc = r#"{
            "workflows": {
                "good": [ { "origin": "start", "target": "end", "action": "a", "controllable": true, "cost": 1 } ],
                "bad": [ { "origin": "start", "target": "end", "action": "a", "controllable": "maybe", "cost": 1 } ],
                "typo": [ { "origin": "start", "target": "end", "action": "a", "controllable": true, "cost": "cheap" } ],
                "partial": [ { "origin": "start", "action": "a", "controllable": true, "cost": 1 } ]
            },
            "strategies": { "broken": { "start": "a" }, "fine": [] }
        }"#;

        // When: The document is parsed
        let source = JsonCatalogSource::parse(doc).unwrap();

        // Then: Each broken variant fails on its own, naming itself
        assert_eq!(load_catalog(&source, "good").await.unwrap().len(), 1);
        for variant in ["bad", "typo", "partial"] {
            let err = load_catalog(&source, variant).await.unwrap_err();
            assert!(
                matches!(err, Error::MalformedCatalog { variant: ref v, .. } if v == variant),
                "{variant}: {err}"
            );
            assert!(err.is_configuration());
        }

        // And: Strategies behave the same way
        assert!(load_strategy(&source, "fine").await.is_ok());
        let err = load_strategy(&source, "broken").await.unwrap_err();
        assert!(matches!(err, Error::MalformedStrategy { ref name, .. } if name == "broken"));
    }

    #[test]
    fn should_report_json_errors() {
        let err = JsonCatalogSource::parse("{ not json").unwrap_err();
        assert!(matches!(err, Error::JsonParseFailed { .. }));
    }

    #[tokio::test]
    async fn should_open_document_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();

        let source = JsonCatalogSource::open(file.path()).unwrap();
        assert_eq!(source.workflow_names(), vec!["onboarding".to_string()]);
        let catalog = load_catalog(&source, "onboarding").await.unwrap();
        assert_eq!(catalog.tasks_from("start").len(), 2);
    }

    #[test]
    fn should_fail_on_missing_file() {
        let err = JsonCatalogSource::open("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::FileReadFailed { .. }));
    }

    #[tokio::test]
    async fn unknown_workflow_is_a_configuration_error() {
        let source = InMemoryCatalogSource::new();
        let err = load_catalog(&source, "missing").await.unwrap_err();
        assert!(matches!(err, Error::UnknownWorkflow { .. }));
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn unknown_strategy_fails_fast() {
        let source = InMemoryCatalogSource::new().with_strategy("greedy", Vec::new());
        let err = load_strategy(&source, "nope").await.unwrap_err();
        assert!(matches!(err, Error::UnknownStrategy { ref name } if name == "nope"));

        let table = load_strategy(&source, "greedy").await.unwrap();
        assert_eq!(table.name(), "greedy");
    }
}
