//! # journeysim-core
//!
//! Core types shared by every journeysim crate: errors, the workflow rule
//! catalog, named strategies and the catalog data sources they are read from.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod catalog;
pub mod error;
pub mod probability;
pub mod result;
pub mod source;
pub mod strategy;

pub use catalog::{AvailableActions, RuleCatalog, TaskDefinition};
pub use error::Error;
pub use probability::Disobedience;
pub use result::{Result, ResultExt};
pub use source::{
    CatalogSource, InMemoryCatalogSource, JsonCatalogSource, load_catalog, load_strategy,
};
pub use strategy::{StrategyEntry, StrategyTable};
