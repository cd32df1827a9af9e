#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # journeysim
//!
//! Command-line front end: argument parsing, run configuration and the
//! command handlers that drive the simulation crates.

pub mod cli;
pub mod commands;
pub mod config;

pub use journeysim_core;
pub use journeysim_orchestrator;
