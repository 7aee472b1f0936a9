//! smart-lint core library.
//!
//! This crate detects which language toolchains apply to a working tree,
//! restricts work to the files that changed, runs each profile's formatter
//! and linter, and folds every problem into one blocking verdict.
//!
//! High-level modules:
//! - `profiles`: Static language profile registry.
//! - `detect`: Project type detection within a bounded depth.
//! - `vcs`, `walk`, `filter`, `select`: Changed-file selection per profile.
//! - `tools`: Tool catalog, resolution on `PATH`, config-error recovery.
//! - `process`: Subprocess execution with timeouts.
//! - `runner`: Fix-then-verify execution of a tool binding.
//! - `checks`: Threshold and custom checks.
//! - `findings`: Findings and their ordered aggregation.
//! - `engine`: Per-invocation `RunContext` and pipeline orchestration.
//! - `config`: Discovery and effective configuration resolution.
//! - `lock`: Advisory lock per working tree.
//! - `hook`: Hook payload parsing.
//! - `output`: Human/JSON verdict rendering.
//! - `cli`: CLI argument parsing (binary uses this).
pub mod checks;
pub mod cli;
pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod filter;
pub mod findings;
pub mod hook;
pub mod lock;
pub mod output;
pub mod process;
pub mod profiles;
pub mod runner;
pub mod select;
pub mod tools;
pub mod vcs;
pub mod walk;

pub use error::{Error, Result};
