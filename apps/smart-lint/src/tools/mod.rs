//! Tool catalog, resolution, and config-error recovery.
//!
//! smart-lint orchestrates tools, it does not replace them: each tool keeps
//! reading its own project configuration (`.golangci.yml`, `ruff.toml`,
//! `.prettierrc`, ...). The catalog only fixes how a tool is found and how
//! it is called in fix mode and check mode.

pub mod catalog;
pub mod recovery;
pub mod resolve;

pub use catalog::{lookup, Targets, ToolSpec};
pub use recovery::ConfigRecovery;
pub use resolve::{candidate_order, parse_version, ResolvedTool, Resolver, ToolBinding, Version};
