//! Fatal errors that abort a run before any verdict can be produced.
//!
//! Problems with individual paths or tools never surface here: detection
//! recovers from them locally and tool problems become `tool-failure`
//! findings.

use std::path::PathBuf;

/// Errors that stop the whole invocation (exit code 1).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The working-tree root itself could not be listed.
    #[error("cannot read working tree root '{}': {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file exists but could not be read or parsed.
    #[error("invalid configuration in '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Another invocation kept the working-tree lock for too long.
    #[error("another smart-lint run holds the lock for '{}' (waited {waited_secs}s)", root.display())]
    LockTimeout { root: PathBuf, waited_secs: u64 },

    /// The lock file could not be created or locked.
    #[error("cannot acquire lock file '{}': {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The hook payload on stdin was not valid JSON.
    #[error("invalid hook payload: {0}")]
    HookPayload(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
