//! Hook payload parsing.
//!
//! When invoked as an editor hook, the caller's working directory may differ
//! from the process's. The payload on stdin names the edited file and the
//! caller's `cwd`; either gives the directory to start root discovery from.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct ToolInput {
    pub file_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HookInput {
    pub cwd: Option<String>,
    #[serde(default)]
    pub tool_input: Option<ToolInput>,
}

impl HookInput {
    pub fn parse(text: &str) -> Result<HookInput> {
        if text.trim().is_empty() {
            return Ok(HookInput::default());
        }
        serde_json::from_str(text).map_err(|e| Error::HookPayload(e.to_string()))
    }

    /// Directory hint: the edited file's directory, else `cwd`.
    ///
    /// A relative file path is taken relative to `cwd` when present.
    pub fn directory_hint(&self) -> Option<PathBuf> {
        let cwd = self.cwd.as_deref().filter(|c| !c.is_empty()).map(PathBuf::from);
        let file = self
            .tool_input
            .as_ref()
            .and_then(|t| t.file_path.as_deref())
            .filter(|f| !f.is_empty())
            .map(Path::new);
        if let Some(f) = file {
            let abs = match (&cwd, f.is_relative()) {
                (Some(c), true) => c.join(f),
                _ => f.to_path_buf(),
            };
            if let Some(dir) = abs.parent().filter(|d| d.is_dir()) {
                return Some(dir.to_path_buf());
            }
        }
        cwd
    }
}

/// Read and parse the payload from stdin.
pub fn read_stdin() -> Result<HookInput> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    HookInput::parse(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_directory_wins_over_cwd() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("pkg")).unwrap();
        let payload = format!(
            r#"{{"cwd": "{}", "tool_input": {{"file_path": "pkg/a.go"}}, "session_id": "x"}}"#,
            dir.path().display()
        );
        let h = HookInput::parse(&payload).unwrap();
        assert_eq!(h.directory_hint(), Some(dir.path().join("pkg")));
    }

    #[test]
    fn test_missing_file_dir_falls_back_to_cwd() {
        let h = HookInput::parse(r#"{"cwd": "/work/repo", "tool_input": {"file_path": "/gone/x.py"}}"#).unwrap();
        assert_eq!(h.directory_hint(), Some(PathBuf::from("/work/repo")));
    }

    #[test]
    fn test_empty_and_invalid_payloads() {
        assert!(HookInput::parse("  \n").unwrap().directory_hint().is_none());
        assert!(matches!(HookInput::parse("{not json"), Err(Error::HookPayload(_))));
    }
}
