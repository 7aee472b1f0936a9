//! Project type detection.
//!
//! A profile applies when any of its marker files, or any file with one of
//! its extensions, exists within the detection depth. Profiles are matched
//! independently; mixed-language trees yield several profiles.

use crate::error::Result;
use crate::profiles::{DetectionRule, Language, LanguageProfile};
use crate::walk;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File names and lowercase extensions seen within the detection depth.
#[derive(Debug, Default)]
pub struct TreeIndex {
    names: HashSet<String>,
    extensions: HashSet<String>,
}

impl TreeIndex {
    pub fn from_paths(paths: &[PathBuf]) -> Self {
        let mut idx = TreeIndex::default();
        for p in paths {
            let Some(name) = p.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if let Some((stem, ext)) = name.rsplit_once('.') {
                if !stem.is_empty() {
                    idx.extensions.insert(ext.to_ascii_lowercase());
                }
            }
            idx.names.insert(name);
        }
        idx
    }

    /// True when any detection rule of `profile` matches.
    pub fn matches(&self, profile: &LanguageProfile) -> bool {
        profile.detection_rules().iter().any(|rule| match rule {
            DetectionRule::Marker(m) => self.names.contains(*m),
            DetectionRule::Extension(e) => self.extensions.contains(&e.to_ascii_lowercase()),
        })
    }
}

/// Detect applicable languages under `root`, in registry order.
///
/// Only a failure to read `root` itself is an error.
pub fn detect(root: &Path, max_depth: usize) -> Result<Vec<Language>> {
    let paths = walk::walk_files(root, Some(max_depth))?;
    let index = TreeIndex::from_paths(&paths);
    let found: Vec<Language> = Language::ALL
        .into_iter()
        .filter(|l| index.matches(l.profile()))
        .collect();
    log::debug!(
        "detected profiles: [{}]",
        found.iter().map(|l| l.id()).collect::<Vec<_>>().join(", ")
    );
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, "").unwrap();
    }

    #[test]
    fn test_empty_tree_detects_nothing() {
        let dir = tempdir().unwrap();
        assert!(detect(dir.path(), 3).unwrap().is_empty());
    }

    #[test]
    fn test_mixed_repo_detects_all_in_registry_order() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "requirements.txt");
        touch(root, "web/package.json");
        touch(root, "go.mod");
        touch(root, "scripts/deploy.sh");
        let found = detect(root, 3).unwrap();
        assert_eq!(
            found,
            vec![Language::Go, Language::Python, Language::JavaScript, Language::Shell]
        );
    }

    #[test]
    fn test_depth_bound_and_skip_dirs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "a/b/c/d/e/main.tf");
        touch(root, "node_modules/pkg/index.js");
        assert!(detect(root, 3).unwrap().is_empty());
        assert_eq!(detect(root, 5).unwrap(), vec![Language::Terraform]);
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "README.MD");
        assert_eq!(detect(dir.path(), 3).unwrap(), vec![Language::Markdown]);
    }
}
