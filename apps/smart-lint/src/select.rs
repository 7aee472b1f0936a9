//! Changed-file selection per language profile.
//!
//! Candidates come from the VCS snapshot when the root is inside a git work
//! tree, otherwise from a full scan of the root. Each profile then keeps the
//! files it claims by extension, minus its own excludes, the global skip
//! directories, the project ignore file, and files carrying the inline
//! disable marker.

use crate::error::Result;
use crate::filter::{self, PathFilter};
use crate::profiles::{LanguageProfile, GLOBAL_SKIP_DIRS};
use crate::vcs::{self, VcsState};
use crate::walk;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Where the candidate paths were taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FileSource {
    Vcs(VcsState),
    /// Not under version control: every file under the root is a candidate.
    FullScan,
}

/// Run-wide candidate paths, computed once per invocation.
#[derive(Debug, Clone)]
pub struct Candidates {
    pub source: FileSource,
    pub paths: BTreeSet<PathBuf>,
}

impl Candidates {
    /// Snapshot git state under `root`, falling back to a full scan.
    pub fn collect(root: &Path) -> Result<Candidates> {
        if let Some(snap) = vcs::snapshot(root) {
            return Ok(Candidates {
                source: FileSource::Vcs(snap.state),
                paths: snap.paths,
            });
        }
        log::debug!("{} is not under version control; scanning all files", root.display());
        let paths = walk::walk_files(root, None)?.into_iter().collect();
        Ok(Candidates {
            source: FileSource::FullScan,
            paths,
        })
    }
}

/// Files of one profile eligible for this run, sorted and deduplicated.
#[derive(Debug, Clone, Serialize)]
pub struct ChangedFileSet {
    pub profile: &'static str,
    pub files: Vec<PathBuf>,
    pub source: FileSource,
}

impl ChangedFileSet {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Selection knobs that come from configuration.
#[derive(Debug, Clone)]
pub struct SelectOptions<'a> {
    pub ignore: &'a PathFilter,
    pub disable_marker: &'a str,
    pub marker_lines: usize,
}

/// Narrow the run candidates down to the files `profile` should check.
pub fn select(
    profile: &LanguageProfile,
    root: &Path,
    candidates: &Candidates,
    opts: &SelectOptions<'_>,
) -> ChangedFileSet {
    let excludes = PathFilter::new(profile.excludes.iter().copied());
    let skip_dirs: Vec<String> = GLOBAL_SKIP_DIRS.iter().map(|d| format!("{d}/")).collect();
    let global = PathFilter::new(skip_dirs.iter().map(String::as_str));

    let files: Vec<PathBuf> = candidates
        .paths
        .iter()
        .filter(|p| {
            p.file_name()
                .map(|n| profile.claims(&n.to_string_lossy()))
                .unwrap_or(false)
        })
        .filter(|p| !global.is_excluded(p))
        .filter(|p| !excludes.is_excluded(p))
        .filter(|p| !opts.ignore.is_excluded(p))
        .filter(|p| {
            let abs = root.join(p);
            if !abs.is_file() {
                return false;
            }
            if filter::has_disable_marker(&abs, opts.disable_marker, opts.marker_lines) {
                log::debug!("{}: skipped by inline marker", p.display());
                return false;
            }
            true
        })
        .cloned()
        .collect();

    log::debug!("{}: {} file(s) selected", profile.id, files.len());
    ChangedFileSet {
        profile: profile.id,
        files,
        source: candidates.source.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::Language;
    use std::fs;
    use tempfile::tempdir;

    fn candidates(paths: &[&str]) -> Candidates {
        Candidates {
            source: FileSource::Vcs(VcsState::default()),
            paths: paths.iter().map(PathBuf::from).collect(),
        }
    }

    fn touch(root: &Path, rel: &str, body: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, body).unwrap();
    }

    #[test]
    fn test_select_filters_extension_excludes_ignore_and_marker() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "main.go", "package main\n");
        touch(root, "vendor/dep/dep.go", "package dep\n");
        touch(root, "gen/api.go", "package gen\n");
        touch(root, "skip.go", "// smart-lint-disable\npackage main\n");
        touch(root, "README.md", "# hi\n");
        touch(root, "node_modules/x/y.go", "package y\n");

        let cands = candidates(&[
            "main.go",
            "vendor/dep/dep.go",
            "gen/api.go",
            "skip.go",
            "README.md",
            "deleted.go",
            "node_modules/x/y.go",
        ]);
        let ignore = PathFilter::new(["gen/"]);
        let opts = SelectOptions {
            ignore: &ignore,
            disable_marker: "smart-lint-disable",
            marker_lines: 5,
        };
        let set = select(Language::Go.profile(), root, &cands, &opts);
        assert_eq!(set.files, vec![PathBuf::from("main.go")]);
        assert_eq!(set.profile, "go");
    }

    #[test]
    fn test_select_output_is_sorted() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for f in ["z.sh", "a.sh", "m/b.sh"] {
            touch(root, f, "echo hi\n");
        }
        let cands = candidates(&["z.sh", "m/b.sh", "a.sh"]);
        let ignore = PathFilter::default();
        let opts = SelectOptions {
            ignore: &ignore,
            disable_marker: "smart-lint-disable",
            marker_lines: 5,
        };
        let set = select(Language::Shell.profile(), root, &cands, &opts);
        assert_eq!(
            set.files,
            vec![
                PathBuf::from("a.sh"),
                PathBuf::from("m/b.sh"),
                PathBuf::from("z.sh")
            ]
        );
    }

    #[test]
    fn test_candidates_full_scan_outside_vcs() {
        let dir = tempdir().unwrap();
        if git2::Repository::discover(dir.path()).is_ok() {
            return;
        }
        touch(dir.path(), "deep/a/b/c/d/e.py", "x = 1\n");
        let cands = Candidates::collect(dir.path()).unwrap();
        assert_eq!(cands.source, FileSource::FullScan);
        assert!(cands.paths.contains(&PathBuf::from("deep/a/b/c/d/e.py")));
    }
}
