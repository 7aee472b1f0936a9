//! Working-tree change snapshot from git.
//!
//! Collects staged, unstaged, and untracked-but-not-ignored paths at
//! invocation time. Deleted paths are dropped since there is nothing left to
//! lint. Paths are returned relative to the working-tree root that smart-lint
//! runs in, which may be a subdirectory of the repository.

use git2::{Repository, Status, StatusOptions};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const STAGED: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE);
const UNSTAGED: Status = Status::WT_MODIFIED
    .union(Status::WT_RENAMED)
    .union(Status::WT_TYPECHANGE);
const UNTRACKED: Status = Status::WT_NEW;
const DELETED: Status = Status::INDEX_DELETED.union(Status::WT_DELETED);

/// Counts describing where the candidate paths came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VcsState {
    pub staged: usize,
    pub unstaged: usize,
    pub untracked: usize,
}

/// Changed paths under the root at invocation time.
#[derive(Debug, Clone, Default)]
pub struct VcsSnapshot {
    pub state: VcsState,
    /// Root-relative, sorted, deduplicated.
    pub paths: BTreeSet<PathBuf>,
}

/// Take a snapshot for `root`, or `None` when it is not inside a git work tree.
pub fn snapshot(root: &Path) -> Option<VcsSnapshot> {
    let repo = match Repository::discover(root) {
        Ok(r) => r,
        Err(e) => {
            log::debug!("no git repository at {}: {}", root.display(), e.message());
            return None;
        }
    };
    let workdir = repo.workdir()?.to_path_buf();
    let prefix = root_prefix(root, &workdir)?;

    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .exclude_submodules(true)
        .renames_head_to_index(true);
    let statuses = match repo.statuses(Some(&mut opts)) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("git status failed, falling back to a full scan: {}", e.message());
            return None;
        }
    };

    let mut snap = VcsSnapshot::default();
    for entry in statuses.iter() {
        let status = entry.status();
        if status.intersects(DELETED) && !status.intersects(STAGED | UNSTAGED | UNTRACKED) {
            continue;
        }
        let Some(rel) = entry_path(&entry) else {
            continue;
        };
        let Ok(under_root) = rel.strip_prefix(&prefix) else {
            continue;
        };
        if !workdir.join(&rel).is_file() {
            continue;
        }
        if status.intersects(STAGED) {
            snap.state.staged += 1;
        }
        if status.intersects(UNSTAGED) {
            snap.state.unstaged += 1;
        }
        if status.intersects(UNTRACKED) {
            snap.state.untracked += 1;
        }
        snap.paths.insert(under_root.to_path_buf());
    }
    log::debug!(
        "git snapshot: {} paths (staged={}, unstaged={}, untracked={})",
        snap.paths.len(),
        snap.state.staged,
        snap.state.unstaged,
        snap.state.untracked
    );
    Some(snap)
}

/// Current path of a status entry; renames report their new name.
fn entry_path(entry: &git2::StatusEntry<'_>) -> Option<PathBuf> {
    let new_path = |d: git2::DiffDelta<'_>| d.new_file().path().map(Path::to_path_buf);
    entry
        .index_to_workdir()
        .and_then(new_path)
        .or_else(|| entry.head_to_index().and_then(new_path))
        .or_else(|| entry.path().map(PathBuf::from))
}

/// Path of `root` relative to the repository work dir.
fn root_prefix(root: &Path, workdir: &Path) -> Option<PathBuf> {
    let root = root.canonicalize().ok()?;
    let workdir = workdir.canonicalize().ok()?;
    let diff = pathdiff::diff_paths(&root, &workdir)?;
    if diff.starts_with("..") {
        return None;
    }
    Some(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn commit_all(repo: &Repository) {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("t", "t@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, "c", &tree, &parents)
            .unwrap();
    }

    #[test]
    fn test_snapshot_collects_staged_unstaged_untracked_and_drops_deleted() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let repo = Repository::init(root).unwrap();
        fs::write(root.join("clean.py"), "a = 1\n").unwrap();
        fs::write(root.join("edited.py"), "a = 1\n").unwrap();
        fs::write(root.join("gone.py"), "a = 1\n").unwrap();
        fs::write(root.join(".gitignore"), "ignored.py\n").unwrap();
        commit_all(&repo);

        fs::write(root.join("edited.py"), "a = 2\n").unwrap();
        fs::remove_file(root.join("gone.py")).unwrap();
        fs::write(root.join("new.py"), "b = 1\n").unwrap();
        fs::write(root.join("ignored.py"), "c = 1\n").unwrap();
        fs::write(root.join("staged.py"), "d = 1\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("staged.py")).unwrap();
        index.write().unwrap();

        let snap = snapshot(root).unwrap();
        let paths: Vec<_> = snap.paths.iter().cloned().collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("edited.py"),
                PathBuf::from("new.py"),
                PathBuf::from("staged.py"),
            ]
        );
        assert_eq!(snap.state.staged, 1);
        assert_eq!(snap.state.unstaged, 1);
        assert_eq!(snap.state.untracked, 1);
    }

    #[test]
    fn test_snapshot_scoped_to_subdirectory_root() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        Repository::init(root).unwrap();
        fs::create_dir_all(root.join("svc/pkg")).unwrap();
        fs::write(root.join("svc/pkg/a.go"), "package pkg\n").unwrap();
        fs::write(root.join("top.go"), "package main\n").unwrap();

        let snap = snapshot(&root.join("svc")).unwrap();
        let paths: Vec<_> = snap.paths.into_iter().collect();
        assert_eq!(paths, vec![PathBuf::from("pkg/a.go")]);
    }

    #[test]
    fn test_snapshot_outside_repo_is_none() {
        let dir = tempdir().unwrap();
        // Guard against a tempdir living inside some outer repository.
        if Repository::discover(dir.path()).is_ok() {
            return;
        }
        assert!(snapshot(dir.path()).is_none());
    }
}
