//! Directory traversal shared by detection and the non-VCS fallback.
//!
//! Only the root listing can fail; unreadable subdirectories, broken
//! symlinks, and similar per-path problems are logged and skipped.

use crate::error::{Error, Result};
use crate::profiles::GLOBAL_SKIP_DIRS;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// List regular files below `root`, relative to it, in sorted order.
///
/// `max_depth` counts directory levels below the root: files directly in
/// the root are at depth 0, so `Some(3)` visits `a/b/c/file`.
/// Directories named in `GLOBAL_SKIP_DIRS` are never entered.
pub fn walk_files(root: &Path, max_depth: Option<usize>) -> Result<Vec<PathBuf>> {
    fs::read_dir(root).map_err(|source| Error::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;
    let mut walker = WalkDir::new(root).min_depth(1).follow_links(false);
    if let Some(max) = max_depth {
        // walkdir counts the entry itself, so a file in `a/b/c` sits at 4.
        walker = walker.max_depth(max + 1);
    }
    let mut out: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                log::debug!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(is_regular_file)
        .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    out.sort();
    Ok(out)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && GLOBAL_SKIP_DIRS.contains(&entry.file_name().to_string_lossy().as_ref())
}

/// Symlinked files count; symlinked directories are not followed.
fn is_regular_file(entry: &DirEntry) -> bool {
    let ft = entry.file_type();
    if ft.is_file() {
        return true;
    }
    if !ft.is_symlink() {
        return false;
    }
    match fs::metadata(entry.path()) {
        Ok(meta) => meta.is_file(),
        Err(e) => {
            log::debug!("skipping broken symlink {}: {e}", entry.path().display());
            false
        }
    }
}
