//! Gitignore-style path filtering and the inline opt-out marker.
//!
//! The same matcher backs a profile's built-in excludes and the project's
//! ignore file. Both use full gitignore syntax, evaluated against
//! root-relative paths: a file is excluded when it or any parent
//! directory matches.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Component, Path, PathBuf};

/// Ordered set of gitignore-style rules.
#[derive(Debug, Clone)]
pub struct PathFilter {
    matcher: Gitignore,
}

impl Default for PathFilter {
    fn default() -> Self {
        PathFilter {
            matcher: Gitignore::empty(),
        }
    }
}

impl PathFilter {
    /// Build from pattern lines; invalid globs are logged and dropped.
    pub fn new<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        // Matching is done on relative paths only, so "." never strips anything.
        let mut builder = GitignoreBuilder::new(".");
        for line in lines {
            if let Err(e) = builder.add_line(None, line) {
                log::warn!("ignoring invalid pattern '{}': {e}", line.trim());
            }
        }
        match builder.build() {
            Ok(matcher) => PathFilter { matcher },
            Err(e) => {
                log::warn!("ignore patterns unusable: {e}");
                PathFilter::default()
            }
        }
    }

    /// Load an ignore file; a missing file yields an empty filter.
    pub fn from_file(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => {
                log::debug!("loaded ignore file {}", path.display());
                PathFilter::new(s.lines())
            }
            Err(_) => PathFilter::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }

    /// True when the root-relative `path` (a file) is excluded.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.matcher.is_empty() {
            return false;
        }
        let rel: PathBuf = path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        if rel.as_os_str().is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(&rel, false)
            .is_ignore()
    }
}

/// True when `marker` appears within the first `max_lines` lines of the file.
///
/// Unreadable files report false; the tools will surface the real problem.
pub fn has_disable_marker(path: &Path, marker: &str, max_lines: usize) -> bool {
    if marker.is_empty() || max_lines == 0 {
        return false;
    }
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };
    BufReader::new(file)
        .split(b'\n')
        .take(max_lines)
        .map_while(Result::ok)
        .any(|line| String::from_utf8_lossy(&line).contains(marker))
}
