//! Tool resolution: first installed candidate wins.
//!
//! Absence is not an error. When no candidate for a role is on the search
//! path the binding is left unbound and the role is skipped.

use super::catalog::{self, ToolSpec};
use crate::findings::Role;
use crate::process::{self, Invocation, Outcome};
use regex::Regex;
use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const VERSION_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Configured value that unbinds a role entirely.
pub const NONE: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// First `MAJOR.MINOR[.PATCH]` in a `--version` banner.
pub fn parse_version(text: &str) -> Option<Version> {
    let re = Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").ok()?;
    let caps = re.captures(text)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse().ok());
    Some(Version {
        major: num(1)?,
        minor: num(2)?,
        patch: num(3).unwrap_or(0),
    })
}

/// A catalog entry found on the host.
#[derive(Debug, Clone)]
pub struct ResolvedTool {
    pub spec: &'static ToolSpec,
    /// Absolute path of the executable that gets invoked.
    pub program: PathBuf,
    pub version: Option<Version>,
}

impl ResolvedTool {
    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn major(&self) -> Option<u64> {
        self.version.map(|v| v.major)
    }

    /// Program plus any fixed leading arguments.
    pub fn base_invocation(&self) -> Invocation {
        let leading = self.spec.program.map(|(_, args)| args).unwrap_or(&[]);
        Invocation::new(self.program.as_os_str()).args(leading.iter().copied())
    }
}

/// Role binding for one profile.
#[derive(Debug, Clone)]
pub struct ToolBinding {
    pub role: Role,
    pub candidate_order: Vec<&'static str>,
    pub resolved: Option<ResolvedTool>,
}

/// Looks up executables on a search path.
#[derive(Debug, Clone)]
pub struct Resolver {
    /// `PATH`-style list; `None` uses the process environment.
    search_path: Option<OsString>,
    cwd: PathBuf,
}

impl Resolver {
    pub fn new(search_path: Option<OsString>, cwd: &Path) -> Self {
        Resolver {
            search_path,
            cwd: cwd.to_path_buf(),
        }
    }

    /// Locate an executable by name.
    pub fn find(&self, binary: &str) -> Option<PathBuf> {
        let found = match &self.search_path {
            Some(paths) => which::which_in(binary, Some(paths.as_os_str()), &self.cwd),
            None => which::which(binary),
        };
        found.ok()
    }

    /// Walk `candidates` and bind the first installed tool.
    pub fn resolve(&self, role: Role, candidates: Vec<&'static str>) -> ToolBinding {
        let resolved = candidates.iter().find_map(|name| {
            let spec = catalog::lookup(name)?;
            let tool = self.resolve_spec(spec);
            if tool.is_none() {
                log::debug!("{role} candidate '{name}' not installed");
            }
            tool
        });
        match &resolved {
            Some(t) => log::debug!(
                "{role} bound to {} ({}){}",
                t.name(),
                t.program.display(),
                t.version.map(|v| format!(" v{v}")).unwrap_or_default()
            ),
            None => log::debug!("{role} unbound; no candidate of {candidates:?} installed"),
        }
        ToolBinding {
            role,
            candidate_order: candidates,
            resolved,
        }
    }

    fn resolve_spec(&self, spec: &'static ToolSpec) -> Option<ResolvedTool> {
        let found = self.find(spec.binary)?;
        let program = match spec.program {
            Some((prog, _)) => self.find(prog)?,
            None => found.clone(),
        };
        let version = if needs_version(spec) {
            query_version(&found, &self.cwd)
        } else {
            None
        };
        Some(ResolvedTool {
            spec,
            program,
            version,
        })
    }
}

/// Only tools with version-dependent templates pay for a `--version` run.
fn needs_version(spec: &ToolSpec) -> bool {
    !spec.versioned.is_empty() || spec.recovery.is_some_and(|r| !r.versioned.is_empty())
}

fn query_version(binary: &Path, cwd: &Path) -> Option<Version> {
    let inv = Invocation::new(binary.as_os_str()).arg("--version");
    match process::run(&inv, cwd, &[], VERSION_QUERY_TIMEOUT) {
        Outcome::Exited { output, .. } => parse_version(&output),
        other => {
            log::debug!("version query failed for {}: {other:?}", binary.display());
            None
        }
    }
}

/// Candidate order after applying a configured preference.
///
/// A known preferred tool moves to the front; `"none"` unbinds the role.
/// Unknown names are reported and ignored.
pub fn candidate_order(
    defaults: &'static [&'static str],
    preferred: Option<&str>,
    role: Role,
    profile: &str,
) -> Vec<&'static str> {
    let mut order: Vec<&'static str> = defaults.to_vec();
    let Some(pref) = preferred.map(str::trim).filter(|p| !p.is_empty()) else {
        return order;
    };
    if pref.eq_ignore_ascii_case(NONE) {
        return Vec::new();
    }
    match catalog::lookup(pref) {
        Some(spec) => {
            order.retain(|n| *n != spec.name);
            order.insert(0, spec.name);
        }
        None => log::warn!("{profile}: unknown {role} '{pref}' in config; using defaults"),
    }
    order
}

impl fmt::Display for ToolBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resolved {
            Some(t) => {
                write!(f, "{}", t.name())?;
                if let Some(v) = t.version {
                    write!(f, " v{v}")?;
                }
                write!(f, " ({})", t.program.display())
            }
            None if self.candidate_order.is_empty() => f.write_str("disabled"),
            None => write!(f, "unbound (tried {})", self.candidate_order.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_version_banners() {
        let v = parse_version("golangci-lint has version 1.55.2 built with go1.21").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 55, 2));
        let v = parse_version("golangci-lint has version v2.1.0").unwrap();
        assert_eq!(v.major, 2);
        let v = parse_version("v9.4").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (9, 4, 0));
        assert!(parse_version("no digits here").is_none());
    }

    #[test]
    fn test_candidate_order_preference_and_none() {
        let d: &'static [&'static str] = &["ruff-format", "black"];
        assert_eq!(candidate_order(d, None, Role::Formatter, "python"), vec!["ruff-format", "black"]);
        assert_eq!(candidate_order(d, Some("black"), Role::Formatter, "python"), vec!["black", "ruff-format"]);
        assert!(candidate_order(d, Some("none"), Role::Formatter, "python").is_empty());
        assert_eq!(candidate_order(d, Some("yapf"), Role::Formatter, "python"), vec!["ruff-format", "black"]);
    }

    #[test]
    fn test_resolve_unbound_when_nothing_installed() {
        let dir = tempdir().unwrap();
        let r = Resolver::new(Some(dir.path().as_os_str().to_owned()), dir.path());
        let b = r.resolve(Role::Linter, vec!["golangci-lint", "go-vet"]);
        assert!(b.resolved.is_none());
        assert_eq!(b.candidate_order, vec!["golangci-lint", "go-vet"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_falls_back_to_secondary_and_reads_version() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let bin = dir.path().join("golangci-lint");
        std::fs::write(&bin, "#!/bin/sh\necho 'golangci-lint has version 2.0.1'\n").unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

        let r = Resolver::new(Some(dir.path().as_os_str().to_owned()), dir.path());
        let b = r.resolve(Role::Linter, vec!["go-vet", "golangci-lint"]);
        let t = b.resolved.unwrap();
        assert_eq!(t.name(), "golangci-lint");
        assert_eq!(t.major(), Some(2));
        assert_eq!(t.spec.check_args(t.major()), &["run", "--fast-only"]);
    }
}
