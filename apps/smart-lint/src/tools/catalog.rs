//! Built-in tool definitions.
//!
//! Each entry describes how to find a formatter or linter on `PATH` and how
//! to call it in fix mode and check mode. Tools are referenced by `name`
//! from the language profiles and from configuration.

use super::recovery::ConfigRecovery;
use std::time::Duration;

/// What a tool is pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Targets {
    /// Selected files appended to one invocation.
    Files,
    /// Unique parent directories of the selected files, as `./dir`.
    Dirs,
    /// No targets; the tool checks the whole project from the root.
    Project,
    /// One invocation per selected file.
    EachFile,
}

/// Check-mode arguments that apply from a given major version on.
#[derive(Debug, Clone, Copy)]
pub struct VersionedArgs {
    pub min_major: u64,
    pub check: &'static [&'static str],
}

/// Static description of one external tool.
#[derive(Debug)]
pub struct ToolSpec {
    pub name: &'static str,
    /// Binary looked up on the search path.
    pub binary: &'static str,
    /// Leading arguments when the looked-up binary is not the one to run
    /// (`program` is then resolved instead of `binary`).
    pub program: Option<(&'static str, &'static [&'static str])>,
    /// In-place fix invocation; `None` for check-only tools.
    pub fix: Option<&'static [&'static str]>,
    pub check: &'static [&'static str],
    /// Check-mode overrides by installed major version, highest match wins.
    pub versioned: &'static [VersionedArgs],
    pub targets: Targets,
    /// Check mode lists offending files on stdout and still exits 0.
    pub fails_on_output: bool,
    /// Exit codes meaning the tool could not do its job.
    pub failure_codes: &'static [i32],
    pub timeout: Duration,
    /// Linter check with safe auto-fix, used when enabled in config.
    pub autofix: Option<&'static [&'static str]>,
    /// Flag that excludes one rule from auto-fix, repeated per rule.
    pub unfixable_flag: Option<&'static str>,
    pub recovery: Option<&'static ConfigRecovery>,
}

const MINUTE: Duration = Duration::from_secs(60);

const BASE: ToolSpec = ToolSpec {
    name: "",
    binary: "",
    program: None,
    fix: None,
    check: &[],
    versioned: &[],
    targets: Targets::Files,
    fails_on_output: false,
    failure_codes: &[],
    timeout: Duration::from_secs(120),
    autofix: None,
    unfixable_flag: None,
    recovery: None,
};

pub static CATALOG: &[ToolSpec] = &[
    // Go
    ToolSpec {
        name: "gofumpt",
        binary: "gofumpt",
        fix: Some(&["-w"]),
        check: &["-l"],
        fails_on_output: true,
        ..BASE
    },
    ToolSpec {
        name: "gofmt",
        binary: "gofmt",
        fix: Some(&["-w"]),
        check: &["-l"],
        fails_on_output: true,
        ..BASE
    },
    ToolSpec {
        name: "golangci-lint",
        binary: "golangci-lint",
        check: &["run", "--fast"],
        versioned: &[VersionedArgs {
            min_major: 2,
            check: &["run", "--fast-only"],
        }],
        targets: Targets::Dirs,
        failure_codes: &[2, 3, 4, 5, 7],
        timeout: Duration::from_secs(5 * 60),
        autofix: Some(&["run", "--fix"]),
        recovery: Some(&super::recovery::GOLANGCI_LINT),
        ..BASE
    },
    ToolSpec {
        name: "go-vet",
        binary: "go",
        check: &["vet"],
        targets: Targets::Dirs,
        timeout: Duration::from_secs(3 * 60),
        ..BASE
    },
    // Python
    ToolSpec {
        name: "ruff-format",
        binary: "ruff",
        fix: Some(&["format", "--quiet"]),
        check: &["format", "--check", "--quiet"],
        failure_codes: &[2],
        recovery: Some(&super::recovery::RUFF),
        ..BASE
    },
    ToolSpec {
        name: "black",
        binary: "black",
        fix: Some(&["--quiet"]),
        check: &["--check", "--quiet"],
        failure_codes: &[123],
        ..BASE
    },
    ToolSpec {
        name: "ruff",
        binary: "ruff",
        check: &["check", "--quiet", "--no-fix"],
        failure_codes: &[2],
        autofix: Some(&["check", "--quiet", "--fix"]),
        unfixable_flag: Some("--unfixable"),
        recovery: Some(&super::recovery::RUFF),
        ..BASE
    },
    ToolSpec {
        name: "flake8",
        binary: "flake8",
        check: &[],
        ..BASE
    },
    // JavaScript / TypeScript
    ToolSpec {
        name: "biome-format",
        binary: "biome",
        fix: Some(&["format", "--write"]),
        check: &["format"],
        ..BASE
    },
    ToolSpec {
        name: "prettier",
        binary: "prettier",
        fix: Some(&["--write", "--log-level", "warn"]),
        check: &["--check", "--log-level", "warn"],
        failure_codes: &[2],
        ..BASE
    },
    ToolSpec {
        name: "biome-lint",
        binary: "biome",
        check: &["lint"],
        autofix: Some(&["lint", "--write"]),
        ..BASE
    },
    ToolSpec {
        name: "eslint",
        binary: "eslint",
        check: &["--max-warnings", "0"],
        failure_codes: &[2],
        autofix: Some(&["--max-warnings", "0", "--fix"]),
        recovery: Some(&super::recovery::ESLINT),
        ..BASE
    },
    // Rust
    ToolSpec {
        name: "rustfmt",
        binary: "rustfmt",
        fix: Some(&["--edition", "2021"]),
        check: &["--edition", "2021", "--check"],
        ..BASE
    },
    ToolSpec {
        name: "clippy",
        binary: "cargo-clippy",
        program: Some(("cargo", &["clippy", "--quiet"])),
        check: &["--", "-D", "warnings"],
        targets: Targets::Project,
        timeout: Duration::from_secs(10 * 60),
        autofix: Some(&["--fix", "--allow-dirty", "--allow-staged", "--", "-D", "warnings"]),
        ..BASE
    },
    // Shell
    ToolSpec {
        name: "shfmt",
        binary: "shfmt",
        fix: Some(&["-w"]),
        check: &["-d"],
        ..BASE
    },
    ToolSpec {
        name: "shellcheck",
        binary: "shellcheck",
        check: &["--format", "gcc"],
        failure_codes: &[2, 3, 4],
        ..BASE
    },
    // Terraform
    ToolSpec {
        name: "terraform-fmt",
        binary: "terraform",
        fix: Some(&["fmt"]),
        check: &["fmt", "-check", "-diff"],
        targets: Targets::EachFile,
        ..BASE
    },
    ToolSpec {
        name: "tofu-fmt",
        binary: "tofu",
        fix: Some(&["fmt"]),
        check: &["fmt", "-check", "-diff"],
        targets: Targets::EachFile,
        ..BASE
    },
    ToolSpec {
        name: "tflint",
        binary: "tflint",
        check: &["--format", "compact"],
        targets: Targets::Project,
        timeout: Duration::from_secs(3 * 60),
        ..BASE
    },
    // YAML
    ToolSpec {
        name: "yamlfmt",
        binary: "yamlfmt",
        fix: Some(&[]),
        check: &["-lint"],
        ..BASE
    },
    ToolSpec {
        name: "yamllint",
        binary: "yamllint",
        check: &["--strict", "--format", "parsable"],
        ..BASE
    },
    // Markdown
    ToolSpec {
        name: "markdownlint-cli2",
        binary: "markdownlint-cli2",
        check: &[],
        failure_codes: &[2],
        autofix: Some(&["--fix"]),
        ..BASE
    },
    ToolSpec {
        name: "markdownlint",
        binary: "markdownlint",
        check: &[],
        autofix: Some(&["--fix"]),
        ..BASE
    },
    // Nix
    ToolSpec {
        name: "alejandra",
        binary: "alejandra",
        fix: Some(&["--quiet"]),
        check: &["--check", "--quiet"],
        ..BASE
    },
    ToolSpec {
        name: "nixpkgs-fmt",
        binary: "nixpkgs-fmt",
        fix: Some(&[]),
        check: &["--check"],
        ..BASE
    },
    ToolSpec {
        name: "statix",
        binary: "statix",
        check: &["check", "--format", "errfmt"],
        targets: Targets::EachFile,
        timeout: MINUTE,
        ..BASE
    },
];

/// Find a tool definition by name.
pub fn lookup(name: &str) -> Option<&'static ToolSpec> {
    CATALOG.iter().find(|t| t.name == name)
}

impl ToolSpec {
    /// Check-mode arguments for an installed major version.
    pub fn check_args(&self, major: Option<u64>) -> &'static [&'static str] {
        major
            .and_then(|m| {
                self.versioned
                    .iter()
                    .filter(|v| v.min_major <= m)
                    .max_by_key(|v| v.min_major)
            })
            .map(|v| v.check)
            .unwrap_or(self.check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_unique() {
        let mut names: Vec<_> = CATALOG.iter().map(|t| t.name).collect();
        let n = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), n);
    }

    #[test]
    fn test_golangci_lint_fast_flag_by_major_version() {
        let t = lookup("golangci-lint").unwrap();
        assert_eq!(t.check_args(Some(1)), &["run", "--fast"]);
        assert_eq!(t.check_args(Some(2)), &["run", "--fast-only"]);
        assert_eq!(t.check_args(Some(3)), &["run", "--fast-only"]);
        assert_eq!(t.check_args(None), &["run", "--fast"]);
    }

    #[test]
    fn test_formatters_have_fix_mode() {
        for lang in crate::profiles::Language::ALL {
            for name in lang.profile().formatters {
                assert!(lookup(name).unwrap().fix.is_some(), "{name} has no fix mode");
            }
        }
    }
}
