//! Config-error recovery heuristics.
//!
//! Some tools abort when a project config file is stale, unreadable, or
//! written for another version. The only signal is their own error text, so
//! each rule pairs a set of regexes with the arguments that make the tool
//! ignore project configuration. The runner retries once with those
//! arguments.
//!
//! These strings track the tools' wording and will drift across releases;
//! keep all of them here so they can be updated without touching the runner.

use regex::RegexBuilder;

/// Override arguments that apply from a given major version on.
#[derive(Debug, Clone, Copy)]
pub struct VersionedOverride {
    pub min_major: u64,
    pub args: &'static [&'static str],
}

/// How to recognise a config-load failure and how to retry without config.
#[derive(Debug)]
pub struct ConfigRecovery {
    /// Case-insensitive regexes matched against combined stdout/stderr.
    pub patterns: &'static [&'static str],
    /// Arguments inserted before the targets on retry.
    pub override_args: &'static [&'static str],
    /// Version-specific replacements for `override_args`, highest match wins.
    pub versioned: &'static [VersionedOverride],
}

pub static GOLANGCI_LINT: ConfigRecovery = ConfigRecovery {
    patterns: &[
        r"can't load config",
        r"failed to load config",
        r"unsupported version of the configuration",
    ],
    override_args: &["--no-config"],
    versioned: &[],
};

pub static RUFF: ConfigRecovery = ConfigRecovery {
    patterns: &[
        r"failed to parse .*\.toml",
        r"ruff failed\s*\n\s*cause: .*(config|settings|toml)",
        r"unknown field .* expected one of",
    ],
    override_args: &["--isolated"],
    versioned: &[],
};

pub static ESLINT: ConfigRecovery = ConfigRecovery {
    patterns: &[
        r"no eslint configuration found",
        r"eslint couldn't find (a|an eslint\.config\.\(js\|mjs\|cjs\)) (configuration )?file",
        r"error: cannot read config file",
        r"failed to load config",
    ],
    override_args: &["--no-eslintrc"],
    versioned: &[VersionedOverride {
        min_major: 9,
        args: &["--no-config-lookup"],
    }],
};

impl ConfigRecovery {
    /// True when `output` looks like a config-load failure.
    pub fn matches(&self, output: &str) -> bool {
        self.patterns.iter().any(|p| {
            match RegexBuilder::new(p).case_insensitive(true).build() {
                Ok(re) => re.is_match(output),
                Err(e) => {
                    log::warn!("bad recovery pattern '{p}': {e}");
                    false
                }
            }
        })
    }

    /// Arguments that disable project config for an installed major version.
    pub fn args_for(&self, major: Option<u64>) -> &'static [&'static str] {
        major
            .and_then(|m| {
                self.versioned
                    .iter()
                    .filter(|v| v.min_major <= m)
                    .max_by_key(|v| v.min_major)
            })
            .map(|v| v.args)
            .unwrap_or(self.override_args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golangci_config_error_detected() {
        let out = "level=error msg=\"Running error: can't load config: unsupported version\"";
        assert!(GOLANGCI_LINT.matches(out));
        assert!(!GOLANGCI_LINT.matches("main.go:3:2: undefined: x (typecheck)"));
    }

    #[test]
    fn test_ruff_config_error_detected() {
        let out = "ruff failed\n  Cause: Failed to parse /repo/pyproject.toml\n";
        assert!(RUFF.matches(out));
        assert!(!RUFF.matches("a.py:1:1: F401 `os` imported but unused"));
    }

    #[test]
    fn test_eslint_override_depends_on_version() {
        assert_eq!(ESLINT.args_for(Some(8)), &["--no-eslintrc"]);
        assert_eq!(ESLINT.args_for(Some(9)), &["--no-config-lookup"]);
        assert_eq!(ESLINT.args_for(None), &["--no-eslintrc"]);
        assert!(ESLINT.matches("ESLint couldn't find a configuration file."));
        assert!(ESLINT.matches("Oops! Something went wrong! :(\n\nESLint: 8.57.0\n\nNo ESLint configuration found in /repo/src."));
    }

    #[test]
    fn test_all_patterns_compile() {
        for rule in [&GOLANGCI_LINT, &RUFF, &ESLINT] {
            for p in rule.patterns {
                assert!(regex::Regex::new(p).is_ok(), "{p}");
            }
        }
    }
}
