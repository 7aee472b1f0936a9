//! Language profile registry.
//!
//! Every supported toolchain is a `Language` variant backed by one static
//! `LanguageProfile` table. Detection, selection, and tool resolution are
//! generic over that table, so adding a language means adding a variant and
//! its table; nothing else dispatches on the language.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directories never worth descending into, for any profile.
pub const GLOBAL_SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "vendor",
    "target",
    ".venv",
    "venv",
    "__pycache__",
    "dist",
    "build",
    ".terraform",
    ".direnv",
    ".next",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Supported toolchain domains, in detection order.
pub enum Language {
    Go,
    Python,
    #[serde(alias = "typescript", alias = "js", alias = "ts")]
    JavaScript,
    Rust,
    Shell,
    Terraform,
    Yaml,
    Markdown,
    Nix,
}

impl Language {
    /// All languages in the order they are detected and reported.
    pub const ALL: [Language; 9] = [
        Language::Go,
        Language::Python,
        Language::JavaScript,
        Language::Rust,
        Language::Shell,
        Language::Terraform,
        Language::Yaml,
        Language::Markdown,
        Language::Nix,
    ];

    pub fn id(self) -> &'static str {
        self.profile().id
    }

    pub fn profile(self) -> &'static LanguageProfile {
        match self {
            Language::Go => &GO,
            Language::Python => &PYTHON,
            Language::JavaScript => &JAVASCRIPT,
            Language::Rust => &RUST,
            Language::Shell => &SHELL,
            Language::Terraform => &TERRAFORM,
            Language::Yaml => &YAML,
            Language::Markdown => &MARKDOWN,
            Language::Nix => &NIX,
        }
    }

    /// Look up a language by id or alias (case-insensitive).
    pub fn from_id(id: &str) -> Option<Language> {
        let id = id.trim().to_ascii_lowercase();
        match id.as_str() {
            "typescript" | "js" | "ts" => Some(Language::JavaScript),
            _ => Language::ALL.into_iter().find(|l| l.id() == id),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One rule that makes a profile apply to a working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionRule {
    /// A file with exactly this name exists within the detection depth.
    Marker(&'static str),
    /// A file with this extension (without the dot) exists within the depth.
    Extension(&'static str),
}

/// Static description of one toolchain domain.
#[derive(Debug)]
pub struct LanguageProfile {
    pub language: Language,
    pub id: &'static str,
    pub markers: &'static [&'static str],
    pub extensions: &'static [&'static str],
    /// Directory patterns (gitignore syntax) whose contents never belong to this profile.
    pub excludes: &'static [&'static str],
    /// Formatter catalog names in preference order.
    pub formatters: &'static [&'static str],
    /// Linter catalog names in preference order.
    pub linters: &'static [&'static str],
    /// Rules left out of linter safe-fix unless configured otherwise.
    pub default_unfixable: &'static [&'static str],
}

impl LanguageProfile {
    /// Ordered detection rules: markers first, then extensions.
    pub fn detection_rules(&self) -> Vec<DetectionRule> {
        self.markers
            .iter()
            .map(|m| DetectionRule::Marker(*m))
            .chain(self.extensions.iter().map(|e| DetectionRule::Extension(*e)))
            .collect()
    }

    /// True when the file name carries one of this profile's extensions.
    pub fn claims(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
            }
            _ => false,
        }
    }
}

static GO: LanguageProfile = LanguageProfile {
    language: Language::Go,
    id: "go",
    markers: &["go.mod", "go.work"],
    extensions: &["go"],
    excludes: &["vendor/", "testdata/"],
    formatters: &["gofumpt", "gofmt"],
    linters: &["golangci-lint", "go-vet"],
    default_unfixable: &[],
};

static PYTHON: LanguageProfile = LanguageProfile {
    language: Language::Python,
    id: "python",
    markers: &[
        "pyproject.toml",
        "setup.py",
        "setup.cfg",
        "requirements.txt",
        "Pipfile",
    ],
    extensions: &["py", "pyi"],
    excludes: &[
        ".venv/",
        "venv/",
        "__pycache__/",
        ".tox/",
        "build/",
        "dist/",
        "*.egg-info/",
    ],
    formatters: &["ruff-format", "black"],
    linters: &["ruff", "flake8"],
    // Unused imports stay: an edit often adds the import before its first use.
    default_unfixable: &["F401"],
};

static JAVASCRIPT: LanguageProfile = LanguageProfile {
    language: Language::JavaScript,
    id: "javascript",
    markers: &["package.json", "tsconfig.json", "deno.json"],
    extensions: &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"],
    excludes: &[
        "node_modules/",
        "dist/",
        "build/",
        ".next/",
        "coverage/",
        "*.min.js",
    ],
    formatters: &["biome-format", "prettier"],
    linters: &["biome-lint", "eslint"],
    default_unfixable: &[],
};

static RUST: LanguageProfile = LanguageProfile {
    language: Language::Rust,
    id: "rust",
    markers: &["Cargo.toml"],
    extensions: &["rs"],
    excludes: &["target/"],
    formatters: &["rustfmt"],
    linters: &["clippy"],
    default_unfixable: &[],
};

static SHELL: LanguageProfile = LanguageProfile {
    language: Language::Shell,
    id: "shell",
    markers: &[],
    extensions: &["sh", "bash"],
    excludes: &[],
    formatters: &["shfmt"],
    linters: &["shellcheck"],
    default_unfixable: &[],
};

static TERRAFORM: LanguageProfile = LanguageProfile {
    language: Language::Terraform,
    id: "terraform",
    markers: &[],
    extensions: &["tf", "tfvars"],
    excludes: &[".terraform/"],
    formatters: &["terraform-fmt", "tofu-fmt"],
    linters: &["tflint"],
    default_unfixable: &[],
};

static YAML: LanguageProfile = LanguageProfile {
    language: Language::Yaml,
    id: "yaml",
    markers: &[],
    extensions: &["yml", "yaml"],
    excludes: &[],
    formatters: &["yamlfmt"],
    linters: &["yamllint"],
    default_unfixable: &[],
};

static MARKDOWN: LanguageProfile = LanguageProfile {
    language: Language::Markdown,
    id: "markdown",
    markers: &[],
    extensions: &["md", "markdown"],
    excludes: &["CHANGELOG.md"],
    formatters: &[],
    linters: &["markdownlint-cli2", "markdownlint"],
    default_unfixable: &[],
};

static NIX: LanguageProfile = LanguageProfile {
    language: Language::Nix,
    id: "nix",
    markers: &["flake.nix"],
    extensions: &["nix"],
    excludes: &["result/"],
    formatters: &["alejandra", "nixpkgs-fmt"],
    linters: &["statix"],
    default_unfixable: &[],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let ids: Vec<&str> = Language::ALL.iter().map(|l| l.id()).collect();
        let mut dedup = ids.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(ids.len(), dedup.len());
        assert_eq!(ids[0], "go");
        assert_eq!(ids[1], "python");
    }

    #[test]
    fn test_from_id_accepts_aliases() {
        assert_eq!(Language::from_id("TypeScript"), Some(Language::JavaScript));
        assert_eq!(Language::from_id("go"), Some(Language::Go));
        assert_eq!(Language::from_id("cobol"), None);
    }

    #[test]
    fn test_claims_by_extension_only() {
        let py = Language::Python.profile();
        assert!(py.claims("main.py"));
        assert!(py.claims("stubs.PYI"));
        assert!(!py.claims("py"));
        assert!(!py.claims(".py"));
        assert!(!py.claims("main.pyc"));
    }

    #[test]
    fn test_detection_rules_markers_before_extensions() {
        let rules = Language::Go.profile().detection_rules();
        assert_eq!(rules[0], DetectionRule::Marker("go.mod"));
        assert_eq!(rules.last(), Some(&DetectionRule::Extension("go")));
    }

    #[test]
    fn test_every_candidate_is_in_catalog() {
        for lang in Language::ALL {
            let p = lang.profile();
            for name in p.formatters.iter().chain(p.linters.iter()) {
                assert!(
                    crate::tools::catalog::lookup(name).is_some(),
                    "{} lists unknown tool {}",
                    p.id,
                    name
                );
            }
        }
    }
}
