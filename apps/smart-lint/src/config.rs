//! Configuration discovery and effective settings resolution.
//!
//! smart-lint reads `.smart-lint.toml|yaml|yml` from the working-tree root
//! (the closest ancestor holding one, or a `.git` directory). Setups that
//! keep hook settings in a shared `hook-config.json` can put the same keys
//! under its `"smart-lint"` section instead; it is looked up in the root and
//! in `.claude/`.
//!
//! Defaults:
//! - `output`: `human`
//! - `parallel`: false
//! - `timeout_secs`: per-tool default from the catalog
//! - `lock_timeout_secs`: 30
//! - `detect_depth`: 3
//! - `ignore_file`: `.smart-lint-ignore`
//! - `disable_marker`: `smart-lint-disable`, searched in the first 5 lines
//! - `context_files`: `CLAUDE.md`, `AGENTS.md`, `.claude/CLAUDE.md`
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::{Error, Result};
use crate::profiles::Language;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILES: &[&str] = &[".smart-lint.toml", ".smart-lint.yaml", ".smart-lint.yml"];
const HOOK_CONFIG_FILES: &[&str] = &["hook-config.json", ".claude/hook-config.json"];
const HOOK_CONFIG_SECTION: &str = "smart-lint";

#[derive(Debug, Default, Deserialize, Clone)]
/// Per-language section under `[languages.<id>]`.
pub struct LanguageCfg {
    pub enabled: Option<bool>,
    /// Preferred formatter catalog name, or `"none"`.
    pub formatter: Option<String>,
    /// Preferred linter catalog name, or `"none"`.
    pub linter: Option<String>,
    /// Let the linter apply safe fixes before reporting.
    pub autofix: Option<bool>,
    /// Rules excluded from linter safe-fix.
    pub unfixable: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
/// Numeric limits consumed by threshold and custom checks.
pub struct Thresholds {
    pub max_file_size_kb: Option<u64>,
    pub max_complexity: Option<u64>,
    pub min_coverage: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// A user-supplied check from `[[checks]]`.
pub struct CheckCfg {
    pub name: String,
    pub command: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub pass_files: Option<bool>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `.smart-lint.toml|yaml` or `hook-config.json`.
pub struct SmartLintConfig {
    pub output: Option<String>,
    pub parallel: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub lock_timeout_secs: Option<u64>,
    pub detect_depth: Option<usize>,
    pub ignore_file: Option<String>,
    pub disable_marker: Option<String>,
    pub marker_lines: Option<usize>,
    pub context_files: Option<Vec<String>>,
    #[serde(default)]
    pub languages: BTreeMap<Language, LanguageCfg>,
    #[serde(default)]
    pub thresholds: Option<Thresholds>,
    #[serde(default)]
    pub checks: Vec<CheckCfg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Human,
    Json,
}

impl OutputMode {
    /// Parse an output name; unknown names fall back to human output.
    pub fn parse(s: &str) -> OutputMode {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => OutputMode::Json,
            "human" | "" => OutputMode::Human,
            other => {
                log::warn!("unknown output mode '{other}', using human");
                OutputMode::Human
            }
        }
    }
}

/// A custom check after validation.
#[derive(Debug, Clone)]
pub struct CustomCheck {
    pub name: String,
    pub command: Vec<String>,
    /// Empty means the check runs once for the whole run.
    pub languages: Vec<Language>,
    pub pass_files: bool,
    pub timeout: Duration,
}

/// Effective per-language settings.
#[derive(Debug, Clone, Default)]
pub struct LanguageSettings {
    pub enabled: bool,
    pub formatter: Option<String>,
    pub linter: Option<String>,
    pub autofix: bool,
    /// `None` keeps the profile's default unfixable rules.
    pub unfixable: Option<Vec<String>>,
    pub timeout: Option<Duration>,
}

/// CLI-level overrides; `None` defers to config or defaults.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub start_dir: Option<PathBuf>,
    pub output: Option<String>,
    pub debug: bool,
    pub no_lock: bool,
}

#[derive(Debug, Clone)]
/// Fully-resolved settings used by the engine after applying precedence.
pub struct Settings {
    pub root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub output: OutputMode,
    pub debug: bool,
    pub parallel: bool,
    pub timeout: Option<Duration>,
    pub lock: bool,
    pub lock_timeout: Duration,
    pub detect_depth: usize,
    pub ignore_file: PathBuf,
    pub disable_marker: String,
    pub marker_lines: usize,
    pub context_files: Vec<String>,
    pub languages: BTreeMap<Language, LanguageCfg>,
    pub thresholds: Thresholds,
    pub checks: Vec<CustomCheck>,
}

impl Settings {
    /// Defaults for `root` with no config file.
    pub fn defaults(root: &Path) -> Settings {
        Settings {
            root: root.to_path_buf(),
            config_path: None,
            output: OutputMode::Human,
            debug: false,
            parallel: false,
            timeout: None,
            lock: true,
            lock_timeout: Duration::from_secs(30),
            detect_depth: 3,
            ignore_file: PathBuf::from(".smart-lint-ignore"),
            disable_marker: "smart-lint-disable".to_string(),
            marker_lines: 5,
            context_files: vec![
                "CLAUDE.md".to_string(),
                "AGENTS.md".to_string(),
                ".claude/CLAUDE.md".to_string(),
            ],
            languages: BTreeMap::new(),
            thresholds: Thresholds::default(),
            checks: Vec::new(),
        }
    }

    pub fn language(&self, lang: Language) -> LanguageSettings {
        let cfg = self.languages.get(&lang).cloned().unwrap_or_default();
        LanguageSettings {
            enabled: cfg.enabled.unwrap_or(true),
            formatter: cfg.formatter,
            linter: cfg.linter,
            autofix: cfg.autofix.unwrap_or(false),
            unfixable: cfg.unfixable,
            timeout: cfg.timeout_secs.map(Duration::from_secs).or(self.timeout),
        }
    }
}

/// Walk upward from `start` to detect the working-tree root.
///
/// Stops when a `.smart-lint.*` file or a `.git` entry is found. Without
/// either, `start` itself is the root.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|f| cur.join(f).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        // A relative path's last parent is "", which is not a directory.
        match cur.parent() {
            Some(p) if !p.as_os_str().is_empty() => cur = p,
            _ => return start.to_path_buf(),
        }
    }
}

/// Load the project configuration if present.
///
/// A file that exists but cannot be parsed is an error; silently ignoring
/// it would hide a typo behind a run with default settings.
pub fn load_config(root: &Path) -> Result<Option<(PathBuf, SmartLintConfig)>> {
    for name in CONFIG_FILES {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        let s = fs::read_to_string(&path).map_err(|e| config_err(&path, e))?;
        let cfg: SmartLintConfig = if name.ends_with(".toml") {
            toml::from_str(&s).map_err(|e| config_err(&path, e))?
        } else {
            serde_yaml::from_str(&s).map_err(|e| config_err(&path, e))?
        };
        return Ok(Some((path, cfg)));
    }
    for name in HOOK_CONFIG_FILES {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        let s = fs::read_to_string(&path).map_err(|e| config_err(&path, e))?;
        let doc: serde_json::Value = serde_json::from_str(&s).map_err(|e| config_err(&path, e))?;
        if let Some(section) = doc.get(HOOK_CONFIG_SECTION) {
            let cfg: SmartLintConfig =
                serde_json::from_value(section.clone()).map_err(|e| config_err(&path, e))?;
            return Ok(Some((path, cfg)));
        }
    }
    Ok(None)
}

fn config_err(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Anchor the start directory at `cwd` unless it is already absolute.
pub fn absolute_start(start_dir: Option<&Path>, cwd: &Path) -> PathBuf {
    match start_dir {
        Some(d) if d.is_absolute() => d.to_path_buf(),
        Some(d) => cwd.join(d),
        None => cwd.to_path_buf(),
    }
}

/// Resolve `Settings` by merging CLI overrides, discovered config, and defaults.
pub fn resolve_effective(ov: &Overrides) -> Result<Settings> {
    resolve_effective_in(ov, &std::env::current_dir()?)
}

/// `resolve_effective` with relative start directories taken against `cwd`.
pub fn resolve_effective_in(ov: &Overrides, cwd: &Path) -> Result<Settings> {
    let start = absolute_start(ov.start_dir.as_deref(), cwd);
    let root = detect_repo_root(&start);
    let loaded = load_config(&root)?;
    let mut s = Settings::defaults(&root);
    s.debug = ov.debug;
    s.lock = !ov.no_lock;

    let (config_path, cfg) = match loaded {
        Some((p, c)) => (Some(p), c),
        None => (None, SmartLintConfig::default()),
    };
    s.config_path = config_path;

    s.output = ov
        .output
        .as_deref()
        .or(cfg.output.as_deref())
        .map(OutputMode::parse)
        .unwrap_or_default();
    if let Some(p) = cfg.parallel {
        s.parallel = p;
    }
    s.timeout = cfg.timeout_secs.map(Duration::from_secs);
    if let Some(t) = cfg.lock_timeout_secs {
        s.lock_timeout = Duration::from_secs(t);
    }
    if let Some(d) = cfg.detect_depth {
        s.detect_depth = d;
    }
    if let Some(f) = cfg.ignore_file {
        s.ignore_file = PathBuf::from(f);
    }
    if let Some(m) = cfg.disable_marker {
        s.disable_marker = m;
    }
    if let Some(n) = cfg.marker_lines {
        s.marker_lines = n;
    }
    if let Some(files) = cfg.context_files {
        s.context_files = files;
    }
    s.languages = cfg.languages;
    s.thresholds = cfg.thresholds.unwrap_or_default();

    let cfg_path = s.config_path.clone().unwrap_or_else(|| root.join(CONFIG_FILES[0]));
    for c in cfg.checks {
        s.checks.push(validate_check(c, &cfg_path, s.timeout)?);
    }
    Ok(s)
}

fn validate_check(c: CheckCfg, path: &Path, default_timeout: Option<Duration>) -> Result<CustomCheck> {
    if c.command.is_empty() {
        return Err(config_err(path, format!("check '{}' has an empty command", c.name)));
    }
    let mut languages = Vec::new();
    for id in &c.languages {
        match Language::from_id(id) {
            Some(l) => languages.push(l),
            None => {
                return Err(config_err(
                    path,
                    format!("check '{}' names unknown language '{id}'", c.name),
                ))
            }
        }
    }
    Ok(CustomCheck {
        name: c.name,
        command: c.command,
        languages,
        pass_files: c.pass_files.unwrap_or(true),
        timeout: c
            .timeout_secs
            .map(Duration::from_secs)
            .or(default_timeout)
            .unwrap_or(Duration::from_secs(120)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn resolve_in(root: &Path) -> Settings {
        resolve_effective(&Overrides {
            start_dir: Some(root.to_path_buf()),
            ..Overrides::default()
        })
        .unwrap()
    }

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join(".smart-lint.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output = "json"
parallel = true
timeout_secs = 45
[languages.python]
formatter = "black"
autofix = true
unfixable = ["F401", "F841"]
[languages.typescript]
enabled = false
[thresholds]
max_file_size_kb = 200
    "#
        )
        .unwrap();

        let s = resolve_in(root);
        assert_eq!(s.output, OutputMode::Json);
        assert!(s.parallel);
        let py = s.language(Language::Python);
        assert_eq!(py.formatter.as_deref(), Some("black"));
        assert!(py.autofix);
        assert_eq!(py.unfixable, Some(vec!["F401".to_string(), "F841".to_string()]));
        assert_eq!(py.timeout, Some(Duration::from_secs(45)));
        assert!(!s.language(Language::JavaScript).enabled);
        assert!(s.language(Language::Go).enabled);
        assert_eq!(s.thresholds.max_file_size_kb, Some(200));
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join(".smart-lint.yaml"),
            "languages:\n  go:\n    linter: go-vet\n    timeout_secs: 10\n",
        )
        .unwrap();

        let s = resolve_in(root);
        assert_eq!(s.output, OutputMode::Human);
        assert_eq!(s.detect_depth, 3);
        assert_eq!(s.marker_lines, 5);
        assert_eq!(s.disable_marker, "smart-lint-disable");
        assert!(s.lock);
        let go = s.language(Language::Go);
        assert_eq!(go.linter.as_deref(), Some("go-vet"));
        assert_eq!(go.timeout, Some(Duration::from_secs(10)));
        assert_eq!(s.language(Language::Rust).timeout, None);
    }

    #[test]
    fn test_cli_output_takes_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(".smart-lint.toml"), "output = \"json\"\n").unwrap();
        let s = resolve_effective(&Overrides {
            start_dir: Some(root.to_path_buf()),
            output: Some("human".into()),
            no_lock: true,
            ..Overrides::default()
        })
        .unwrap();
        assert_eq!(s.output, OutputMode::Human);
        assert!(!s.lock);
    }

    #[test]
    fn test_root_detection_walks_up_to_git() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("a/b")).unwrap();
        assert_eq!(detect_repo_root(&root.join("a/b")), root.to_path_buf());
    }

    #[test]
    fn test_relative_start_dir_resolves_against_cwd() {
        let dir = tempdir().unwrap();
        let cwd = dir.path();
        fs::create_dir_all(cwd.join(".git")).unwrap();
        fs::create_dir_all(cwd.join("services/api")).unwrap();
        fs::write(cwd.join("services/api/main.go"), "package main\n").unwrap();

        let s = resolve_effective_in(
            &Overrides {
                start_dir: Some(PathBuf::from("services/api")),
                ..Overrides::default()
            },
            cwd,
        )
        .unwrap();
        assert_eq!(s.root, cwd.to_path_buf());
        assert!(s.root.is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_start_keeps_absolute_and_joins_relative() {
        let cwd = Path::new("/work/repo");
        assert_eq!(absolute_start(None, cwd), PathBuf::from("/work/repo"));
        assert_eq!(
            absolute_start(Some(Path::new("pkg")), cwd),
            PathBuf::from("/work/repo/pkg")
        );
        assert_eq!(
            absolute_start(Some(Path::new("/elsewhere")), cwd),
            PathBuf::from("/elsewhere")
        );
    }

    #[test]
    fn test_relative_root_detection_never_yields_empty_path() {
        let start = Path::new("smart-lint-no-such-dir/sub");
        assert_eq!(detect_repo_root(start), start.to_path_buf());
    }

    #[test]
    fn test_hook_config_json_section() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".claude")).unwrap();
        fs::write(
            root.join(".claude/hook-config.json"),
            r#"{"file-protector": {}, "smart-lint": {"marker_lines": 8, "languages": {"shell": {"enabled": false}}}}"#,
        )
        .unwrap();
        let s = resolve_in(root);
        assert_eq!(s.marker_lines, 8);
        assert!(!s.language(Language::Shell).enabled);
        assert!(s.config_path.unwrap().ends_with("hook-config.json"));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(".smart-lint.toml"), "output = [").unwrap();
        let err = resolve_effective(&Overrides {
            start_dir: Some(root.to_path_buf()),
            ..Overrides::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_custom_checks_validated() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join(".smart-lint.toml"),
            r#"
[[checks]]
name = "complexity"
command = ["./scripts/complexity.sh"]
languages = ["python", "ts"]
pass_files = false

[[checks]]
name = "todo-scan"
command = ["grep", "-n", "XXX"]
timeout_secs = 5
"#,
        )
        .unwrap();
        let s = resolve_in(root);
        assert_eq!(s.checks.len(), 2);
        assert_eq!(s.checks[0].languages, vec![Language::Python, Language::JavaScript]);
        assert!(!s.checks[0].pass_files);
        assert_eq!(s.checks[0].timeout, Duration::from_secs(120));
        assert!(s.checks[1].languages.is_empty());
        assert!(s.checks[1].pass_files);
        assert_eq!(s.checks[1].timeout, Duration::from_secs(5));

        fs::write(
            root.join(".smart-lint.toml"),
            "[[checks]]\nname = \"x\"\ncommand = []\n",
        )
        .unwrap();
        assert!(resolve_effective(&Overrides {
            start_dir: Some(root.to_path_buf()),
            ..Overrides::default()
        })
        .is_err());
    }
}
