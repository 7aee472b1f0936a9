//! Threshold checks and user-supplied custom checks.
//!
//! Both run after the linter of a profile and share its selected files.
//! Custom checks without languages run once per invocation, after every
//! profile, on the union of all selected files.

use crate::config::{CustomCheck, Settings, Thresholds};
use crate::findings::{Category, Finding, Role};
use crate::process::{self, Invocation, Outcome};
use crate::profiles::Language;
use crate::runner::path_arg;
use std::fs;
use std::path::{Path, PathBuf};

pub const MAX_FILE_SIZE_TOOL: &str = "max-file-size";
/// Profile id used for findings of run-wide checks.
pub const GLOBAL_PROFILE: &str = "custom";

/// Report every file above `limit_kb`, as a single finding.
pub fn file_size_check(root: &Path, profile: &str, files: &[PathBuf], limit_kb: u64) -> Option<Finding> {
    let limit = limit_kb.saturating_mul(1024);
    let over: Vec<String> = files
        .iter()
        .filter_map(|f| {
            let len = fs::metadata(root.join(f)).ok()?.len();
            (len > limit).then(|| format!("{}: {} KB (limit {limit_kb} KB)", f.display(), len.div_ceil(1024)))
        })
        .collect();
    if over.is_empty() {
        return None;
    }
    Some(Finding::new(
        MAX_FILE_SIZE_TOOL,
        profile,
        Role::Check,
        Category::LintViolation,
        over.join("\n"),
    ))
}

/// Variables exported to custom check commands.
fn check_env(root: &Path, profile: &str, t: &Thresholds) -> Vec<(String, String)> {
    let mut env = vec![
        ("SMART_LINT_ROOT".to_string(), root.to_string_lossy().into_owned()),
        ("SMART_LINT_PROFILE".to_string(), profile.to_string()),
    ];
    if let Some(v) = t.max_complexity {
        env.push(("SMART_LINT_MAX_COMPLEXITY".to_string(), v.to_string()));
    }
    if let Some(v) = t.min_coverage {
        env.push(("SMART_LINT_MIN_COVERAGE".to_string(), v.to_string()));
    }
    if let Some(v) = t.max_file_size_kb {
        env.push(("SMART_LINT_MAX_FILE_SIZE_KB".to_string(), v.to_string()));
    }
    env
}

/// Run one custom check. Relative program paths resolve against `root`.
pub fn run_custom(
    check: &CustomCheck,
    root: &Path,
    profile: &str,
    files: &[PathBuf],
    thresholds: &Thresholds,
) -> Option<Finding> {
    let (program, rest) = check.command.split_first()?;
    let program_path = Path::new(program);
    let program = if program_path.is_relative() && program_path.components().count() > 1 {
        root.join(program_path).into_os_string()
    } else {
        program.into()
    };
    let mut inv = Invocation::new(program).args(rest.iter().cloned());
    if check.pass_files {
        inv = inv.args(files.iter().map(|f| path_arg(f)));
    }
    let env = check_env(root, profile, thresholds);
    let finding = |category, out: String| {
        Some(Finding::new(check.name.clone(), profile, Role::Check, category, out))
    };
    match process::run(&inv, root, &env, check.timeout) {
        Outcome::Exited { code: Some(0), .. } => None,
        Outcome::Exited {
            code: Some(code),
            output,
        } => {
            let out = if output.is_empty() {
                format!("{} exited with code {code}", inv.display())
            } else {
                output
            };
            finding(Category::LintViolation, out)
        }
        Outcome::Exited { code: None, output } => finding(
            Category::ToolFailure,
            format!("terminated by signal: {}\n{output}", inv.display()),
        ),
        Outcome::TimedOut { after, .. } => finding(
            Category::ToolFailure,
            format!("timed out after {}s: {}", after.as_secs(), inv.display()),
        ),
        Outcome::FailedToStart(e) => finding(
            Category::ToolFailure,
            format!("failed to start {}: {e}", inv.display()),
        ),
    }
}

/// Checks bound to one profile, in order: size threshold, then custom checks.
pub fn profile_checks(settings: &Settings, lang: Language, files: &[PathBuf]) -> Vec<Finding> {
    let mut out = Vec::new();
    if files.is_empty() {
        return out;
    }
    if let Some(limit) = settings.thresholds.max_file_size_kb {
        out.extend(file_size_check(&settings.root, lang.id(), files, limit));
    }
    for check in settings.checks.iter().filter(|c| c.languages.contains(&lang)) {
        log::debug!("{}: running check '{}'", lang.id(), check.name);
        out.extend(run_custom(check, &settings.root, lang.id(), files, &settings.thresholds));
    }
    out
}

/// Checks with no language binding, run once after all profiles.
pub fn global_checks(settings: &Settings, files: &[PathBuf]) -> Vec<Finding> {
    settings
        .checks
        .iter()
        .filter(|c| c.languages.is_empty())
        .filter_map(|check| {
            log::debug!("running global check '{}'", check.name);
            run_custom(check, &settings.root, GLOBAL_PROFILE, files, &settings.thresholds)
        })
        .collect()
}
