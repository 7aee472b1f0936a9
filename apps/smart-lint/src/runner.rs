//! Fix-and-verify execution of one resolved tool binding.
//!
//! Formatters first run in fix mode with their exit status ignored, then in
//! check mode; only the check result can produce a finding, so a second run
//! over unchanged files reports nothing new. Linters run once in check mode,
//! optionally with safe auto-fix.
//!
//! Per (profile, role) the runner moves through
//! `NotRun -> FixAttempted -> Verified`; only `Verified` is returned.

use crate::findings::{Category, Finding, Role};
use crate::process::{self, Invocation, Outcome};
use crate::tools::{ResolvedTool, Targets, ToolBinding};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound on file arguments per invocation.
const MAX_FILES_PER_INVOCATION: usize = 200;

/// Environment passed to every tool so diagnostics stay free of ANSI codes.
fn tool_env() -> Vec<(String, String)> {
    vec![("NO_COLOR".to_string(), "1".to_string())]
}

/// Options shared by every role of one profile.
#[derive(Debug, Clone)]
pub struct RunOptions<'a> {
    pub root: &'a Path,
    pub profile: &'static str,
    /// Replaces the catalog timeout when set.
    pub timeout: Option<Duration>,
    pub autofix: bool,
    pub unfixable: &'a [String],
}

/// Result of the verification step.
#[derive(Debug, Clone, PartialEq)]
pub enum Verified {
    Clean,
    Failed(Vec<Finding>),
}

impl Verified {
    pub fn into_findings(self) -> Vec<Finding> {
        match self {
            Verified::Clean => Vec::new(),
            Verified::Failed(f) => f,
        }
    }
}

#[derive(Debug)]
enum RoleState {
    NotRun,
    /// `without_config` is set once the fix pass had to bypass project
    /// configuration; the check pass then starts from the same arguments.
    FixAttempted { without_config: bool },
    Verified(Verified),
}

/// Run one role binding against the selected files.
///
/// Unbound roles and empty file sets contribute nothing.
pub fn run_binding(binding: &ToolBinding, files: &[PathBuf], opts: &RunOptions<'_>) -> Verified {
    let Some(tool) = binding.resolved.as_ref() else {
        return Verified::Clean;
    };
    if files.is_empty() {
        return Verified::Clean;
    }
    let run = ToolRun {
        tool,
        role: binding.role,
        files,
        opts,
        timeout: opts.timeout.unwrap_or(tool.spec.timeout),
    };
    let mut state = RoleState::NotRun;
    loop {
        log::debug!("{}/{}: {:?}", opts.profile, tool.name(), state);
        state = match state {
            RoleState::NotRun => run.fix_pass(),
            RoleState::FixAttempted { without_config } => {
                RoleState::Verified(run.verify(without_config))
            }
            RoleState::Verified(v) => return v,
        };
    }
}

struct ToolRun<'a> {
    tool: &'a ResolvedTool,
    role: Role,
    files: &'a [PathBuf],
    opts: &'a RunOptions<'a>,
    timeout: Duration,
}

/// Classification of a single check-mode outcome.
enum Evaluation {
    Clean,
    Violation(String),
    ConfigError(String),
    Broken(String),
    /// Ends the role: later invocations would hang the same way.
    TimedOut(String),
}

/// How a fix pass over all invocations ended.
enum FixRun {
    Done,
    ConfigError,
    Failed(Finding),
}

impl<'a> ToolRun<'a> {
    /// Fix mode for formatters. Exit codes are ignored; only a hang or a
    /// tool that cannot start ends the role early. A config-load failure is
    /// retried once without project configuration.
    fn fix_pass(&self) -> RoleState {
        let fix_args = match (self.role, self.tool.spec.fix) {
            (Role::Formatter, Some(args)) => args,
            _ => return RoleState::FixAttempted { without_config: false },
        };
        match self.run_fix(fix_args, &[]) {
            FixRun::Done => RoleState::FixAttempted { without_config: false },
            FixRun::Failed(f) => RoleState::Verified(Verified::Failed(vec![f])),
            FixRun::ConfigError => {
                let extra = self.override_args();
                log::warn!(
                    "{}: config could not be loaded in fix mode, retrying with {}",
                    self.tool.name(),
                    extra.join(" ")
                );
                match self.run_fix(fix_args, &extra) {
                    FixRun::Failed(f) => RoleState::Verified(Verified::Failed(vec![f])),
                    // A second config error surfaces in the check pass.
                    FixRun::Done | FixRun::ConfigError => {
                        RoleState::FixAttempted { without_config: true }
                    }
                }
            }
        }
    }

    fn run_fix(&self, fix_args: &[&str], extra: &[String]) -> FixRun {
        let recovery = self.tool.spec.recovery;
        for inv in self.invocations(fix_args, extra) {
            match process::run(&inv, self.opts.root, &tool_env(), self.timeout) {
                Outcome::Exited {
                    code: Some(code),
                    output,
                } if code != 0 && recovery.is_some_and(|r| r.matches(&output)) => {
                    log::debug!("fix pass {} could not load config:\n{output}", inv.display());
                    return FixRun::ConfigError;
                }
                Outcome::Exited { code, .. } => {
                    log::debug!("fix pass {} exited with {code:?}", inv.display());
                }
                Outcome::TimedOut { after, output } => {
                    return FixRun::Failed(self.failure(format!(
                        "fix pass timed out after {}s: {}\n{output}",
                        after.as_secs(),
                        inv.display()
                    )));
                }
                Outcome::FailedToStart(e) => {
                    return FixRun::Failed(
                        self.failure(format!("failed to start {}: {e}", inv.display())),
                    );
                }
            }
        }
        FixRun::Done
    }

    fn verify(&self, without_config: bool) -> Verified {
        let args = self.check_args();
        let extra = if without_config {
            self.override_args()
        } else {
            Vec::new()
        };
        let mut violations: Vec<String> = Vec::new();
        let mut broken: Vec<String> = Vec::new();
        for inv in self.invocations(&args, &extra) {
            match self.evaluate(&inv) {
                Evaluation::Clean => {}
                Evaluation::Violation(out) => violations.push(out),
                Evaluation::Broken(msg) => broken.push(msg),
                Evaluation::TimedOut(msg) => {
                    broken.push(msg);
                    break;
                }
                Evaluation::ConfigError(out) if without_config => {
                    broken.push(still_config_error(&extra, &out))
                }
                Evaluation::ConfigError(out) => {
                    if !self.recover(&args, &out, &mut violations, &mut broken) {
                        break;
                    }
                }
            }
        }
        let mut findings = Vec::new();
        if !violations.is_empty() {
            let category = match self.role {
                Role::Formatter => Category::FormattingNeeded,
                _ => Category::LintViolation,
            };
            findings.push(Finding::new(
                self.tool.name(),
                self.opts.profile,
                self.role,
                category,
                violations.join("\n"),
            ));
        }
        if !broken.is_empty() {
            findings.push(self.failure(broken.join("\n")));
        }
        if findings.is_empty() {
            Verified::Clean
        } else {
            Verified::Failed(findings)
        }
    }

    /// Arguments that make the tool skip project configuration.
    fn override_args(&self) -> Vec<String> {
        self.tool
            .spec
            .recovery
            .map(|r| r.args_for(self.tool.major()))
            .unwrap_or_default()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Retry once without project configuration. Used per invocation so
    /// `EachFile` tools recover file by file. Returns false after a timeout.
    fn recover(
        &self,
        args: &[String],
        first: &str,
        violations: &mut Vec<String>,
        broken: &mut Vec<String>,
    ) -> bool {
        if self.tool.spec.recovery.is_none() {
            broken.push(first.to_string());
            return true;
        }
        let extra = self.override_args();
        log::warn!(
            "{}: config could not be loaded, retrying with {}",
            self.tool.name(),
            extra.join(" ")
        );
        for inv in self.invocations(args, &extra) {
            match self.evaluate(&inv) {
                Evaluation::Clean => {}
                Evaluation::Violation(out) => violations.push(out),
                Evaluation::Broken(msg) => broken.push(msg),
                Evaluation::TimedOut(msg) => {
                    broken.push(msg);
                    return false;
                }
                Evaluation::ConfigError(out) => broken.push(still_config_error(&extra, &out)),
            }
        }
        true
    }

    fn check_args(&self) -> Vec<String> {
        let spec = self.tool.spec;
        let mut args: Vec<String> = match (self.role, self.opts.autofix, spec.autofix) {
            (Role::Linter, true, Some(fix)) => fix.iter().map(|s| s.to_string()).collect(),
            _ => spec
                .check_args(self.tool.major())
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        if self.role == Role::Linter && self.opts.autofix && spec.autofix.is_some() {
            if let Some(flag) = spec.unfixable_flag {
                for rule in self.opts.unfixable {
                    args.push(flag.to_string());
                    args.push(rule.clone());
                }
            }
        }
        args
    }

    /// Build the invocation(s) for `args`, with `extra` inserted before targets.
    fn invocations<S: AsRef<str>>(&self, args: &[S], extra: &[String]) -> Vec<Invocation> {
        let base = self
            .tool
            .base_invocation()
            .args(args.iter().map(|a| a.as_ref().to_string()))
            .args(extra.iter().cloned());
        let rel = |p: &PathBuf| path_arg(p);
        match self.tool.spec.targets {
            Targets::Project => vec![base],
            Targets::EachFile => self
                .files
                .iter()
                .map(|f| base.clone().arg(rel(f)))
                .collect(),
            Targets::Files => self
                .files
                .chunks(MAX_FILES_PER_INVOCATION)
                .map(|chunk| base.clone().args(chunk.iter().map(rel)))
                .collect(),
            Targets::Dirs => vec![base.args(package_dirs(self.files))],
        }
    }

    fn evaluate(&self, inv: &Invocation) -> Evaluation {
        let spec = self.tool.spec;
        match process::run(inv, self.opts.root, &tool_env(), self.timeout) {
            Outcome::FailedToStart(e) => {
                Evaluation::Broken(format!("failed to start {}: {e}", inv.display()))
            }
            Outcome::TimedOut { after, output } => Evaluation::TimedOut(format!(
                "timed out after {}s: {}{}",
                after.as_secs(),
                inv.display(),
                if output.is_empty() { String::new() } else { format!("\n{output}") }
            )),
            Outcome::Exited { code: None, output } => {
                Evaluation::Broken(format!("terminated by signal: {}\n{output}", inv.display()))
            }
            Outcome::Exited {
                code: Some(0),
                output,
            } => {
                if spec.fails_on_output && !output.trim().is_empty() {
                    Evaluation::Violation(output)
                } else {
                    Evaluation::Clean
                }
            }
            Outcome::Exited {
                code: Some(code),
                output,
            } => {
                if spec.recovery.is_some_and(|r| r.matches(&output)) {
                    Evaluation::ConfigError(output)
                } else if spec.failure_codes.contains(&code) {
                    Evaluation::Broken(format!("{} exited with code {code}\n{output}", inv.display()))
                } else if output.trim().is_empty() {
                    Evaluation::Violation(format!("{} exited with code {code}", inv.display()))
                } else {
                    Evaluation::Violation(output)
                }
            }
        }
    }

    fn failure(&self, message: String) -> Finding {
        Finding::new(
            self.tool.name(),
            self.opts.profile,
            self.role,
            Category::ToolFailure,
            message,
        )
    }
}

fn still_config_error(extra: &[String], output: &str) -> String {
    format!(
        "configuration could not be loaded, even with {}:\n{output}",
        extra.join(" ")
    )
}

/// A root-relative path as a command-line argument. Names starting with `-`
/// get a `./` prefix so tools do not parse them as options.
pub fn path_arg(path: &Path) -> String {
    let s = path.to_string_lossy();
    if s.starts_with('-') {
        format!("./{s}")
    } else {
        s.into_owned()
    }
}

/// Unique parent directories as `./dir` (or `.` for the root), sorted.
fn package_dirs(files: &[PathBuf]) -> Vec<String> {
    let dirs: BTreeSet<String> = files
        .iter()
        .map(|f| match f.parent() {
            Some(p) if !p.as_os_str().is_empty() => format!("./{}", p.to_string_lossy()),
            _ => ".".to_string(),
        })
        .collect();
    dirs.into_iter().collect()
}
