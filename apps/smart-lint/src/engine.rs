//! Pipeline orchestration for one invocation.
//!
//! A `RunContext` is built once from the effective settings and passed by
//! reference through detection, selection, resolution, and execution. Each
//! detected profile is evaluated independently; profiles run sequentially
//! or on the rayon pool, and their findings are merged through the
//! `Aggregator` so both paths report identically.

use crate::checks;
use crate::config::Settings;
use crate::detect;
use crate::error::Result;
use crate::filter::PathFilter;
use crate::findings::{Aggregator, Finding, Role};
use crate::profiles::Language;
use crate::runner::{self, RunOptions};
use crate::select::{self, Candidates, ChangedFileSet, SelectOptions};
use crate::tools::{candidate_order, Resolver, ToolBinding};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Exit code for a clean run.
pub const EXIT_CLEAN: i32 = 0;
/// Exit code when any finding exists.
pub const EXIT_FINDINGS: i32 = 2;

/// Everything a run needs, computed once.
#[derive(Debug)]
pub struct RunContext {
    pub settings: Settings,
    pub ignore: PathFilter,
    pub candidates: Candidates,
    pub resolver: Resolver,
}

impl RunContext {
    /// Context using the process `PATH` for tool lookup.
    pub fn new(settings: Settings) -> Result<RunContext> {
        let resolver = Resolver::new(None, &settings.root);
        RunContext::with_resolver(settings, resolver)
    }

    pub fn with_resolver(settings: Settings, resolver: Resolver) -> Result<RunContext> {
        let ignore = PathFilter::from_file(&settings.root.join(&settings.ignore_file));
        let candidates = Candidates::collect(&settings.root)?;
        log::debug!(
            "{} candidate path(s) from {:?}",
            candidates.paths.len(),
            candidates.source
        );
        Ok(RunContext {
            settings,
            ignore,
            candidates,
            resolver,
        })
    }

    /// Detected profiles that are not disabled in config.
    pub fn profiles(&self) -> Result<Vec<Language>> {
        let detected = detect::detect(&self.settings.root, self.settings.detect_depth)?;
        Ok(detected
            .into_iter()
            .filter(|l| {
                let enabled = self.settings.language(*l).enabled;
                if !enabled {
                    log::debug!("{}: disabled in config", l.id());
                }
                enabled
            })
            .collect())
    }

    pub fn select(&self, lang: Language) -> ChangedFileSet {
        let opts = SelectOptions {
            ignore: &self.ignore,
            disable_marker: &self.settings.disable_marker,
            marker_lines: self.settings.marker_lines,
        };
        select::select(lang.profile(), &self.settings.root, &self.candidates, &opts)
    }

    /// Formatter and linter bindings for `lang`, honouring configured preferences.
    pub fn bindings(&self, lang: Language) -> (ToolBinding, ToolBinding) {
        let ls = self.settings.language(lang);
        let profile = lang.profile();
        let fmt = candidate_order(
            profile.formatters,
            ls.formatter.as_deref(),
            Role::Formatter,
            profile.id,
        );
        let lint = candidate_order(profile.linters, ls.linter.as_deref(), Role::Linter, profile.id);
        (
            self.resolver.resolve(Role::Formatter, fmt),
            self.resolver.resolve(Role::Linter, lint),
        )
    }
}

/// What was evaluated for one profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub profile: &'static str,
    pub files: usize,
    pub formatter: Option<&'static str>,
    pub linter: Option<&'static str>,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunVerdict {
    pub profiles: Vec<ProfileSummary>,
    pub findings: Vec<Finding>,
}

impl RunVerdict {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_clean() {
            EXIT_CLEAN
        } else {
            EXIT_FINDINGS
        }
    }
}

struct ProfileResult {
    summary: ProfileSummary,
    files: Vec<PathBuf>,
    stages: Vec<(Role, Vec<Finding>)>,
}

fn evaluate_profile(ctx: &RunContext, lang: Language) -> ProfileResult {
    let set = ctx.select(lang);
    let mut summary = ProfileSummary {
        profile: lang.id(),
        files: set.files.len(),
        formatter: None,
        linter: None,
    };
    if set.is_empty() {
        log::debug!("{}: no changed files, skipping", lang.id());
        return ProfileResult {
            summary,
            files: Vec::new(),
            stages: Vec::new(),
        };
    }

    let ls = ctx.settings.language(lang);
    let default_unfixable: Vec<String>;
    let unfixable: &[String] = match &ls.unfixable {
        Some(u) => u,
        None => {
            default_unfixable = lang
                .profile()
                .default_unfixable
                .iter()
                .map(|s| s.to_string())
                .collect();
            &default_unfixable
        }
    };
    let opts = RunOptions {
        root: &ctx.settings.root,
        profile: lang.id(),
        timeout: ls.timeout,
        autofix: ls.autofix,
        unfixable,
    };

    let (fmt, lint) = ctx.bindings(lang);
    summary.formatter = fmt.resolved.as_ref().map(|t| t.name());
    summary.linter = lint.resolved.as_ref().map(|t| t.name());

    let mut stages = Vec::with_capacity(3);
    for binding in [&fmt, &lint] {
        let found = runner::run_binding(binding, &set.files, &opts).into_findings();
        stages.push((binding.role, found));
    }
    stages.push((Role::Check, checks::profile_checks(&ctx.settings, lang, &set.files)));

    ProfileResult {
        summary,
        files: set.files,
        stages,
    }
}

/// Run every enabled, detected profile and return the merged verdict.
pub fn run(ctx: &RunContext) -> Result<RunVerdict> {
    let langs = ctx.profiles()?;
    if langs.is_empty() {
        log::debug!("no profiles detected; nothing to check");
        return Ok(RunVerdict {
            profiles: Vec::new(),
            findings: Vec::new(),
        });
    }

    let results: Vec<ProfileResult> = if ctx.settings.parallel {
        langs.par_iter().map(|l| evaluate_profile(ctx, *l)).collect()
    } else {
        langs.iter().map(|l| evaluate_profile(ctx, *l)).collect()
    };

    let mut agg = Aggregator::new();
    let mut profiles = Vec::with_capacity(results.len());
    let mut all_files: BTreeSet<PathBuf> = BTreeSet::new();
    for (index, r) in results.into_iter().enumerate() {
        for (role, found) in r.stages {
            agg.extend(index, role, found);
        }
        all_files.extend(r.files);
        profiles.push(r.summary);
    }

    if !all_files.is_empty() {
        let files: Vec<PathBuf> = all_files.into_iter().collect();
        agg.extend(
            profiles.len(),
            Role::Check,
            checks::global_checks(&ctx.settings, &files),
        );
    }

    log::debug!("{} finding(s) across {} profile(s)", agg.len(), profiles.len());
    Ok(RunVerdict {
        profiles,
        findings: agg.into_sorted(),
    })
}

/// Tool bindings of one detected profile, for the `tools` command.
#[derive(Debug)]
pub struct ProfileTools {
    pub language: Language,
    pub files: usize,
    pub formatter: ToolBinding,
    pub linter: ToolBinding,
}

/// Resolve bindings for every enabled profile without running any tool
/// beyond version queries.
pub fn list_tools(ctx: &RunContext) -> Result<Vec<ProfileTools>> {
    Ok(ctx
        .profiles()?
        .into_iter()
        .map(|language| {
            let (formatter, linter) = ctx.bindings(language);
            ProfileTools {
                language,
                files: ctx.select(language).files.len(),
                formatter,
                linter,
            }
        })
        .collect())
}
