//! Verdict rendering.
//!
//! Supports `human` (default) and `json` outputs. Both go to stderr: the
//! calling runtime feeds stderr back to the agent, and stdout stays free for
//! anything the runtime parses itself.

use crate::config::OutputMode;
use crate::engine::{ProfileTools, RunVerdict};
use crate::findings::{Category, Finding};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::fs;
use std::path::Path;

/// Printed after every non-clean verdict.
pub const CLOSING_INSTRUCTION: &str =
    "Fix ALL of the issues above before continuing. Every item is blocking.";

fn use_colors(mode: OutputMode) -> bool {
    mode != OutputMode::Json && std::env::var_os("NO_COLOR").is_none()
}

/// Approximate token count of the caller's instruction files (bytes / 4).
pub fn context_tokens(root: &Path, files: &[String]) -> u64 {
    let bytes: u64 = files
        .iter()
        .filter_map(|f| fs::metadata(root.join(f)).ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum();
    bytes / 4
}

/// Group findings by tool, in order of first appearance.
fn group_by_tool(findings: &[Finding]) -> Vec<(&str, Vec<&Finding>)> {
    let mut groups: Vec<(&str, Vec<&Finding>)> = Vec::new();
    for f in findings {
        match groups.iter_mut().find(|(t, _)| *t == f.tool) {
            Some((_, items)) => items.push(f),
            None => groups.push((f.tool.as_str(), vec![f])),
        }
    }
    groups
}

/// Render the human-readable verdict.
pub fn render_human(verdict: &RunVerdict, tokens: u64, color: bool) -> String {
    let mut out = String::new();
    if verdict.is_clean() {
        let line = if verdict.profiles.is_empty() {
            "✔ smart-lint: nothing to check".to_string()
        } else {
            let ids: Vec<&str> = verdict.profiles.iter().map(|p| p.profile).collect();
            format!("✔ smart-lint: all clean ({})", ids.join(", "))
        };
        let metric = format!("context ~{tokens} tokens");
        if color {
            out.push_str(&format!("{} {}", line.green().bold(), metric.bright_black()));
        } else {
            out.push_str(&format!("{line} {metric}"));
        }
        return out;
    }

    let header = format!(
        "✖ smart-lint: {} blocking issue(s)",
        verdict.findings.len()
    );
    if color {
        out.push_str(&header.red().bold().to_string());
    } else {
        out.push_str(&header);
    }
    out.push('\n');
    for (tool, items) in group_by_tool(&verdict.findings) {
        out.push('\n');
        let title = format!("── {tool} ──");
        if color {
            out.push_str(&title.bold().to_string());
        } else {
            out.push_str(&title);
        }
        out.push('\n');
        for f in items {
            let tag = format!("[{} · {}]", f.profile, f.category);
            if color {
                let painted = match f.category {
                    Category::FormattingNeeded => tag.yellow().to_string(),
                    Category::LintViolation => tag.red().to_string(),
                    Category::ToolFailure => tag.magenta().to_string(),
                };
                out.push_str(&painted);
            } else {
                out.push_str(&tag);
            }
            out.push('\n');
            if !f.raw_output.is_empty() {
                out.push_str(&f.raw_output);
                out.push('\n');
            }
        }
    }
    out.push('\n');
    if color {
        out.push_str(&CLOSING_INSTRUCTION.red().bold().to_string());
    } else {
        out.push_str(CLOSING_INSTRUCTION);
    }
    out
}

/// Compose verdict JSON object (pure) for testing purposes.
pub fn compose_verdict_json(verdict: &RunVerdict, tokens: u64) -> JsonVal {
    let count = |c: Category| verdict.findings.iter().filter(|f| f.category == c).count();
    let summary = json!({
        "total": verdict.findings.len(),
        "formatting_needed": count(Category::FormattingNeeded),
        "lint_violation": count(Category::LintViolation),
        "tool_failure": count(Category::ToolFailure),
    });
    json!({
        "status": if verdict.is_clean() { "clean" } else { "blocked" },
        "exit_code": verdict.exit_code(),
        "profiles": verdict.profiles,
        "findings": verdict.findings,
        "summary": summary,
        "context_tokens": tokens,
        "instruction": if verdict.is_clean() { None } else { Some(CLOSING_INSTRUCTION) },
    })
}

/// Print the verdict to stderr in the requested format.
pub fn print_verdict(verdict: &RunVerdict, mode: OutputMode, tokens: u64) {
    match mode {
        OutputMode::Json => print_json(&compose_verdict_json(verdict, tokens)),
        OutputMode::Human => eprintln!("{}", render_human(verdict, tokens, use_colors(mode))),
    }
}

fn print_json(v: &JsonVal) {
    match serde_json::to_string_pretty(v) {
        Ok(s) => eprintln!("{s}"),
        Err(e) => log::error!("cannot encode JSON output: {e}"),
    }
}

/// Compose tool-binding JSON (pure).
pub fn compose_tools_json(list: &[ProfileTools]) -> JsonVal {
    let items: Vec<_> = list
        .iter()
        .map(|p| {
            let binding = |b: &crate::tools::ToolBinding| {
                json!({
                    "candidates": b.candidate_order,
                    "tool": b.resolved.as_ref().map(|t| t.name()),
                    "program": b.resolved.as_ref().map(|t| t.program.display().to_string()),
                    "version": b.resolved.as_ref().and_then(|t| t.version).map(|v| v.to_string()),
                })
            };
            json!({
                "profile": p.language.id(),
                "files": p.files,
                "formatter": binding(&p.formatter),
                "linter": binding(&p.linter),
            })
        })
        .collect();
    json!({ "profiles": items })
}

/// Print resolved bindings per profile.
pub fn print_tools(list: &[ProfileTools], mode: OutputMode) {
    if mode == OutputMode::Json {
        print_json(&compose_tools_json(list));
        return;
    }
    let color = use_colors(mode);
    if list.is_empty() {
        eprintln!("no profiles detected");
        return;
    }
    for p in list {
        let head = format!("{} ({} changed file(s))", p.language.id(), p.files);
        if color {
            eprintln!("{}", head.bold());
        } else {
            eprintln!("{head}");
        }
        eprintln!("  formatter: {}", p.formatter);
        eprintln!("  linter:    {}", p.linter);
    }
}
