//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "smart-lint",
    version,
    about = "Format and lint the files you just changed, for every language in the tree",
    long_about = "smart-lint detects the toolchains present in a working tree, selects the changed files of each, runs each formatter in fix mode then check mode, runs each linter, and reports every remaining problem as blocking.\n\nConfiguration precedence: CLI > .smart-lint.toml > defaults.\n\nExit codes: 0 clean, 2 findings (see stderr), 1 fatal error.",
    after_help = "Examples:\n  smart-lint\n  smart-lint --dir services/api --output json\n  smart-lint --hook < payload.json\n  smart-lint tools"
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(long, global = true, help = "Start directory for root discovery (default: current dir)")]
    pub dir: Option<PathBuf>,
    #[arg(long, global = true, action = clap::ArgAction::SetTrue, help = "Verbose diagnostics on stderr")]
    pub debug: bool,
    #[arg(long, global = true, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, global = true, action = clap::ArgAction::SetTrue, help = "Read a hook payload from stdin for the directory hint")]
    pub hook: bool,
    #[arg(long, global = true, action = clap::ArgAction::SetTrue, help = "Do not take the working-tree lock")]
    pub no_lock: bool,
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
/// Supported subcommands; `check` runs when none is given.
pub enum Commands {
    /// Run the fix-and-verify pipeline
    #[command(
        about = "Run formatters and linters on changed files",
        long_about = "Detect profiles, select changed files, fix, verify, and report. This is the default command."
    )]
    Check,
    /// Show resolved tools
    #[command(
        about = "Show resolved tools per profile",
        long_about = "Print which formatter and linter each detected profile binds to. Only version queries are run."
    )]
    Tools,
    /// Show version
    #[command(about = "Show version", long_about = "Print the current smart-lint version.")]
    Version,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.cmd.unwrap_or(Commands::Check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_check() {
        let cli = Cli::try_parse_from(["smart-lint"]).unwrap();
        assert_eq!(cli.command(), Commands::Check);
        assert!(!cli.debug && !cli.hook && !cli.no_lock);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["smart-lint", "tools", "--dir", "/x", "--output", "json"]).unwrap();
        assert_eq!(cli.command(), Commands::Tools);
        assert_eq!(cli.dir, Some(PathBuf::from("/x")));
        assert_eq!(cli.output.as_deref(), Some("json"));
    }
}
