//! Findings and their run-level aggregation.
//!
//! Every finding is blocking. Ordering is an explicit key (profile detection
//! index, then role, then emission sequence) so parallel or sequential
//! evaluation yields identical reports.

use serde::Serialize;
use std::fmt;

/// Position of a pipeline stage within one profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Formatter,
    Linter,
    /// Threshold and user-supplied checks.
    Check,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Formatter => "formatter",
            Role::Linter => "linter",
            Role::Check => "check",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Check mode still reports differences after the fix pass.
    FormattingNeeded,
    /// A linter or check reported a rule violation.
    LintViolation,
    /// The tool itself could not run to completion.
    ToolFailure,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::FormattingNeeded => "formatting-needed",
            Category::LintViolation => "lint-violation",
            Category::ToolFailure => "tool-failure",
        })
    }
}

/// One reportable problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub tool: String,
    pub profile: String,
    pub role: Role,
    pub category: Category,
    pub raw_output: String,
    pub blocking: bool,
}

impl Finding {
    pub fn new(
        tool: impl Into<String>,
        profile: impl Into<String>,
        role: Role,
        category: Category,
        raw_output: impl Into<String>,
    ) -> Self {
        Finding {
            tool: tool.into(),
            profile: profile.into(),
            role,
            category,
            raw_output: raw_output.into(),
            blocking: true,
        }
    }
}

/// Sort key: (profile detection index, role, sequence within the role).
pub type SortKey = (usize, Role, usize);

/// Ordered accumulation of findings; no deduplication across tools.
#[derive(Debug, Default)]
pub struct Aggregator {
    entries: Vec<(SortKey, Finding)>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record findings emitted by one stage of one profile, in emission order.
    pub fn extend<I>(&mut self, profile_index: usize, role: Role, findings: I)
    where
        I: IntoIterator<Item = Finding>,
    {
        for (seq, f) in findings.into_iter().enumerate() {
            self.entries.push(((profile_index, role, seq), f));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Findings in report order.
    pub fn into_sorted(mut self) -> Vec<Finding> {
        self.entries.sort_by_key(|(k, _)| *k);
        self.entries.into_iter().map(|(_, f)| f).collect()
    }
}
