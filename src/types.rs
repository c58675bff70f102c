use std::fmt;

/// How strictly validator diagnostics are treated.
///
/// - `FailOnWarning`: any diagnostic fails the owning task. Used by the
///   named entry points (`build`, `js`, ...).
/// - `FailOnError`: only error-severity diagnostics fail the task. Used by
///   the default development entry point so that warnings don't interrupt
///   the edit/reload loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintStrictness {
    FailOnWarning,
    FailOnError,
}

impl Default for LintStrictness {
    fn default() -> Self {
        LintStrictness::FailOnWarning
    }
}

impl fmt::Display for LintStrictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintStrictness::FailOnWarning => f.write_str("fail-on-warning"),
            LintStrictness::FailOnError => f.write_str("fail-on-error"),
        }
    }
}

/// Severity attached to a single validator diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}
