// src/exec/validator.rs

//! External validators (linters, HTML checkers).
//!
//! A [`Validator`] takes a set of file paths and returns a
//! [`ValidationReport`]. Production code uses [`CommandValidator`], which
//! shells out and parses unix-style reporter output; tests can plug in
//! their own implementation.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};

use crate::exec::shell::shell_command;
use crate::types::{LintStrictness, Severity};

/// One finding reported by a validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: String,
    pub line: u32,
    pub column: u32,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.path, self.line, self.column, self.severity, self.message
        )
    }
}

/// All diagnostics from one validator run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Whether the report is acceptable under `strictness`.
    pub fn passes(&self, strictness: LintStrictness) -> bool {
        match strictness {
            LintStrictness::FailOnWarning => self.diagnostics.is_empty(),
            LintStrictness::FailOnError => self.errors() == 0,
        }
    }
}

/// Trait abstracting a validator.
pub trait Validator: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Warnings fail this validator under every entry point.
    fn strict(&self) -> bool {
        false
    }

    /// Strictness this validator is judged by during a run at `run`.
    fn strictness(&self, run: LintStrictness) -> LintStrictness {
        if self.strict() {
            LintStrictness::FailOnWarning
        } else {
            run
        }
    }

    fn validate<'a>(
        &'a self,
        files: &'a [PathBuf],
    ) -> Pin<Box<dyn Future<Output = Result<ValidationReport>> + Send + 'a>>;
}

/// Parser for `path:line:col: message [Severity/rule]` lines.
#[derive(Debug, Clone)]
pub struct UnixReportParser {
    line_re: Regex,
}

impl UnixReportParser {
    pub fn new() -> Result<Self> {
        let line_re = Regex::new(
            r"^(?P<path>.+?):(?P<line>\d+):(?P<col>\d+):\s*(?P<msg>.*?)(?:\s*\[(?P<sev>(?i:error|warning))(?:/[^\]]*)?\])?\s*$",
        )
        .context("compiling unix report regex")?;
        Ok(Self { line_re })
    }

    /// Parse every recognised line of `output`. Lines without a severity tag
    /// count as errors; anything else (summaries, blank lines) is ignored.
    pub fn parse(&self, output: &str) -> Vec<Diagnostic> {
        output
            .lines()
            .filter_map(|line| self.parse_line(line))
            .collect()
    }

    fn parse_line(&self, line: &str) -> Option<Diagnostic> {
        let caps = self.line_re.captures(line.trim_end())?;
        let severity = match caps.name("sev").map(|m| m.as_str().to_ascii_lowercase()) {
            Some(s) if s == "warning" => Severity::Warning,
            _ => Severity::Error,
        };
        Some(Diagnostic {
            path: caps["path"].to_string(),
            line: caps["line"].parse().ok()?,
            column: caps["col"].parse().ok()?,
            severity,
            message: caps["msg"].trim().to_string(),
        })
    }
}

/// Validator backed by an external command.
///
/// File paths are appended to `cmd` as arguments; the command is expected to
/// print unix-format diagnostics (e.g. `eslint --format unix`).
#[derive(Debug, Clone)]
pub struct CommandValidator {
    name: String,
    cmd: String,
    strict: bool,
    parser: UnixReportParser,
}

impl CommandValidator {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            cmd: cmd.into(),
            strict: false,
            parser: UnixReportParser::new()?,
        })
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    async fn run(&self, files: &[PathBuf]) -> Result<ValidationReport> {
        if files.is_empty() {
            return Ok(ValidationReport::default());
        }

        let args: Vec<String> = files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();

        info!(validator = %self.name, files = args.len(), "running validator");
        let output = shell_command(&self.cmd, &args)
            .output()
            .await
            .with_context(|| format!("running validator '{}' ({})", self.name, self.cmd))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut diagnostics = self.parser.parse(&stdout);
        diagnostics.extend(self.parser.parse(&stderr));

        if !output.status.success() && diagnostics.is_empty() {
            let code = output.status.code().unwrap_or(-1);
            let detail = stderr
                .lines()
                .chain(stdout.lines())
                .find(|l| !l.trim().is_empty())
                .unwrap_or("no output");
            diagnostics.push(Diagnostic {
                path: self.name.clone(),
                line: 0,
                column: 0,
                severity: Severity::Error,
                message: format!("`{}` exited with code {code}: {}", self.cmd, detail.trim()),
            });
        }

        debug!(
            validator = %self.name,
            exit_code = ?output.status.code(),
            diagnostics = diagnostics.len(),
            "validator finished"
        );
        Ok(ValidationReport::new(diagnostics))
    }
}

impl Validator for CommandValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn strict(&self) -> bool {
        self.strict
    }

    fn validate<'a>(
        &'a self,
        files: &'a [PathBuf],
    ) -> Pin<Box<dyn Future<Output = Result<ValidationReport>> + Send + 'a>> {
        Box::pin(self.run(files))
    }
}
