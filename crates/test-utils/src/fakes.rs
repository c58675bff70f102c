use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sitepipe::dag::{work_fn, TaskWork};
use sitepipe::errors::SitepipeError;
use sitepipe::exec::{Diagnostic, ReloadNotifier, ServerConfig, ValidationReport, Validator};
use sitepipe::types::Severity;

/// A validator that:
/// - records the file lists it was called with
/// - returns a fixed set of diagnostics.
#[derive(Debug, Clone)]
pub struct FakeValidator {
    name: String,
    diagnostics: Vec<Diagnostic>,
    strict: bool,
    calls: Arc<Mutex<Vec<Vec<PathBuf>>>>,
}

impl FakeValidator {
    pub fn clean(name: &str) -> Self {
        Self::with_diagnostics(name, Vec::new())
    }

    pub fn with_diagnostics(name: &str, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            name: name.to_string(),
            diagnostics,
            strict: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail on warnings regardless of the entry point.
    pub fn always_strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn calls(&self) -> Vec<Vec<PathBuf>> {
        self.calls.lock().unwrap().clone()
    }
}

impl Validator for FakeValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn strict(&self) -> bool {
        self.strict
    }

    fn validate<'a>(
        &'a self,
        files: &'a [PathBuf],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ValidationReport>> + Send + 'a>> {
        self.calls.lock().unwrap().push(files.to_vec());
        let report = ValidationReport::new(self.diagnostics.clone());
        Box::pin(async move { Ok(report) })
    }
}

/// Shorthand for a diagnostic at line 1, column 1.
pub fn diagnostic(path: &str, severity: Severity, message: &str) -> Diagnostic {
    Diagnostic {
        path: path.to_string(),
        line: 1,
        column: 1,
        severity,
        message: message.to_string(),
    }
}

/// A reload notifier that records `start` and `broadcast` calls.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    started: Arc<Mutex<Vec<ServerConfig>>>,
    broadcasts: Arc<Mutex<Vec<Vec<String>>>>,
    fail_broadcast: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose broadcasts are recorded and then fail.
    pub fn failing() -> Self {
        Self {
            fail_broadcast: true,
            ..Self::default()
        }
    }

    pub fn started(&self) -> Vec<ServerConfig> {
        self.started.lock().unwrap().clone()
    }

    pub fn broadcasts(&self) -> Vec<Vec<String>> {
        self.broadcasts.lock().unwrap().clone()
    }
}

impl ReloadNotifier for RecordingNotifier {
    fn start<'a>(
        &'a self,
        config: &'a ServerConfig,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        self.started.lock().unwrap().push(config.clone());
        Box::pin(async { Ok(()) })
    }

    fn broadcast<'a>(
        &'a self,
        targets: &'a [String],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        self.broadcasts.lock().unwrap().push(targets.to_vec());
        let fail = self.fail_broadcast;
        Box::pin(async move {
            if fail {
                anyhow::bail!("reload server unreachable");
            }
            Ok(())
        })
    }
}

/// Shared log of `start:<task>` / `end:<task>` entries.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: String) {
        self.entries.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// Position of `entry` in the trace. Panics if absent.
    pub fn index_of(&self, entry: &str) -> usize {
        self.entries()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("'{entry}' not in trace {:?}", self.entries()))
    }

    /// Work that records its start, sleeps for `delay`, records its end and
    /// then succeeds, or fails if `fail` is set.
    pub fn work(&self, name: &str, delay: Duration, fail: bool) -> TaskWork {
        let trace = self.clone();
        let name = name.to_string();
        work_fn(move |_settings| {
            let trace = trace.clone();
            let name = name.clone();
            async move {
                trace.push(format!("start:{name}"));
                tokio::time::sleep(delay).await;
                trace.push(format!("end:{name}"));
                if fail {
                    Err(SitepipeError::Other(anyhow::anyhow!("{name} exploded")))
                } else {
                    Ok(())
                }
            }
        })
    }
}
