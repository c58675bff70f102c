// src/exec/notifier.rs

//! Live-reload notification channel.
//!
//! The notifier owns a long-lived dev server process. It is started once
//! (after the initial build) and asked to `broadcast` after every task the
//! watcher re-runs.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::exec::shell::shell_command;

/// Options understood by the dev server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Command used to invoke the server CLI, e.g. `browser-sync` or
    /// `npx browser-sync`.
    pub program: String,
    pub port: u16,
    /// Directory served as static content.
    pub base_dir: PathBuf,
    /// Launch a browser on start.
    pub open: bool,
    /// Allow remote peers.
    pub online: bool,
    /// Regex matched against server stdout to detect readiness.
    pub ready_on_stdout: String,
    /// Give up waiting for `ready_on_stdout` after this long.
    pub ready_timeout: Duration,
}

impl ServerConfig {
    /// Command line that starts the server.
    pub fn start_command(&self) -> String {
        let mut cmd = format!(
            "{} start --server {} --port {}",
            self.program,
            quote(&self.base_dir.to_string_lossy()),
            self.port
        );
        if !self.open {
            cmd.push_str(" --no-open");
        }
        if !self.online {
            cmd.push_str(" --no-online");
        }
        cmd
    }

    /// Command line that asks a running server to reload `targets` (all
    /// clients when empty).
    pub fn reload_command(&self, targets: &[String]) -> String {
        let mut cmd = format!("{} reload --port {}", self.program, self.port);
        if !targets.is_empty() {
            cmd.push_str(" --files ");
            cmd.push_str(
                &targets
                    .iter()
                    .map(|t| quote(t))
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }
        cmd
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Trait abstracting the reload channel.
///
/// Production code uses [`BrowserSyncNotifier`]; tests record calls instead.
pub trait ReloadNotifier: Send + Sync {
    /// Start the server. Completes once it is ready to accept clients.
    fn start<'a>(
        &'a self,
        config: &'a ServerConfig,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Ask every connected client to refresh `targets`.
    fn broadcast<'a>(
        &'a self,
        targets: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Notifier driving the `browser-sync` CLI.
///
/// The server child is killed when the notifier is dropped.
#[derive(Default)]
pub struct BrowserSyncNotifier {
    state: Mutex<Option<Running>>,
}

struct Running {
    _child: Child,
    config: ServerConfig,
}

impl fmt::Debug for BrowserSyncNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserSyncNotifier").finish_non_exhaustive()
    }
}

impl BrowserSyncNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    async fn start_inner(&self, config: &ServerConfig) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.is_some() {
            warn!("reload server already running; ignoring start");
            return Ok(());
        }

        let ready_re = Regex::new(&config.ready_on_stdout)
            .with_context(|| format!("invalid ready_on_stdout regex '{}'", config.ready_on_stdout))?;

        let cmd = config.start_command();
        info!(port = config.port, base_dir = ?config.base_dir, %cmd, "starting reload server");

        let mut child = shell_command(&cmd, &[])
            .spawn()
            .with_context(|| format!("spawning reload server ({cmd})"))?;

        let (ready_tx, ready_rx) = oneshot::channel();
        match child.stdout.take() {
            Some(stdout) => spawn_stdout_monitor(stdout, ready_re, ready_tx),
            None => warn!("reload server has no stdout pipe; relying on ready timeout"),
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("reload server stderr: {}", line);
                }
            });
        }

        tokio::select! {
            res = ready_rx => {
                if res.is_ok() {
                    info!(port = config.port, "reload server ready");
                } else {
                    // stdout closed before the ready line; the process likely exited.
                    if let Some(status) = child.try_wait().context("checking reload server status")? {
                        bail!("reload server exited during startup with {status}");
                    }
                    debug!("reload server stdout closed before ready line");
                }
            }
            _ = tokio::time::sleep(config.ready_timeout) => {
                debug!(timeout = ?config.ready_timeout, "ready timeout elapsed; assuming reload server is up");
            }
        }

        *state = Some(Running {
            _child: child,
            config: config.clone(),
        });
        Ok(())
    }

    async fn broadcast_inner(&self, targets: &[String]) -> Result<()> {
        let config = match self.state.lock().await.as_ref() {
            Some(running) => running.config.clone(),
            None => {
                debug!("reload server not started; skipping broadcast");
                return Ok(());
            }
        };

        let cmd = config.reload_command(targets);
        debug!(%cmd, "broadcasting reload");
        let output = shell_command(&cmd, &[])
            .output()
            .await
            .with_context(|| format!("running reload command ({cmd})"))?;

        if !output.status.success() {
            bail!(
                "reload command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

impl ReloadNotifier for BrowserSyncNotifier {
    fn start<'a>(
        &'a self,
        config: &'a ServerConfig,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.start_inner(config))
    }

    fn broadcast<'a>(
        &'a self,
        targets: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.broadcast_inner(targets))
    }
}

/// Drain server stdout at debug level, firing `ready_tx` on the first line
/// that matches `ready_re`.
fn spawn_stdout_monitor(stdout: ChildStdout, ready_re: Regex, ready_tx: oneshot::Sender<()>) {
    tokio::spawn(async move {
        let mut ready_tx = Some(ready_tx);
        let mut lines = BufReader::new(stdout).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            debug!("reload server stdout: {}", line);
            if ready_re.is_match(&line) {
                if let Some(tx) = ready_tx.take() {
                    let _ = tx.send(());
                }
            }
        }

        debug!("reload server stdout monitor ended");
    });
}
