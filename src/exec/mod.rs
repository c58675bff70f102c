// src/exec/mod.rs

//! External process layer.
//!
//! Everything that leaves the process goes through here, using
//! `tokio::process::Command`:
//!
//! - [`shell`] builds platform shell commands and parses durations.
//! - [`validator`] provides the `Validator` trait and the command-backed
//!   implementation that parses unix-format lint output.
//! - [`notifier`] provides the `ReloadNotifier` trait and the browser-sync
//!   implementation used in production. Tests swap in a recording fake.

pub mod notifier;
pub mod shell;
pub mod validator;

pub use notifier::{BrowserSyncNotifier, ReloadNotifier, ServerConfig};
pub use validator::{CommandValidator, Diagnostic, ValidationReport, Validator};
