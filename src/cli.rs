// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build, serve and live-reload a static web front-end.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run: `build`, `clean`, `watch` or a task name from the config.
    ///
    /// Without a task: clean, build, start the reload server and watch.
    #[arg(value_name = "TASK")]
    pub task: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Sitepipe.toml` in the current working directory, or the
    /// built-in layout if that file doesn't exist.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: std::path::PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the plan, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
