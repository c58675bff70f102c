// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{Result, SitepipeError};
use crate::exec::shell::parse_duration;
use crate::exec::ServerConfig;

/// Task names that are taken by built-in entry points.
pub const RESERVED_TASK_NAMES: &[&str] = &["clean", "build", "watch", "default"];

/// Configuration used when no `Sitepipe.toml` exists: the classic static
/// front-end layout of pages, images, stylesheets, vendored libraries and
/// scripts, read from the sibling `simple-chat-app` checkout. A config file
/// that omits `[paths]` uses `src` instead.
pub const BUILTIN_CONFIG: &str = r#"
[paths]
src = "../simple-chat-app"

[validator.htmlhint]
cmd = "npx htmlhint --format unix"
strict = true

[validator.jshint]
cmd = "npx jshint --extract=auto --reporter=unix"
strict = true

[validator.eslint]
cmd = "npx eslint --format unix"

[task.pages]
src = ["*.html"]
dest = ""
validate = ["htmlhint", "jshint"]
changed_only = true

[task.images]
src = ["images/**/*"]
dest = "images"

[task.css]
src = ["css/*.css"]
dest = "css"
watch = ["css/**/*"]
reload = ["*.css"]

[task.lib]
src = ["lib/**/*"]
dest = "lib"

[task.js]
src = ["js/**/*.js"]
dest = "js"
validate = ["eslint"]
changed_only = true
watch = ["js/**/*"]
"#;

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [paths]
/// src = "app"
/// dist = "dist"
///
/// [validator.eslint]
/// cmd = "npx eslint --format unix"
///
/// [task.js]
/// src = ["js/**/*.js"]
/// dest = "js"
/// validate = ["eslint"]
/// ```
///
/// All sections are optional and have reasonable defaults, but validation
/// requires at least one task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub server: ServerSection,

    /// Validators from `[validator.<name>]`.
    #[serde(default)]
    pub validator: BTreeMap<String, ValidatorConfig>,

    /// Producer tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holding one means
/// every reference resolves and the `after` graph is acyclic.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub server: ServerSection,
    pub validator: BTreeMap<String, ValidatorConfig>,
    pub task: BTreeMap<String, TaskConfig>,
    /// Task names ordered so that every task follows its `after` list.
    task_order: Vec<String>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile, task_order: Vec<String>) -> Self {
        Self {
            paths: raw.paths,
            server: raw.server,
            validator: raw.validator,
            task: raw.task,
            task_order,
        }
    }

    /// Tasks in dependency order.
    pub fn tasks_in_order(&self) -> impl Iterator<Item = (&str, &TaskConfig)> {
        self.task_order
            .iter()
            .filter_map(|name| self.task.get(name).map(|t| (name.as_str(), t)))
    }

    /// Copy of this configuration with relative paths resolved against
    /// `root`.
    pub fn rooted_at(&self, root: &Path) -> Self {
        let mut cfg = self.clone();
        cfg.paths.src = root.join(&self.paths.src);
        cfg.paths.dist = root.join(&self.paths.dist);
        cfg.server.base_dir = self.server.base_dir.as_ref().map(|b| root.join(b));
        cfg
    }

    /// Dev server settings, with `base_dir` defaulting to the dist root.
    pub fn server_config(&self) -> Result<ServerConfig> {
        let ready_timeout = parse_duration(&self.server.ready_timeout)
            .map_err(|e| SitepipeError::ConfigError(format!("[server].ready_timeout: {e}")))?;
        Ok(ServerConfig {
            program: self.server.program.clone(),
            port: self.server.port,
            base_dir: self
                .server
                .base_dir
                .clone()
                .unwrap_or_else(|| self.paths.dist.clone()),
            open: self.server.open,
            online: self.server.online,
            ready_on_stdout: self.server.ready_on_stdout.clone(),
            ready_timeout,
        })
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    /// Source root all task globs are relative to.
    #[serde(default = "default_src")]
    pub src: PathBuf,

    /// Destination root; removed by `clean`.
    #[serde(default = "default_dist")]
    pub dist: PathBuf,
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_dist() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            src: default_src(),
            dist: default_dist(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_program")]
    pub program: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub open: bool,

    #[serde(default = "default_online")]
    pub online: bool,

    /// Directory to serve; defaults to `paths.dist`.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Regex over server stdout marking it ready.
    #[serde(default = "default_ready_on_stdout")]
    pub ready_on_stdout: String,

    /// Duration string such as `"5s"` or `"500ms"`.
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout: String,
}

fn default_program() -> String {
    "browser-sync".to_string()
}

fn default_port() -> u16 {
    6401
}

fn default_online() -> bool {
    true
}

fn default_ready_on_stdout() -> String {
    "Serving files".to_string()
}

fn default_ready_timeout() -> String {
    "5s".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            port: default_port(),
            open: false,
            online: default_online(),
            base_dir: None,
            ready_on_stdout: default_ready_on_stdout(),
            ready_timeout: default_ready_timeout(),
        }
    }
}

/// `[validator.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Shell command; file paths are appended as arguments.
    pub cmd: String,

    /// Fail on warnings even when the entry point only fails on errors.
    #[serde(default)]
    pub strict: bool,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Source globs, relative to `paths.src`.
    pub src: Vec<String>,

    /// Destination directory, relative to `paths.dist`.
    #[serde(default)]
    pub dest: String,

    /// Validators (by name) run over the selected files before copying.
    #[serde(default)]
    pub validate: Vec<String>,

    /// Only process files whose artifact is missing or older.
    #[serde(default)]
    pub changed_only: bool,

    /// Watch globs. If `None`, `src` is watched.
    #[serde(default)]
    pub watch: Option<Vec<String>>,

    /// Globs removed from both `src` and `watch`.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Tasks that must complete before this one.
    #[serde(default)]
    pub after: Vec<String>,

    /// Targets passed to the reload broadcast after a watch-triggered run.
    #[serde(default)]
    pub reload: Vec<String>,
}

impl TaskConfig {
    pub fn effective_watch(&self) -> &[String] {
        self.watch.as_deref().unwrap_or(&self.src)
    }
}
