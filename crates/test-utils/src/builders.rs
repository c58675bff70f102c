#![allow(dead_code)]

use std::path::Path;

use sitepipe::config::{ConfigFile, RawConfigFile, TaskConfig, ValidatorConfig};
use sitepipe::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_src(mut self, src: impl AsRef<Path>) -> Self {
        self.config.paths.src = src.as_ref().to_path_buf();
        self
    }

    pub fn with_dist(mut self, dist: impl AsRef<Path>) -> Self {
        self.config.paths.dist = dist.as_ref().to_path_buf();
        self
    }

    pub fn with_validator(mut self, name: &str, cmd: &str) -> Self {
        self.config.validator.insert(
            name.to_string(),
            ValidatorConfig {
                cmd: cmd.to_string(),
                strict: false,
            },
        );
        self
    }

    pub fn with_strict_validator(mut self, name: &str, cmd: &str) -> Self {
        self.config.validator.insert(
            name.to_string(),
            ValidatorConfig {
                cmd: cmd.to_string(),
                strict: true,
            },
        );
        self
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_ready_timeout(mut self, timeout: &str) -> Self {
        self.config.server.ready_timeout = timeout.to_string();
        self
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(src: &[&str]) -> Self {
        Self {
            task: TaskConfig {
                src: to_strings(src),
                ..TaskConfig::default()
            },
        }
    }

    pub fn dest(mut self, dest: &str) -> Self {
        self.task.dest = dest.to_string();
        self
    }

    pub fn validate(mut self, validators: &[&str]) -> Self {
        self.task.validate = to_strings(validators);
        self
    }

    pub fn changed_only(mut self) -> Self {
        self.task.changed_only = true;
        self
    }

    pub fn watch(mut self, patterns: &[&str]) -> Self {
        self.task.watch = Some(to_strings(patterns));
        self
    }

    pub fn exclude(mut self, patterns: &[&str]) -> Self {
        self.task.exclude = to_strings(patterns);
        self
    }

    pub fn after(mut self, deps: &[&str]) -> Self {
        self.task.after = to_strings(deps);
        self
    }

    pub fn reload(mut self, targets: &[&str]) -> Self {
        self.task.reload = to_strings(targets);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
