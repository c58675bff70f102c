// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile, RESERVED_TASK_NAMES};
use crate::errors::{Result, SitepipeError};
use crate::exec::shell::parse_duration;
use crate::patterns::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let order = validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw, order))
    }
}

/// Check every invariant and return the task names in dependency order.
fn validate_raw_config(cfg: &RawConfigFile) -> Result<Vec<String>> {
    ensure_has_tasks(cfg)?;
    validate_server(cfg)?;
    validate_validators(cfg)?;
    validate_tasks(cfg)?;
    validate_task_dependencies(cfg)?;
    dependency_order(cfg)
}

fn config_error(msg: impl Into<String>) -> SitepipeError {
    SitepipeError::ConfigError(msg.into())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_error(
            "config must contain at least one [task.<name>] section",
        ));
    }
    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.program.trim().is_empty() {
        return Err(config_error("[server].program must not be empty"));
    }
    parse_duration(&cfg.server.ready_timeout)
        .map_err(|e| config_error(format!("[server].ready_timeout: {e}")))?;
    Regex::new(&cfg.server.ready_on_stdout)
        .map_err(|e| config_error(format!("[server].ready_on_stdout is not a valid regex: {e}")))?;
    Ok(())
}

fn validate_validators(cfg: &RawConfigFile) -> Result<()> {
    for (name, validator) in cfg.validator.iter() {
        if validator.cmd.trim().is_empty() {
            return Err(config_error(format!(
                "validator '{name}' has an empty `cmd`"
            )));
        }
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if RESERVED_TASK_NAMES.contains(&name.as_str()) {
            return Err(config_error(format!(
                "task name '{name}' is reserved for a built-in entry point"
            )));
        }
        if task.src.is_empty() {
            return Err(config_error(format!(
                "task '{name}' must list at least one `src` pattern"
            )));
        }
        for (field, patterns) in [
            ("src", task.src.as_slice()),
            ("watch", task.effective_watch()),
            ("exclude", task.exclude.as_slice()),
        ] {
            build_globset(patterns)
                .map_err(|e| config_error(format!("task '{name}' `{field}`: {e:#}")))?;
        }
        for validator in task.validate.iter() {
            if !cfg.validator.contains_key(validator) {
                return Err(config_error(format!(
                    "task '{name}' references unknown validator '{validator}' in `validate`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if dep == name {
                return Err(config_error(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(config_error(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn dependency_order(cfg: &RawConfigFile) -> Result<Vec<String>> {
    // Edge direction: dep -> task, so `after = ["A"]` on B adds A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(config_error(format!(
            "cycle detected in `after` dependencies involving task '{}'",
            cycle.node_id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<ConfigFile> {
        let raw: RawConfigFile = toml::from_str(toml_src)?;
        ConfigFile::try_from(raw)
    }

    #[test]
    fn order_places_dependencies_first() {
        let cfg = parse(
            r#"
            [task.b]
            src = ["b/*"]
            after = ["c"]

            [task.c]
            src = ["c/*"]
            "#,
        )
        .unwrap();
        let order: Vec<&str> = cfg.tasks_in_order().map(|(n, _)| n).collect();
        assert_eq!(order, vec!["c", "b"]);
    }

    #[test]
    fn bad_ready_timeout_is_rejected() {
        let err = parse(
            r#"
            [server]
            ready_timeout = "soon"

            [task.a]
            src = ["*"]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("ready_timeout"));
    }
}
