// tests/config_errors.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::write_file;

use std::path::PathBuf;

use tempfile::TempDir;

use sitepipe::config::{load_and_validate, load_or_builtin, RawConfigFile};
use sitepipe::errors::SitepipeError;

fn config_error(builder: ConfigFileBuilder) -> String {
    match builder.try_build() {
        Err(SitepipeError::ConfigError(msg)) => msg,
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

fn task(src: &[&str]) -> TaskConfigBuilder {
    TaskConfigBuilder::new(src)
}

#[test]
fn empty_config_is_rejected() {
    let msg = config_error(ConfigFileBuilder::new());
    assert!(msg.contains("at least one [task.<name>]"), "{msg}");
}

#[test]
fn reserved_names_are_rejected() {
    for name in ["clean", "build", "watch", "default"] {
        let msg = config_error(ConfigFileBuilder::new().with_task(name, task(&["*"]).build()));
        assert!(msg.contains("reserved"), "{name}: {msg}");
    }
}

#[test]
fn empty_src_is_rejected() {
    let msg = config_error(ConfigFileBuilder::new().with_task("js", task(&[]).build()));
    assert!(msg.contains("at least one `src`"), "{msg}");
}

#[test]
fn unknown_references_are_rejected() {
    let msg = config_error(
        ConfigFileBuilder::new().with_task("js", task(&["js/*"]).after(&["lint"]).build()),
    );
    assert!(msg.contains("unknown dependency 'lint'"), "{msg}");

    let msg = config_error(
        ConfigFileBuilder::new().with_task("js", task(&["js/*"]).validate(&["eslint"]).build()),
    );
    assert!(msg.contains("unknown validator 'eslint'"), "{msg}");
}

#[test]
fn self_dependency_and_cycles_are_rejected() {
    let msg = config_error(
        ConfigFileBuilder::new().with_task("js", task(&["js/*"]).after(&["js"]).build()),
    );
    assert!(msg.contains("cannot depend on itself"), "{msg}");

    let msg = config_error(
        ConfigFileBuilder::new()
            .with_task("a", task(&["a/*"]).after(&["b"]).build())
            .with_task("b", task(&["b/*"]).after(&["a"]).build()),
    );
    assert!(msg.contains("cycle detected"), "{msg}");
}

#[test]
fn invalid_globs_name_the_field() {
    let msg = config_error(
        ConfigFileBuilder::new().with_task("css", task(&["css/*.css"]).exclude(&["css/[" ]).build()),
    );
    assert!(msg.contains("task 'css' `exclude`"), "{msg}");
}

#[test]
fn ready_timeout_must_parse() {
    let msg = config_error(
        ConfigFileBuilder::new()
            .with_ready_timeout("forever")
            .with_task("js", task(&["js/*"]).build()),
    );
    assert!(msg.contains("ready_timeout"), "{msg}");
}

#[test]
fn unknown_keys_are_toml_errors() {
    let err = toml::from_str::<RawConfigFile>(
        r#"
        [task.js]
        src = ["js/*"]
        cmd = "echo"
        "#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("cmd"), "{err}");
}

#[test]
fn config_file_round_trip_from_disk() {
    let tmp = TempDir::new().unwrap();
    write_file(
        tmp.path(),
        "Sitepipe.toml",
        r#"
        [paths]
        src = "app"

        [server]
        port = 3000
        open = true

        [task.pages]
        src = ["*.html"]
        reload = ["*.html"]
        "#,
    );

    let cfg = load_and_validate(tmp.path().join("Sitepipe.toml")).unwrap();
    assert_eq!(cfg.paths.src, PathBuf::from("app"));
    assert_eq!(cfg.paths.dist, PathBuf::from("dist"));

    let rooted = cfg.rooted_at(tmp.path());
    let server = rooted.server_config().unwrap();
    assert_eq!(server.port, 3000);
    assert!(server.open);
    assert!(server.online);
    assert_eq!(server.base_dir, tmp.path().join("dist"));
    assert_eq!(server.program, "browser-sync");
}

#[test]
fn explicit_missing_config_is_an_io_error() {
    let tmp = TempDir::new().unwrap();
    let err = load_or_builtin(tmp.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, SitepipeError::IoError(_)), "{err:?}");
}
