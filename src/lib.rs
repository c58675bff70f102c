// src/lib.rs

pub mod cli;
pub mod config;
pub mod copy;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod patterns;
pub mod site;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_or_builtin;
use crate::dag::Plan;
use crate::exec::{BrowserSyncNotifier, ReloadNotifier};
use crate::fs::RealFileSystem;
use crate::site::{EntryPoint, SitePipeline};
use crate::watch::{spawn_observers, WatchCoordinator, WatchSubscription};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - task registration and plan resolution
/// - the initial run
/// - (default entry) the reload server
/// - (default and `watch` entries) the watch loop until Ctrl-C
pub async fn run(args: CliArgs) -> Result<()> {
    let root = config_root_dir(&args.config)?;
    let cfg = load_or_builtin(&args.config)?.rooted_at(&root);

    let entry = EntryPoint::from_arg(args.task.as_deref());
    let settings = entry.settings();
    let pipeline = SitePipeline::from_config(cfg, Arc::new(RealFileSystem))?;
    let plan = pipeline.plan_for(&entry)?;

    if args.dry_run {
        print_dry_run(&pipeline, &entry, &plan)?;
        return Ok(());
    }

    if entry.checks_outputs() {
        pipeline.check_outputs().await?;
    }

    info!(%entry, strictness = %settings.strictness, "running entry point");
    if !plan.is_empty() {
        pipeline.runner().run(&plan, settings).await.into_result()?;
    }

    if !entry.watches() {
        return Ok(());
    }

    let notifier: Arc<dyn ReloadNotifier> = Arc::new(BrowserSyncNotifier::new());
    if entry.starts_server() {
        let server = pipeline.config().server_config()?;
        notifier.start(&server).await?;
    }

    let src_root = pipeline.config().paths.src.clone();
    let subscriptions = pipeline.subscriptions()?;
    let events = spawn_observers(&src_root, &subscriptions)?;
    let coordinator = WatchCoordinator::new(
        pipeline.runner().clone(),
        subscriptions,
        notifier,
        src_root,
        settings,
    );

    tokio::select! {
        _ = coordinator.run(events) => {}
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                eprintln!("failed to listen for Ctrl+C: {e}");
            }
            info!("interrupted; stopping");
        }
    }
    Ok(())
}

/// Figure out the directory relative paths in the config are resolved
/// against.
///
/// - If the config path has a non-empty parent (e.g. "site/Sitepipe.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Sitepipe.toml" (parent = ""),
///   we fall back to the current working directory.
///
/// The result is always absolute: watcher events carry absolute paths and
/// must strip against it even for files that no longer exist.
fn config_root_dir(config_path: &Path) -> Result<PathBuf> {
    let root = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::path::absolute(parent)
            .with_context(|| format!("resolving config directory {}", parent.display()))?,
        _ => std::env::current_dir().context("resolving current directory")?,
    };
    Ok(root)
}

/// Print the plan, tasks, subscriptions and server settings.
fn print_dry_run(pipeline: &SitePipeline, entry: &EntryPoint, plan: &Plan) -> Result<()> {
    let cfg = pipeline.config();
    println!("sitepipe dry-run");
    println!("  entry = {entry}");
    println!("  strictness = {}", entry.strictness());
    println!("  paths.src = {}", cfg.paths.src.display());
    println!("  paths.dist = {}", cfg.paths.dist.display());
    if plan.is_empty() {
        println!("  plan = (nothing to run before watching)");
    } else {
        println!("  plan = {plan}");
    }
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.tasks_in_order() {
        println!("  - {name}");
        println!("      src: {:?}", task.src);
        println!("      dest: {}", cfg.paths.dist.join(&task.dest).display());
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if !task.validate.is_empty() {
            println!("      validate: {:?}", task.validate);
        }
        if task.changed_only {
            println!("      changed_only: true");
        }
        if !task.exclude.is_empty() {
            println!("      exclude: {:?}", task.exclude);
        }
    }

    if entry.watches() {
        println!();
        println!("watch:");
        for sub in pipeline.subscriptions()? {
            print_subscription(&sub);
        }
    }

    if entry.starts_server() {
        let server = cfg.server_config()?;
        println!();
        println!("server:");
        println!("  start: {}", server.start_command());
        println!("  ready_on_stdout: {}", server.ready_on_stdout);
        println!("  ready_timeout: {:?}", server.ready_timeout);
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

fn print_subscription(sub: &WatchSubscription) {
    println!("  - {} <- {:?}", sub.owner(), sub.patterns());
    if !sub.exclude().is_empty() {
        println!("      exclude: {:?}", sub.exclude());
    }
    if !sub.reload_targets().is_empty() {
        println!("      reload: {:?}", sub.reload_targets());
    }
}
