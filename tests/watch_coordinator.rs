// tests/watch_coordinator.rs

mod common;
use crate::common::fakes::{RecordingNotifier, Trace};
use crate::common::{init_tracing, with_timeout, write_file};

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tempfile::TempDir;
use tokio::sync::mpsc;

use sitepipe::dag::TaskGraph;
use sitepipe::engine::{RunSettings, Runner};
use sitepipe::watch::{spawn_observers, ChangeEvent, ChangeEvents, WatchCoordinator, WatchSubscription};

const WORK: Duration = Duration::from_millis(5);

fn subscriptions() -> Vec<WatchSubscription> {
    vec![
        WatchSubscription::new("css", vec!["css/**/*".into()], vec![], vec!["*.css".into()]).unwrap(),
        WatchSubscription::new("js", vec!["js/**/*".into()], vec!["js/**/*.map".into()], vec![])
            .unwrap(),
    ]
}

fn coordinator(trace: &Trace, notifier: &RecordingNotifier, css_fails: bool) -> WatchCoordinator {
    let mut graph = TaskGraph::new();
    graph
        .register("css", Vec::<String>::new(), Some(trace.work("css", WORK, css_fails)))
        .unwrap();
    graph
        .register("js", Vec::<String>::new(), Some(trace.work("js", WORK, false)))
        .unwrap();

    WatchCoordinator::new(
        Runner::new(Arc::new(graph)),
        subscriptions(),
        Arc::new(notifier.clone()),
        "site",
        RunSettings::default(),
    )
}

#[tokio::test]
async fn change_runs_only_the_owner_then_broadcasts_once() {
    init_tracing();
    let trace = Trace::new();
    let notifier = RecordingNotifier::new();
    let coordinator = coordinator(&trace, &notifier, false);

    let ran = coordinator
        .handle_event(&ChangeEvent::new("site/css/main.css"))
        .await;

    assert_eq!(ran, vec!["css".to_string()]);
    assert_eq!(trace.entries(), vec!["start:css", "end:css"]);
    assert_eq!(notifier.broadcasts(), vec![vec!["*.css".to_string()]]);
}

#[tokio::test]
async fn unmatched_and_excluded_paths_do_nothing() {
    let trace = Trace::new();
    let notifier = RecordingNotifier::new();
    let coordinator = coordinator(&trace, &notifier, false);

    for path in ["site/index.html", "site/js/app.js.map", "elsewhere/css/main.css"] {
        let ran = coordinator.handle_event(&ChangeEvent::new(path)).await;
        assert!(ran.is_empty(), "{path}");
    }
    assert!(trace.entries().is_empty());
    assert!(notifier.broadcasts().is_empty());
}

#[tokio::test]
async fn deleted_file_under_relative_root_still_reruns_owner() {
    let trace = Trace::new();
    let notifier = RecordingNotifier::new();
    let coordinator = coordinator(&trace, &notifier, false);

    // Observers report absolute paths; this file no longer exists.
    let gone = std::env::current_dir().unwrap().join("site/css/old.css");
    assert!(!gone.exists());
    let ran = coordinator.handle_event(&ChangeEvent::new(gone)).await;

    assert_eq!(ran, vec!["css".to_string()]);
    assert_eq!(notifier.broadcasts(), vec![vec!["*.css".to_string()]]);
}

#[tokio::test]
async fn observer_scoped_events_only_reach_their_subscription() {
    let trace = Trace::new();
    let notifier = RecordingNotifier::new();
    let coordinator = coordinator(&trace, &notifier, false);

    // Seen by the js observer but the path belongs to css.
    let event = ChangeEvent {
        path: "site/css/main.css".into(),
        subscription: Some(1),
    };
    assert!(coordinator.handle_event(&event).await.is_empty());
    assert!(notifier.broadcasts().is_empty());
}

#[tokio::test]
async fn failures_are_reported_and_watching_continues() {
    init_tracing();
    let trace = Trace::new();
    let notifier = RecordingNotifier::failing();
    let coordinator = coordinator(&trace, &notifier, true);

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(ChangeEvent::new("site/css/main.css")).unwrap();
    tx.send(ChangeEvent::new("site/js/app.js")).unwrap();
    tx.send(ChangeEvent::new("site/css/main.css")).unwrap();
    drop(tx);

    with_timeout(coordinator.run(ChangeEvents::from_channel(rx))).await;

    assert_eq!(
        trace.entries(),
        vec!["start:css", "end:css", "start:js", "end:js", "start:css", "end:css"]
    );
    // Broadcast follows every run, failed or not.
    assert_eq!(notifier.broadcasts().len(), 3);
}

#[tokio::test]
async fn observers_report_changes_below_the_glob_base() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("site");
    write_file(&src, "css/main.css", "body {}");

    let subs = subscriptions();
    let mut events = spawn_observers(&src, &subs).unwrap();
    // Give the backend a moment to register its watches.
    tokio::time::sleep(Duration::from_millis(100)).await;

    write_file(&src, "css/main.css", "body { color: red }");

    let event = with_timeout(events.next()).await.expect("stream ended");
    assert!(event.path.ends_with("css/main.css"), "{:?}", event.path);
    assert_eq!(event.subscription, Some(0));
}
