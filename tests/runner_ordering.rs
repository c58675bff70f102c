// tests/runner_ordering.rs

mod common;
use crate::common::fakes::Trace;
use crate::common::{init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use sitepipe::dag::{TaskGraph, TaskGroup};
use sitepipe::engine::{RunSettings, Runner, TaskOutcome};
use sitepipe::errors::{RegistrationError, SitepipeError};

const SHORT: Duration = Duration::from_millis(10);
const LONG: Duration = Duration::from_millis(40);

fn runner(graph: TaskGraph) -> Runner {
    Runner::new(Arc::new(graph))
}

#[tokio::test]
async fn sequential_stages_run_strictly_in_order() {
    init_tracing();
    let trace = Trace::new();
    let mut graph = TaskGraph::new();
    for name in ["a", "b", "c"] {
        graph
            .register(name, Vec::<String>::new(), Some(trace.work(name, SHORT, false)))
            .unwrap();
    }
    let runner = runner(graph);

    let group = TaskGroup::new().then("c").then("a").then("b");
    let plan = runner.graph().resolve_order(&group).unwrap();
    let report = with_timeout(runner.run(&plan, RunSettings::default())).await;

    assert!(report.succeeded());
    assert_eq!(
        trace.entries(),
        vec!["start:c", "end:c", "start:a", "end:a", "start:b", "end:b"]
    );
}

#[tokio::test]
async fn clean_completes_before_parallel_producers_start() {
    init_tracing();
    let trace = Trace::new();
    let mut graph = TaskGraph::new();
    graph
        .register("clean", Vec::<String>::new(), Some(trace.work("clean", SHORT, false)))
        .unwrap();
    graph
        .register("images", Vec::<String>::new(), Some(trace.work("images", LONG, false)))
        .unwrap();
    graph
        .register("css", Vec::<String>::new(), Some(trace.work("css", LONG, false)))
        .unwrap();
    let runner = runner(graph);

    let group = TaskGroup::new().then("clean").parallel(["images", "css"]);
    let plan = runner.graph().resolve_order(&group).unwrap();
    assert_eq!(plan.to_string(), "clean -> [images, css]");

    let report = with_timeout(runner.run(&plan, RunSettings::default())).await;
    assert!(report.succeeded());

    let end_clean = trace.index_of("end:clean");
    let start_images = trace.index_of("start:images");
    let start_css = trace.index_of("start:css");
    let first_end = trace.index_of("end:images").min(trace.index_of("end:css"));

    assert!(end_clean < start_images);
    assert!(end_clean < start_css);
    // Both producers are in flight at the same time.
    assert!(start_images < first_end);
    assert!(start_css < first_end);
}

#[tokio::test]
async fn failure_in_parallel_stage_waits_for_siblings_and_skips_later_stages() {
    init_tracing();
    let trace = Trace::new();
    let mut graph = TaskGraph::new();
    graph
        .register("images", Vec::<String>::new(), Some(trace.work("images", SHORT, true)))
        .unwrap();
    graph
        .register("css", Vec::<String>::new(), Some(trace.work("css", LONG, false)))
        .unwrap();
    graph
        .register("deploy", ["images", "css"], Some(trace.work("deploy", SHORT, false)))
        .unwrap();
    let runner = runner(graph);

    let plan = runner
        .graph()
        .resolve_order(&TaskGroup::new().parallel(["images", "css"]).then("deploy"))
        .unwrap();
    let report = with_timeout(runner.run(&plan, RunSettings::default())).await;

    assert!(!report.succeeded());
    assert_eq!(report.failure().map(|f| f.task.as_str()), Some("images"));
    assert_eq!(report.outcome_of("images"), Some(TaskOutcome::Failed));
    assert_eq!(report.outcome_of("css"), Some(TaskOutcome::Success));
    assert_eq!(report.not_started, vec!["deploy".to_string()]);
    assert!(trace.entries().contains(&"end:css".to_string()));
    assert!(!trace.entries().iter().any(|e| e.ends_with(":deploy")));

    let err = report.into_result().unwrap_err();
    match &err {
        SitepipeError::TaskFailed { task, .. } => assert_eq!(task, "images"),
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    // The cause is carried as the source, not repeated in the message.
    assert_eq!(err.to_string(), "task 'images' failed");
    let cause = std::error::Error::source(&err).expect("cause");
    assert_eq!(cause.to_string(), "images exploded");
    let report = format!("{:?}", anyhow::Error::from(err));
    assert_eq!(report.matches("images exploded").count(), 1, "{report}");
}

#[tokio::test]
async fn first_failure_is_reported_in_settle_order() {
    let trace = Trace::new();
    let mut graph = TaskGraph::new();
    graph
        .register("slow", Vec::<String>::new(), Some(trace.work("slow", LONG, true)))
        .unwrap();
    graph
        .register("fast", Vec::<String>::new(), Some(trace.work("fast", SHORT, true)))
        .unwrap();
    let runner = runner(graph);

    let plan = runner
        .graph()
        .resolve_order(&TaskGroup::new().parallel(["slow", "fast"]))
        .unwrap();
    let report = with_timeout(runner.run(&plan, RunSettings::default())).await;

    assert_eq!(report.failure().map(|f| f.task.as_str()), Some("fast"));
    assert_eq!(report.settled.len(), 2);
}

#[tokio::test]
async fn structural_task_succeeds_after_its_predecessors() {
    let trace = Trace::new();
    let mut graph = TaskGraph::new();
    graph
        .register("pages", Vec::<String>::new(), Some(trace.work("pages", SHORT, false)))
        .unwrap();
    graph.register("build", ["pages"], None).unwrap();
    let runner = runner(graph);

    let plan = runner
        .graph()
        .resolve_order(&TaskGroup::new().then("build"))
        .unwrap();
    assert_eq!(plan.to_string(), "pages -> build");

    let report = runner.run(&plan, RunSettings::default()).await;
    assert!(report.succeeded());
    assert_eq!(report.outcome_of("build"), Some(TaskOutcome::Success));
}

#[tokio::test]
async fn run_task_does_not_rerun_predecessors() {
    let trace = Trace::new();
    let mut graph = TaskGraph::new();
    graph
        .register("lint", Vec::<String>::new(), Some(trace.work("lint", SHORT, false)))
        .unwrap();
    graph
        .register("js", ["lint"], Some(trace.work("js", SHORT, false)))
        .unwrap();
    let runner = runner(graph);

    runner.run_task("js", RunSettings::default()).await.unwrap();
    assert_eq!(trace.entries(), vec!["start:js", "end:js"]);

    let err = runner
        .run_task("nope", RunSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SitepipeError::Registration(RegistrationError::UnknownTask(ref name)) if name == "nope"
    ));
}

#[test]
fn registration_rejects_duplicates_and_forward_references() {
    let mut graph = TaskGraph::new();
    graph.register("a", Vec::<String>::new(), None).unwrap();

    assert_eq!(
        graph.register("a", Vec::<String>::new(), None),
        Err(RegistrationError::DuplicateTask("a".into()))
    );
    assert_eq!(
        graph.register("b", ["later"], None),
        Err(RegistrationError::UnknownPredecessor {
            task: "b".into(),
            predecessor: "later".into(),
        })
    );
    assert_eq!(
        graph.register("c", ["c"], None),
        Err(RegistrationError::CyclicDependency(vec!["c".into(), "c".into()]))
    );
}
