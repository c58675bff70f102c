// tests/cycle_detection.rs

use std::collections::{HashMap, HashSet, VecDeque};

use proptest::prelude::*;
use sitepipe::dag::{TaskGraph, TaskGroup};
use sitepipe::errors::RegistrationError;

fn name(i: usize) -> String {
    format!("task_{i}")
}

/// Reference check: Kahn's algorithm over predecessor edges plus the
/// ordering edges between consecutive group elements.
fn has_cycle(preds: &[Vec<usize>], group: &[usize]) -> bool {
    let mut nodes: HashSet<usize> = HashSet::new();
    let mut stack: Vec<usize> = group.to_vec();
    while let Some(n) = stack.pop() {
        if nodes.insert(n) {
            stack.extend(preds[n].iter().copied());
        }
    }

    let mut edges: HashSet<(usize, usize)> = HashSet::new();
    for &n in &nodes {
        for &p in &preds[n] {
            edges.insert((p, n));
        }
    }
    for pair in group.windows(2) {
        edges.insert((pair[0], pair[1]));
    }

    let mut indegree: HashMap<usize, usize> = nodes.iter().map(|&n| (n, 0)).collect();
    for &(_, to) in &edges {
        *indegree.get_mut(&to).unwrap() += 1;
    }
    let mut ready: VecDeque<usize> = indegree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(n, _)| *n)
        .collect();
    let mut visited = 0;
    while let Some(n) = ready.pop_front() {
        visited += 1;
        for &(from, to) in &edges {
            if from == n {
                let d = indegree.get_mut(&to).unwrap();
                *d -= 1;
                if *d == 0 {
                    ready.push_back(to);
                }
            }
        }
    }
    visited != nodes.len()
}

/// Task `i` may only name tasks `0..i` as predecessors, so registration
/// always succeeds; cycles can only come from the group order.
fn graph_strategy(max_tasks: usize) -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<usize>)> {
    (1..=max_tasks).prop_flat_map(|n| {
        let preds = proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..3), n)
            .prop_map(|raw| {
                raw.into_iter()
                    .enumerate()
                    .map(|(i, ps)| {
                        let mut ps: Vec<usize> = if i == 0 {
                            Vec::new()
                        } else {
                            ps.into_iter().map(|p| p % i).collect()
                        };
                        ps.sort_unstable();
                        ps.dedup();
                        ps
                    })
                    .collect::<Vec<_>>()
            });
        let group = proptest::collection::vec(0..n, 1..5);
        (preds, group)
    })
}

proptest! {
    #[test]
    fn resolve_fails_iff_constraints_are_cyclic((preds, group) in graph_strategy(6)) {
        let mut graph = TaskGraph::new();
        for (i, ps) in preds.iter().enumerate() {
            graph.register(name(i), ps.iter().map(|p| name(*p)), None).unwrap();
        }

        let mut task_group = TaskGroup::new();
        for &i in &group {
            task_group = task_group.then(name(i));
        }

        let expected_cycle = has_cycle(&preds, &group);
        match graph.resolve_order(&task_group) {
            Ok(plan) => {
                prop_assert!(!expected_cycle);

                let stage_of: HashMap<&str, usize> = plan
                    .stages()
                    .iter()
                    .enumerate()
                    .flat_map(|(s, names)| names.iter().map(move |n| (n.as_str(), s)))
                    .collect();
                for &i in &group {
                    for p in &preds[i] {
                        prop_assert!(stage_of[name(*p).as_str()] < stage_of[name(i).as_str()]);
                    }
                }
                for pair in group.windows(2) {
                    prop_assert!(stage_of[name(pair[0]).as_str()] < stage_of[name(pair[1]).as_str()]);
                }
            }
            Err(RegistrationError::CyclicDependency(cycle)) => {
                prop_assert!(expected_cycle);
                prop_assert!(!cycle.is_empty());
                if cycle.len() > 1 {
                    prop_assert_eq!(cycle.first(), cycle.last());
                }
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}

#[test]
fn cycle_is_spelled_out() {
    let mut graph = TaskGraph::new();
    graph.register("a", Vec::<String>::new(), None).unwrap();
    graph.register("b", ["a"], None).unwrap();

    let err = graph
        .resolve_order(&TaskGroup::new().then("b").then("a"))
        .unwrap_err();
    assert_eq!(err.to_string(), "cyclic dependency: a -> b -> a");
}
