// tests/job_graph.rs

mod common;
use crate::common::builders::{RegistryBuilder, chain_graph};

use jobdag::dag::JobGraph;
use jobdag::errors::JobdagError;

fn position(order: &[String], job: &str) -> usize {
    order
        .iter()
        .position(|j| j == job)
        .unwrap_or_else(|| panic!("{job} missing from order {order:?}"))
}

#[test]
fn two_job_cycle_is_reported_with_both_jobs() {
    let err = RegistryBuilder::new()
        .job("A", &[], &["B"])
        .job("B", &[], &["A"])
        .try_graph()
        .unwrap_err();

    match err {
        JobdagError::CyclicDependency { ref cycle } => {
            let mut sorted = cycle.clone();
            sorted.sort();
            assert_eq!(sorted, vec!["A".to_string(), "B".to_string()]);
        }
        ref other => panic!("expected CyclicDependency, got {other:?}"),
    }
    let msg = err.to_string();
    assert!(msg.starts_with("cyclic job dependency: "), "{msg}");
    assert!(msg.contains("A -> B") || msg.contains("B -> A"), "{msg}");
}

#[test]
fn cycle_excludes_jobs_leading_into_it() {
    // entry -> x -> y -> z -> x
    let err = RegistryBuilder::new()
        .job("entry", &[], &["x"])
        .job("x", &[], &["y"])
        .job("y", &[], &["z"])
        .job("z", &[], &["x"])
        .try_graph()
        .unwrap_err();

    match err {
        JobdagError::CyclicDependency { cycle } => {
            assert_eq!(cycle.len(), 3, "{cycle:?}");
            assert!(!cycle.contains(&"entry".to_string()));
        }
        other => panic!("expected CyclicDependency, got {other:?}"),
    }
}

#[test]
fn topological_order_puts_dependencies_first() {
    let graph = chain_graph(&[
        ("job2", &["job0", "job1"]),
        ("job1", &[]),
        ("job0", &[]),
        ("job3", &["job2"]),
    ]);

    let order = graph.topological_order();
    assert_eq!(order.len(), 4);
    assert!(position(order, "job0") < position(order, "job2"));
    assert!(position(order, "job1") < position(order, "job2"));
    assert!(position(order, "job2") < position(order, "job3"));

    let mut roots: Vec<&str> = graph.roots().collect();
    roots.sort();
    assert_eq!(roots, vec!["job0", "job1"]);

    assert_eq!(graph.dependencies_of("job2"), ["job0".to_string(), "job1".to_string()]);
    assert_eq!(graph.dependents_of("job2"), ["job3".to_string()]);
    assert!(graph.dependents_of("job3").is_empty());
    assert!(graph.dependencies_of("unknown").is_empty());
}

#[test]
fn tasks_keep_declared_order() {
    let graph: JobGraph = RegistryBuilder::new()
        .task("zeta", "echo", &[], &[])
        .task("alpha", "echo", &[], &[])
        .task("mid", "echo", &[], &[])
        .job("job", &["zeta", "alpha", "mid"], &[])
        .graph();

    assert_eq!(
        graph.tasks_of("job"),
        ["zeta".to_string(), "alpha".to_string(), "mid".to_string()]
    );
    assert!(graph.contains("job"));
    assert!(!graph.contains("zeta"));
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.catalog().task_count(), 3);
}

#[test]
fn empty_registry_builds_empty_graph() {
    let graph = RegistryBuilder::new().graph();
    assert!(graph.is_empty());
    assert!(graph.topological_order().is_empty());
}
