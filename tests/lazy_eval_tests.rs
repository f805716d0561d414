//! Integration tests for validity tracking and lazy execution.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{assembly, dummy_tree, f64_at, Flaky, Multiplier};
use lazyflow::{
    Assembly, Component, GraphError, Ports, RunConfig, RunState, VarType, VariableDecl,
    WorkflowOrdering,
};

/// `o = i * 2`
struct Doubler;

impl Component for Doubler {
    fn declare(&self) -> Vec<VariableDecl> {
        vec![
            VariableDecl::input("i", VarType::Float),
            VariableDecl::output("o", VarType::Float),
        ]
    }

    fn execute(&mut self, ports: &mut Ports<'_>) -> anyhow::Result<()> {
        let i = ports.get_f64("i")?;
        ports.set("o", i * 2.0)
    }
}

/// `k = j + 1`
struct Incr;

impl Component for Incr {
    fn declare(&self) -> Vec<VariableDecl> {
        vec![
            VariableDecl::input("j", VarType::Float),
            VariableDecl::output("k", VarType::Float),
        ]
    }

    fn execute(&mut self, ports: &mut Ports<'_>) -> anyhow::Result<()> {
        let j = ports.get_f64("j")?;
        ports.set("k", j + 1.0)
    }
}

/// `m1.rval_out -> m2.rval_in`
fn chain(config: RunConfig, workflow: &[&str]) -> Assembly {
    let mut top = Assembly::with_config("top", config);
    top.add("m1", Multiplier).unwrap();
    top.add("m2", Multiplier).unwrap();
    top.workflow_add_all(workflow).unwrap();
    top.connect("m1.rval_out", "m2.rval_in").unwrap();
    top
}

#[test]
fn pipeline_runs_once_then_settles() {
    let mut top = assembly("top");
    top.add("a", Doubler).unwrap();
    top.add("b", Incr).unwrap();
    top.workflow_add_all(&["a", "b"]).unwrap();
    top.connect("a.o", "b.j").unwrap();

    top.set("a.i", 3).unwrap();
    top.run().unwrap();
    assert_eq!(f64_at(&top, "b.k"), 7.0);
    assert_eq!(top.exec_count("a").unwrap(), 1);
    assert_eq!(top.exec_count("b").unwrap(), 1);

    let report = top.run().unwrap();
    assert!(report.executed.is_empty());
    assert_eq!(report.skipped, vec!["a", "b"]);
    assert_eq!(top.exec_count("a").unwrap(), 1);
    assert_eq!(top.exec_count("b").unwrap(), 1);

    // an equal value still counts as a change
    top.set("a.i", 3).unwrap();
    top.run().unwrap();
    assert_eq!(top.exec_count("a").unwrap(), 2);
    assert_eq!(top.exec_count("b").unwrap(), 2);
    assert_eq!(f64_at(&top, "b.k"), 7.0);
}

#[test]
fn only_stale_members_execute() {
    let mut top = chain(common::declared(), &["m1", "m2"]);
    top.run().unwrap();
    assert_eq!(top.exec_count("m1").unwrap(), 1);
    assert_eq!(top.exec_count("m2").unwrap(), 1);
    assert_eq!(f64_at(&top, "m2.rval_out"), 9.0);

    top.set("m2.mult", 2.0).unwrap();
    let report = top.run().unwrap();
    assert_eq!(report.executed, vec!["m2"]);
    assert!(!report.was_executed("m1"));
    assert_eq!(top.exec_count("m1").unwrap(), 1);
    assert_eq!(top.exec_count("m2").unwrap(), 2);
    assert_eq!(f64_at(&top, "m2.rval_out"), 12.0);

    top.set("m1.rval_in", 2.0).unwrap();
    top.run().unwrap();
    assert_eq!(top.exec_count("m1").unwrap(), 2);
    assert_eq!(top.exec_count("m2").unwrap(), 3);
    assert_eq!(f64_at(&top, "m2.rval_out"), 6.0);
}

#[test]
fn set_invalidates_downstream_only() {
    let mut top = chain(common::declared(), &["m1", "m2"]);
    top.run().unwrap();
    assert_eq!(
        top.get_valid(&["m1.rval_in", "m1.rval_out", "m2.rval_in", "m2.rval_out"])
            .unwrap(),
        vec![true, true, true, true]
    );

    top.set("m1.mult", 3.0).unwrap();
    assert_eq!(
        top.get_valid(&["m1.rval_in", "m1.mult", "m1.rval_out", "m2.rval_in", "m2.mult", "m2.rval_out"])
            .unwrap(),
        vec![true, true, false, false, true, false]
    );
    assert_eq!(top.run_state("m1").unwrap(), RunState::Pending);
}

#[test]
fn connecting_invalidates_the_destination() {
    let mut top = assembly("top");
    top.add("m1", Multiplier).unwrap();
    top.add("m2", Multiplier).unwrap();
    top.workflow_add_all(&["m1", "m2"]).unwrap();
    top.run().unwrap();
    assert_eq!(top.get_valid(&["m2.rval_in"]).unwrap(), vec![true]);

    top.connect("m1.rval_out", "m2.rval_in").unwrap();
    assert_eq!(top.get_valid(&["m2.rval_in", "m2.rval_out"]).unwrap(), vec![false, false]);
    assert_eq!(top.get_valid(&["m1.rval_out"]).unwrap(), vec![true]);

    let report = top.run().unwrap();
    assert_eq!(report.executed, vec!["m2"]);
    assert_eq!(f64_at(&top, "m2.rval_in"), 6.0);
}

#[test]
fn declared_order_takes_two_cycles_when_reversed() {
    let mut top = chain(common::declared(), &["m2", "m1"]);
    assert_eq!(top.execution_order(), vec!["m2", "m1"]);

    top.run().unwrap();
    // m2 consumed m1's output before m1 had produced it
    assert_eq!(f64_at(&top, "m2.rval_in"), 7.0);
    assert_eq!(top.get_valid(&["m2.rval_in"]).unwrap(), vec![false]);

    top.run().unwrap();
    assert_eq!(f64_at(&top, "m2.rval_in"), 6.0);
    assert_eq!(f64_at(&top, "m2.rval_out"), 9.0);
    assert_eq!(top.exec_count("m1").unwrap(), 1);
    assert_eq!(top.exec_count("m2").unwrap(), 2);
}

#[test]
fn topological_order_settles_in_one_cycle() {
    let config = RunConfig {
        ordering: WorkflowOrdering::Topological,
    };
    let mut top = chain(config, &["m2", "m1"]);
    assert_eq!(top.workflow_names(), ["m2", "m1"]);
    assert_eq!(top.execution_order(), vec!["m1", "m2"]);

    let report = top.run().unwrap();
    assert_eq!(report.executed, vec!["m1", "m2"]);
    assert_eq!(f64_at(&top, "m2.rval_out"), 9.0);
    assert_eq!(top.exec_count("m2").unwrap(), 1);
}

#[test]
fn members_outside_the_workflow_never_execute() {
    let mut top = chain(common::declared(), &["m1"]);
    top.run().unwrap();
    assert_eq!(top.exec_count("m1").unwrap(), 1);
    assert_eq!(top.exec_count("m2").unwrap(), 0);
    assert_eq!(top.run_state("m2").unwrap(), RunState::Pending);

    top.workflow_add("m2").unwrap();
    top.workflow_add("m1").unwrap();
    assert_eq!(top.workflow_names(), ["m1", "m2"]);
    top.run().unwrap();
    assert_eq!(top.exec_count("m2").unwrap(), 1);

    top.workflow_remove("m1");
    top.set("m1.rval_in", 1.0).unwrap();
    top.run().unwrap();
    assert_eq!(top.exec_count("m1").unwrap(), 1);

    assert!(matches!(top.workflow_add("nope"), Err(GraphError::NotFound(_))));
}

#[test]
fn invalidation_crosses_assembly_boundaries() {
    let mut top = dummy_tree();
    top.connect("comp1.rout", "nested.comp1.r").unwrap();
    top.connect("nested.comp1.rout", "comp2.r").unwrap();
    top.run().unwrap();
    let paths = [
        "comp1.r",
        "comp1.rout",
        "nested.comp1.r",
        "nested.comp1.rout",
        "comp2.r",
        "comp3.r",
    ];
    assert_eq!(top.get_valid(&paths).unwrap(), vec![true; 6]);

    top.set("comp1.r", 2.0).unwrap();
    assert_eq!(
        top.get_valid(&paths).unwrap(),
        vec![true, false, false, false, false, true]
    );

    let report = top.run().unwrap();
    assert_eq!(report.executed, vec!["comp1", "nested.comp1", "nested", "comp2"]);
    assert_eq!(report.skipped, vec!["comp3"]);
    assert_eq!(f64_at(&top, "comp2.r"), 2.0 * 1.5 * 1.5);
    assert_eq!(top.exec_count("nested").unwrap(), 2);
    assert_eq!(top.exec_count("nested.comp1").unwrap(), 2);
}

#[test]
fn nested_set_reruns_only_the_nested_branch() {
    let mut top = dummy_tree();
    top.run().unwrap();

    top.set("nested.comp1.r", 4.0).unwrap();
    let report = top.run().unwrap();
    assert_eq!(report.executed, vec!["nested.comp1", "nested"]);
    assert_eq!(report.skipped, vec!["comp1", "comp2", "comp3"]);
    assert_eq!(f64_at(&top, "nested.comp1.rout"), 6.0);
    assert_eq!(top.run_state("nested").unwrap(), RunState::Done);
}

#[test]
fn output_passthrough_is_refreshed_by_run() {
    let mut top = assembly("top");
    let mut stage = assembly("stage");
    stage.add("a", Doubler).unwrap();
    stage.add("b", Incr).unwrap();
    stage.workflow_add_all(&["a", "b"]).unwrap();
    stage.connect("a.o", "b.j").unwrap();
    stage.create_passthrough("a.i", Some("x")).unwrap();
    stage.create_passthrough("b.k", Some("y")).unwrap();
    top.add_assembly("stage", stage).unwrap();
    top.workflow_add("stage").unwrap();

    top.set("stage.x", 3.0).unwrap();
    assert_eq!(top.get_valid(&["stage.y"]).unwrap(), vec![false]);
    top.run().unwrap();
    assert_eq!(f64_at(&top, "stage.y"), 7.0);
    assert_eq!(top.get_valid(&["stage.x", "stage.y"]).unwrap(), vec![true, true]);

    top.set("stage.x", 5.0).unwrap();
    assert_eq!(top.get_valid(&["stage.y"]).unwrap(), vec![false]);
    top.run().unwrap();
    assert_eq!(f64_at(&top, "stage.y"), 11.0);
    assert_eq!(top.exec_count("stage.a").unwrap(), 2);
}

#[test]
fn failed_member_is_retried_on_next_run() {
    let fail = Rc::new(Cell::new(true));
    let mut top = assembly("top");
    top.add("solver", Flaky { fail: fail.clone() }).unwrap();
    top.add("post", Multiplier).unwrap();
    top.workflow_add_all(&["solver", "post"]).unwrap();
    top.connect("solver.o", "post.rval_in").unwrap();
    top.set("solver.i", 2.0).unwrap();

    let err = top.run().unwrap_err();
    match &err {
        GraphError::Execution { component, .. } => assert_eq!(component, "solver"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "component 'solver' failed to execute: solver diverged");
    assert_eq!(top.run_state("solver").unwrap(), RunState::Running);
    assert_eq!(top.exec_count("solver").unwrap(), 0);
    assert_eq!(top.exec_count("post").unwrap(), 0);

    fail.set(false);
    let report = top.run().unwrap();
    assert_eq!(report.executed, vec!["solver", "post"]);
    assert_eq!(top.exec_count("solver").unwrap(), 1);
    assert_eq!(top.run_state("solver").unwrap(), RunState::Done);
    assert_eq!(f64_at(&top, "post.rval_out"), 3.0);
}

#[test]
fn failure_inside_nested_assembly_reports_full_path() {
    let fail = Rc::new(Cell::new(true));
    let mut inner = assembly("inner");
    inner.add("solver", Flaky { fail: fail.clone() }).unwrap();
    inner.workflow_add("solver").unwrap();
    let mut top = assembly("top");
    top.add_assembly("inner", inner).unwrap();
    top.workflow_add("inner").unwrap();

    match top.run() {
        Err(GraphError::Execution { component, source }) => {
            assert_eq!(component, "inner.solver");
            assert_eq!(source.to_string(), "solver diverged");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    fail.set(false);
    top.run().unwrap();
    assert_eq!(top.exec_count("inner.solver").unwrap(), 1);
    assert_eq!(top.exec_count("inner").unwrap(), 1);
}

#[test]
fn run_report_serializes() {
    let mut top = chain(common::declared(), &["m1", "m2"]);
    let report = top.run().unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["executed"], serde_json::json!(["m1", "m2"]));
    assert_eq!(json["skipped"], serde_json::json!([]));
    assert!(json["started_at"].is_string());
}

/// `o = 1 / i`
struct Reciprocal;

impl Component for Reciprocal {
    fn declare(&self) -> Vec<VariableDecl> {
        vec![
            VariableDecl::input("i", VarType::Float),
            VariableDecl::output("o", VarType::Float),
        ]
    }

    fn execute(&mut self, ports: &mut Ports<'_>) -> anyhow::Result<()> {
        let i = ports.get_f64("i")?;
        ports.set("o", 1.0 / i)
    }
}

/// Emits its `label` input on an untyped output.
struct Emitter;

impl Component for Emitter {
    fn declare(&self) -> Vec<VariableDecl> {
        vec![
            VariableDecl::input("label", VarType::Str).default_value("text"),
            VariableDecl::output("v", VarType::Any),
        ]
    }

    fn execute(&mut self, ports: &mut Ports<'_>) -> anyhow::Result<()> {
        let label = ports.get_str("label")?.to_string();
        ports.set("v", label)
    }
}

#[test]
fn non_finite_results_fail_with_a_clear_error() {
    let mut top = assembly("top");
    top.add("n", Reciprocal).unwrap();
    top.workflow_add("n").unwrap();

    let err = top.run().unwrap_err();
    assert_eq!(
        err.to_string(),
        "component 'n' failed to execute: 'n.o' expects a finite Float value, got null \
         (NaN and infinities are not representable)"
    );
    assert_eq!(top.run_state("n").unwrap(), RunState::Running);

    assert!(matches!(
        top.set("n.i", f64::NAN),
        Err(GraphError::NonFinite { .. })
    ));
    top.set("n.i", 4.0).unwrap();
    top.run().unwrap();
    assert_eq!(f64_at(&top, "n.o"), 0.25);
}

#[test]
fn step_executes_one_member_at_a_time() {
    let mut top = chain(common::declared(), &["m1", "m2"]);

    assert_eq!(top.step().unwrap().as_deref(), Some("m1"));
    assert_eq!(top.exec_count("m1").unwrap(), 1);
    assert_eq!(top.exec_count("m2").unwrap(), 0);
    assert_eq!(top.run_state("").unwrap(), RunState::Running);

    assert_eq!(top.step().unwrap().as_deref(), Some("m2"));
    assert_eq!(f64_at(&top, "m2.rval_out"), 9.0);
    assert_eq!(top.step().unwrap(), None);
    assert_eq!(top.run_state("").unwrap(), RunState::Done);
    assert_eq!(top.exec_count("").unwrap(), 1);

    // nothing changed: the next cycle completes without executing anything
    assert_eq!(top.step().unwrap(), None);

    top.set("m2.mult", 2.0).unwrap();
    assert_eq!(top.step().unwrap().as_deref(), Some("m2"));
    assert_eq!(top.step().unwrap(), None);
    assert_eq!(top.exec_count("m1").unwrap(), 1);
    assert_eq!(top.exec_count("m2").unwrap(), 2);
}

#[test]
fn step_retries_a_failed_member() {
    let fail = Rc::new(Cell::new(true));
    let mut top = assembly("top");
    top.add("solver", Flaky { fail: fail.clone() }).unwrap();
    top.add("post", Multiplier).unwrap();
    top.workflow_add_all(&["solver", "post"]).unwrap();
    top.connect("solver.o", "post.rval_in").unwrap();

    assert!(top.step().is_err());
    fail.set(false);
    assert_eq!(top.step().unwrap().as_deref(), Some("solver"));
    assert_eq!(top.step().unwrap().as_deref(), Some("post"));
    assert_eq!(top.step().unwrap(), None);
}

#[test]
fn inputs_pulled_from_valid_sources_are_valid() {
    let fail = Rc::new(Cell::new(false));
    let mut top = assembly("top");
    top.add("m", Multiplier).unwrap();
    top.add("solver", Flaky { fail: fail.clone() }).unwrap();
    top.workflow_add_all(&["m", "solver"]).unwrap();
    top.connect("m.rval_out", "solver.i").unwrap();
    top.run().unwrap();

    fail.set(true);
    top.set("m.mult", 2.0).unwrap();
    assert!(top.run().is_err());
    // the failed solver still received a fresh input
    assert_eq!(top.get_valid(&["solver.i", "solver.o"]).unwrap(), vec![true, false]);
    assert_eq!(f64_at(&top, "solver.i"), 8.0);
}

#[test]
fn transfer_errors_name_the_destination_relative_to_the_run() {
    let mut stage = assembly("stage");
    stage.add("emit", Emitter).unwrap();
    stage.add("d", Doubler).unwrap();
    stage.workflow_add_all(&["emit", "d"]).unwrap();
    stage.connect("emit.v", "d.i").unwrap();
    let mut top = assembly("top");
    top.add_assembly("stage", stage).unwrap();
    top.workflow_add("stage").unwrap();

    match top.run() {
        Err(GraphError::TypeMismatch { path, .. }) => assert_eq!(path, "stage.d.i"),
        other => panic!("unexpected result: {other:?}"),
    }
}
