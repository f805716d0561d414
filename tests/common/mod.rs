//! Shared test components and fixtures.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use lazyflow::{Assembly, Component, Ports, RunConfig, VarType, VariableDecl, WorkflowOrdering};

pub fn declared() -> RunConfig {
    RunConfig {
        ordering: WorkflowOrdering::Declared,
    }
}

pub fn assembly(name: &str) -> Assembly {
    Assembly::with_config(name, declared())
}

pub fn f64_at(asm: &Assembly, path: &str) -> f64 {
    asm
        .get(path)
        .unwrap()
        .as_f64()
        .unwrap_or_else(|| panic!("{path} is not numeric"))
}

pub fn str_at(asm: &Assembly, path: &str) -> String {
    asm.get(path).unwrap().as_str().unwrap().to_string()
}

/// `rval_out = rval_in * mult`
pub struct Multiplier;

impl Component for Multiplier {
    fn declare(&self) -> Vec<VariableDecl> {
        vec![
            VariableDecl::input("rval_in", VarType::Float).default_value(4.0),
            VariableDecl::input("mult", VarType::Float).default_value(1.5),
            VariableDecl::output("rval_out", VarType::Float).default_value(7.0),
        ]
    }

    fn execute(&mut self, ports: &mut Ports<'_>) -> anyhow::Result<()> {
        let out = ports.get_f64("rval_in")? * ports.get_f64("mult")?;
        ports.set("rval_out", out)
    }
}

/// `c = a + b`, `d = a - b`
pub struct Simple;

impl Component for Simple {
    fn declare(&self) -> Vec<VariableDecl> {
        vec![
            VariableDecl::input("a", VarType::Float).default_value(4.0),
            VariableDecl::input("b", VarType::Float).default_value(5.0),
            VariableDecl::output("c", VarType::Float).default_value(7.0),
            VariableDecl::output("d", VarType::Float).default_value(1.5),
        ]
    }

    fn execute(&mut self, ports: &mut Ports<'_>) -> anyhow::Result<()> {
        let (a, b) = (ports.get_f64("a")?, ports.get_f64("b")?);
        ports.set("c", a + b)?;
        ports.set("d", a - b)
    }
}

/// A component with float, string, list and container ports.
pub struct DummyComp;

impl Component for DummyComp {
    fn declare(&self) -> Vec<VariableDecl> {
        vec![
            VariableDecl::input("r", VarType::Float).default_value(1.0),
            VariableDecl::input("r2", VarType::Float).default_value(-1.0),
            VariableDecl::input("r3", VarType::Float)
                .desc("some random variable")
                .low(-1.0)
                .high(1.0)
                .meta("other_meta_data", "test"),
            VariableDecl::input("s", VarType::Str).default_value("a string"),
            VariableDecl::input("dummy_in", VarType::Object),
            VariableDecl::output("rout", VarType::Float).units("ft"),
            VariableDecl::output("r2out", VarType::Float),
            VariableDecl::output("sout", VarType::Str),
            VariableDecl::output("slistout", VarType::List),
            VariableDecl::output("dummy_out", VarType::Object),
        ]
    }

    fn execute(&mut self, ports: &mut Ports<'_>) -> anyhow::Result<()> {
        ports.set("rout", ports.get_f64("r")? * 1.5)?;
        ports.set("r2out", ports.get_f64("r2")? + 10.0)?;
        let s = ports.get_str("s")?.to_string();
        ports.set("sout", s.chars().rev().collect::<String>())?;
        let words: Vec<String> = s.split_whitespace().map(str::to_string).collect();
        ports.set("slistout", words)?;
        let r = ports.get_f64("r")?;
        ports.set("dummy_out", serde_json::json!({ "rval_in": r, "rval_out": r * 1.5 }))
    }
}

/// `z = x * y`
pub struct Comp;

impl Component for Comp {
    fn declare(&self) -> Vec<VariableDecl> {
        vec![
            VariableDecl::input("x", VarType::Float),
            VariableDecl::input("y", VarType::Float),
            VariableDecl::output("z", VarType::Float),
        ]
    }

    fn execute(&mut self, ports: &mut Ports<'_>) -> anyhow::Result<()> {
        let z = ports.get_f64("x")? * ports.get_f64("y")?;
        ports.set("z", z)
    }
}

/// Copies `i` to `o`, failing while the shared flag is set.
pub struct Flaky {
    pub fail: Rc<Cell<bool>>,
}

impl Component for Flaky {
    fn declare(&self) -> Vec<VariableDecl> {
        vec![
            VariableDecl::input("i", VarType::Float),
            VariableDecl::output("o", VarType::Float),
        ]
    }

    fn execute(&mut self, ports: &mut Ports<'_>) -> anyhow::Result<()> {
        if self.fail.get() {
            anyhow::bail!("solver diverged");
        }
        let i = ports.get_f64("i")?;
        ports.set("o", i)
    }
}

/// ```text
/// top
///     comp1
///     nested
///         comp1
///     comp2
///     comp3
/// ```
pub fn dummy_tree() -> Assembly {
    let mut top = assembly("top");
    top.add("comp1", DummyComp).unwrap();
    let mut nested = assembly("nested");
    nested.add("comp1", DummyComp).unwrap();
    nested.workflow_add("comp1").unwrap();
    top.add_assembly("nested", nested).unwrap();
    top.add("comp2", DummyComp).unwrap();
    top.add("comp3", DummyComp).unwrap();
    top
        .workflow_add_all(&["comp1", "nested", "comp2", "comp3"])
        .unwrap();
    top
}
