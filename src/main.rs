//! lazyflow demo CLI
//!
//! Builds a two-stage pipeline wrapped in a nested assembly, runs it, changes
//! one input and runs it again, printing which components actually executed.
//!
//! Usage: `lazyflow [input]` (default input: 3)

use anyhow::{Context, Result};
use lazyflow::{Assembly, Component, Config, Ports, VarType, VariableDecl};

/// `o = i * 2`
struct Doubler;

impl Component for Doubler {
    fn declare(&self) -> Vec<VariableDecl> {
        vec![
            VariableDecl::input("i", VarType::Float).desc("value to double"),
            VariableDecl::output("o", VarType::Float),
        ]
    }

    fn execute(&mut self, ports: &mut Ports<'_>) -> Result<()> {
        let i = ports.get_f64("i")?;
        ports.set("o", i * 2.0)
    }
}

/// `k = j + offset`
struct Offset;

impl Component for Offset {
    fn declare(&self) -> Vec<VariableDecl> {
        vec![
            VariableDecl::input("j", VarType::Float),
            VariableDecl::input("offset", VarType::Float).default_value(1.0),
            VariableDecl::output("k", VarType::Float),
        ]
    }

    fn execute(&mut self, ports: &mut Ports<'_>) -> Result<()> {
        let k = ports.get_f64("j")? + ports.get_f64("offset")?;
        ports.set("k", k)
    }
}

fn build(config: &Config) -> Result<Assembly> {
    let mut stage = Assembly::with_config("stage", config.run.clone());
    stage.add("a", Doubler)?;
    stage.add("b", Offset)?;
    stage.workflow_add_all(&["a", "b"])?;
    stage.connect("a.o", "b.j")?;
    stage.create_passthrough("a.i", Some("x"))?;
    stage.create_passthrough("b.k", Some("y"))?;

    let mut top = Assembly::with_config("top", config.run.clone());
    top.add_assembly("stage", stage)?;
    top.workflow_add("stage")?;
    Ok(top)
}

fn main() -> Result<()> {
    let config = Config::default();
    tracing_subscriber::fmt()
        .with_max_level(config.logging.max_level())
        .init();

    let input: f64 = match std::env::args().nth(1) {
        Some(raw) => raw.parse().with_context(|| format!("Invalid input value: {}", raw))?,
        None => 3.0,
    };

    let mut top = build(&config)?;
    top.set("stage.x", input)?;
    let first = top.run()?;
    println!("stage.y = {}", top.get("stage.y")?);
    println!("{}", serde_json::to_string_pretty(&first)?);

    // only b depends on its offset
    top.set("stage.b.offset", 10.0)?;
    let second = top.run()?;
    println!("stage.y = {}", top.get("stage.y")?);
    println!("{}", serde_json::to_string_pretty(&second)?);
    println!("connections in stage: {:?}", top.assembly("stage")?.list_connections());
    Ok(())
}
