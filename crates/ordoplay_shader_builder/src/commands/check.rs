// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structure validation command.

use super::common::{load_records, load_registry};
use anyhow::Context;
use clap::Args;
use ordoplay_shader_graph::{evaluation, Structure};
use std::path::PathBuf;

#[derive(Args)]
pub struct CheckArgs {
    /// Structure file (JSON node records)
    #[arg(short, long, value_name = "FILE")]
    structure: PathBuf,

    /// Node registry file (JSON)
    #[arg(short, long, value_name = "FILE")]
    registry: Option<PathBuf>,
}

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let registry = load_registry(args.registry.as_deref())?;
    let records = load_records(&args.structure)?;

    let structure = Structure::from_records(&registry, &records)
        .with_context(|| format!("invalid structure {}", args.structure.display()))?;
    let graph = evaluation::to_graph(structure.nodes());
    let order = evaluation::sort(&graph)?;

    println!("Evaluation order ({} nodes):", order.len());
    for (index, node) in order.iter().enumerate() {
        println!("  {:>3}  {:16}  {}", index + 1, node.id().as_str(), node.node_type());
    }

    Ok(())
}
