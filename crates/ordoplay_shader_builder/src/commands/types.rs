// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node type listing command.

use super::common::load_registry;
use clap::Args;
use ordoplay_shader_graph::PortSpec;
use std::path::PathBuf;

#[derive(Args)]
pub struct TypesArgs {
    /// Node registry file (JSON)
    #[arg(short, long, value_name = "FILE")]
    registry: Option<PathBuf>,

    /// Print the registry as JSON instead of a table
    #[arg(long)]
    json: bool,
}

pub fn run(args: TypesArgs) -> anyhow::Result<()> {
    let registry = load_registry(args.registry.as_deref())?;

    if args.json {
        println!("{}", registry.to_json()?);
        return Ok(());
    }

    println!("Node types ({}):", registry.len());
    println!();
    for definition in registry.types() {
        println!(
            "  {:16}  ({}) -> ({})",
            definition.id,
            ports(&definition.inputs),
            ports(&definition.outputs)
        );
        if !definition.description.is_empty() {
            println!("  {:16}  {}", "", definition.description);
        }
    }

    Ok(())
}

fn ports(ports: &[PortSpec]) -> String {
    ports
        .iter()
        .map(|port| format!("{}: {}", port.name, port.data_type))
        .collect::<Vec<_>>()
        .join(", ")
}
