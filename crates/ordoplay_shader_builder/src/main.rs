// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` shader compiler
//!
//! Builds generated shader code from a saved node structure:
//! - `build` validates the structure and writes the generated code
//! - `check` validates and prints the evaluation order
//! - `types` lists the node types of a registry
//!
//! Logs go to stderr so generated code can be piped from stdout.

mod commands;
mod settings;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "ordoplay-shaderc")]
#[command(author, version, about = "OrdoPlay shader graph compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shader code from a structure file
    Build(commands::build::BuildArgs),

    /// Validate a structure file and print its evaluation order
    Check(commands::check::CheckArgs),

    /// List registered node types
    Types(commands::types::TypesArgs),
}

fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("ordoplay_shader_builder=info".parse()?)
        .add_directive("ordoplay_shader_graph=warn".parse()?);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => commands::build::run(args),
        Commands::Check(args) => commands::check::run(args),
        Commands::Types(args) => commands::types::run(args),
    }
}
