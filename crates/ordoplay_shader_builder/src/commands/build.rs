// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader build command.

use super::common::{load_records, load_registry};
use crate::settings::BuilderSettings;
use anyhow::Context;
use clap::Args;
use ordoplay_shader_graph::{build_shader_with, DeclarationStyle, SubstitutionMode};
use std::path::PathBuf;

#[derive(Args)]
pub struct BuildArgs {
    /// Structure file (JSON node records)
    #[arg(short, long, value_name = "FILE")]
    structure: PathBuf,

    /// Node registry file (JSON); overrides the settings file
    #[arg(short, long, value_name = "FILE")]
    registry: Option<PathBuf>,

    /// Builder settings file (RON)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Write generated code here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Declare variables as `var name; // type`
    #[arg(long)]
    untyped: bool,

    /// Substitute port names everywhere in bodies, including comments and strings
    #[arg(long)]
    textual: bool,
}

pub fn run(args: BuildArgs) -> anyhow::Result<()> {
    let mut settings = match &args.settings {
        Some(path) => BuilderSettings::load(path)
            .with_context(|| format!("failed to load settings {}", path.display()))?,
        None => BuilderSettings::default(),
    };

    if args.registry.is_some() {
        settings.registry = args.registry;
    }
    if args.output.is_some() {
        settings.output = args.output;
    }
    if args.untyped {
        settings.generator.declarations = DeclarationStyle::Untyped;
    }
    if args.textual {
        settings.generator.substitution = SubstitutionMode::Textual;
    }

    let registry = load_registry(settings.registry.as_deref())?;
    let records = load_records(&args.structure)?;
    tracing::info!(
        nodes = records.len(),
        structure = %args.structure.display(),
        "building shader"
    );

    let code = build_shader_with(&registry, &records, &settings.generator)
        .with_context(|| format!("failed to build {}", args.structure.display()))?;

    match &settings.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &code)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = code.len(), "wrote shader");
        }
        None => print!("{code}"),
    }

    Ok(())
}
