// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader build entry point.

use crate::codegen::{CodeGenerator, GenerateError, GeneratorOptions};
use crate::evaluation::{self, SortError};
use crate::node::NodeRegistry;
use crate::record::NodeRecord;
use crate::structure::{Structure, StructureError};

/// Error while building a shader
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Records do not form a valid structure
    #[error(transparent)]
    Structure(#[from] StructureError),

    /// Nodes could not be ordered
    #[error(transparent)]
    Sort(#[from] SortError),

    /// Code generation failed
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Build generated code from node records with default options
pub fn build_shader(registry: &NodeRegistry, records: &[NodeRecord]) -> Result<String, BuildError> {
    build_shader_with(registry, records, &GeneratorOptions::default())
}

/// Build generated code from node records
pub fn build_shader_with(
    registry: &NodeRegistry,
    records: &[NodeRecord],
    options: &GeneratorOptions,
) -> Result<String, BuildError> {
    let structure = Structure::from_records(registry, records)?;
    compile(&structure, options)
}

/// Generate code for an already validated structure
pub fn compile(structure: &Structure<'_>, options: &GeneratorOptions) -> Result<String, BuildError> {
    let graph = evaluation::to_graph(structure.nodes());
    let sorted = evaluation::sort(&graph)?;
    tracing::debug!(nodes = sorted.len(), "generating shader code");

    let generator = CodeGenerator::with_options(structure.registry(), options.clone());
    Ok(generator.generate(&sorted)?)
}
