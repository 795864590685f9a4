// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared helpers for loading registries and structures.

use anyhow::Context;
use ordoplay_shader_graph::record::parse_records;
use ordoplay_shader_graph::stock::create_stock_registry;
use ordoplay_shader_graph::{NodeRecord, NodeRegistry};
use std::path::Path;

/// Load a registry from a JSON file, or the stock registry when no path is given
pub fn load_registry(path: Option<&Path>) -> anyhow::Result<NodeRegistry> {
    let Some(path) = path else {
        tracing::debug!("using stock node registry");
        return Ok(create_stock_registry());
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read registry {}", path.display()))?;
    let registry = NodeRegistry::from_json(&json)
        .with_context(|| format!("invalid registry {}", path.display()))?;
    tracing::debug!(types = registry.len(), path = %path.display(), "loaded node registry");
    Ok(registry)
}

/// Load node records from a structure file
pub fn load_records(path: &Path) -> anyhow::Result<Vec<NodeRecord>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read structure {}", path.display()))?;
    parse_records(&json).with_context(|| format!("invalid structure {}", path.display()))
}
