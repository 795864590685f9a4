// SPDX-License-Identifier: MIT OR Apache-2.0
//! Builder settings
//!
//! Stored as RON, e.g.
//!
//! ```ron
//! BuilderSettings(
//!     version: 1,
//!     registry: Some("nodes.json"),
//!     output: Some("out/material.glsl"),
//!     generator: (
//!         indent: "    ",
//!         declarations: typed,
//!         substitution: tokenized,
//!     ),
//! )
//! ```

use ordoplay_shader_graph::GeneratorOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings for `ordoplay-shaderc build`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderSettings {
    /// Settings format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Node registry file; the stock registry when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<PathBuf>,
    /// Output file; stdout when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Code generator options
    #[serde(default)]
    pub generator: GeneratorOptions,
}

fn default_version() -> u32 {
    SETTINGS_FORMAT_VERSION
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            registry: None,
            output: None,
            generator: GeneratorOptions::default(),
        }
    }
}

impl BuilderSettings {
    /// Parse settings from RON
    pub fn from_ron(content: &str) -> std::io::Result<Self> {
        let settings: BuilderSettings = ron::from_str(content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Settings version {} is newer than supported version {}",
                    settings.version, SETTINGS_FORMAT_VERSION
                ),
            ));
        }

        Ok(settings)
    }

    /// Load settings from a file.
    ///
    /// Relative paths inside the file are resolved against its directory.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut settings = Self::from_ron(&content)?;
        if let Some(base) = path.parent() {
            settings.resolve_paths(base);
        }
        Ok(settings)
    }

    /// Save settings to a file
    #[allow(dead_code)] // Used by tests and for writing starter settings
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

        std::fs::write(path, content)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.registry, &mut self.output].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
