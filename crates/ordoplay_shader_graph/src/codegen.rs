// SPDX-License-Identifier: MIT OR Apache-2.0
//! Code generation from sorted nodes.
//!
//! Each node becomes one block:
//!
//! ```text
//! // node B, double
//! float inp_B_x;
//! {
//!     float y;
//!     y = inp_B_x * 2.0;
//!     inp_C_a = y;
//! }
//! ```
//!
//! Inputs are declared ahead of the block as `inp_<node>_<input>`. Outputs
//! are locals of the block, so two nodes may use the same output name; values
//! only cross blocks by assignment to the consumer's `inp_` variable.
//!
//! A producer block assigns `inp_` variables declared ahead of later blocks,
//! so with [`DeclarationStyle::Typed`] the target must hoist declarations.

use crate::node::{FunctionNode, Node, NodeId, NodeRegistry, SourceNode};
use crate::port::PortType;
use crate::template::{self, SubstitutionMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Output name used by a source node with no connections
pub const SOURCE_OUTPUT: &str = "value";

/// How variables are declared in generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationStyle {
    /// `float y;`
    #[default]
    Typed,
    /// `var y; // float`
    Untyped,
}

/// Code generator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Indentation inside node blocks
    pub indent: String,
    /// Declaration syntax
    pub declarations: DeclarationStyle,
    /// Identifier substitution in body templates
    pub substitution: SubstitutionMode,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            indent: "\t".to_string(),
            declarations: DeclarationStyle::default(),
            substitution: SubstitutionMode::default(),
        }
    }
}

/// Error during code generation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// Node references an unregistered type
    #[error("node {node} has unregistered type \"{node_type}\"")]
    UnknownNodeType {
        /// Node ID
        node: NodeId,
        /// Missing type
        node_type: String,
    },

    /// Connection names an output the type does not declare
    #[error("node {node} has no output named \"{output}\"")]
    UnknownOutput {
        /// Node ID
        node: NodeId,
        /// Output name
        output: String,
    },
}

/// Variable carrying a value into `input` of `node`
pub fn input_var(node: &str, input: &str) -> String {
    format!("inp_{node}_{input}")
}

/// Emits code for nodes in evaluation order
#[derive(Debug, Clone)]
pub struct CodeGenerator<'r> {
    registry: &'r NodeRegistry,
    options: GeneratorOptions,
}

impl<'r> CodeGenerator<'r> {
    /// Create a generator with default options
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self::with_options(registry, GeneratorOptions::default())
    }

    /// Create a generator with explicit options
    pub fn with_options(registry: &'r NodeRegistry, options: GeneratorOptions) -> Self {
        Self { registry, options }
    }

    /// The active options
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generate one block per node, in the given order, separated by a blank line
    pub fn generate(&self, nodes: &[&Node]) -> Result<String, GenerateError> {
        let blocks = nodes
            .iter()
            .map(|node| match node {
                Node::Function(function) => self.function_block(function),
                Node::Source(source) => Ok(self.source_block(source)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(blocks.join("\n"))
    }

    fn function_block(&self, node: &FunctionNode) -> Result<String, GenerateError> {
        let definition = self
            .registry
            .get(node.node_type())
            .ok_or_else(|| GenerateError::UnknownNodeType {
                node: node.id.clone(),
                node_type: node.node_type().to_string(),
            })?;
        let indent = &self.options.indent;
        let mut block = format!("// node {}, {}\n", node.id, definition.id);

        let mut replacements = BTreeMap::new();
        for input in &definition.inputs {
            match node.external_input(&input.name) {
                Some(expression) => {
                    replacements.insert(input.name.as_str(), expression.to_string());
                }
                None => {
                    let var = input_var(node.id.as_str(), &input.name);
                    let ty = type_name(&node.port_type(input));
                    block.push_str(&self.declaration(&var, ty, None));
                    block.push('\n');
                    replacements.insert(input.name.as_str(), var);
                }
            }
        }

        block.push_str("{\n");
        for output in &definition.outputs {
            let ty = type_name(&node.port_type(output));
            let _ = writeln!(block, "{indent}{}", self.declaration(&output.name, ty, None));
        }

        let body = template::substitute(&definition.body, &replacements, self.options.substitution);
        for line in body.lines() {
            if line.trim().is_empty() {
                block.push('\n');
            } else {
                let _ = writeln!(block, "{indent}{line}");
            }
        }

        for connection in node.outputs_to.iter().filter(|c| !c.is_terminal()) {
            let output = definition.output(&connection.output).ok_or_else(|| {
                GenerateError::UnknownOutput {
                    node: node.id.clone(),
                    output: connection.output.clone(),
                }
            })?;
            if let PortType::Unresolved { symbol } = node.port_type(output) {
                tracing::debug!(
                    node = %node.id,
                    output = %output.name,
                    symbol,
                    "skipping connection from unresolved generic output"
                );
                continue;
            }
            let _ = writeln!(
                block,
                "{indent}{} = {};",
                input_var(connection.to.as_str(), &connection.input),
                connection.output
            );
        }

        block.push_str("}\n");
        Ok(block)
    }

    fn source_block(&self, node: &SourceNode) -> String {
        let indent = &self.options.indent;
        let mut block = format!("// node {}, {}\n{{\n", node.id, crate::record::EXTERNAL_TYPE);

        let mut outputs: Vec<&str> = Vec::new();
        for connection in &node.outputs_to {
            if !outputs.contains(&connection.output.as_str()) {
                outputs.push(&connection.output);
            }
        }
        if outputs.is_empty() {
            outputs.push(SOURCE_OUTPUT);
        }

        for output in &outputs {
            let declaration = self.declaration(output, node.data_type(), Some(node.expression()));
            let _ = writeln!(block, "{indent}{declaration}");
        }

        for connection in node.outputs_to.iter().filter(|c| !c.is_terminal()) {
            let _ = writeln!(
                block,
                "{indent}{} = {};",
                input_var(connection.to.as_str(), &connection.input),
                connection.output
            );
        }

        block.push_str("}\n");
        block
    }

    fn declaration(&self, name: &str, ty: &str, init: Option<&str>) -> String {
        let init = init.map(|value| format!(" = {value}")).unwrap_or_default();
        match self.options.declarations {
            DeclarationStyle::Typed => format!("{ty} {name}{init};"),
            DeclarationStyle::Untyped => format!("var {name}{init}; // {ty}"),
        }
    }
}

/// Declared type; unresolved generics fall back to their symbol
fn type_name<'a>(port_type: &PortType<'a>) -> &'a str {
    match *port_type {
        PortType::Concrete(ty) => ty,
        PortType::Unresolved { symbol } => symbol,
    }
}
