// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader node graph for `OrdoPlay`.
//!
//! This crate models a material/shader as a directed graph of typed nodes and
//! compiles it to flat procedural code:
//! - Node types come from a [`NodeRegistry`] passed in by the caller
//! - [`Structure`] validates every edit (occupancy, types, cycles)
//! - Generic ports are resolved by propagation along connections
//! - [`evaluation::sort`] yields a deterministic producer-first order
//! - [`CodeGenerator`] splices each node's body template into its own block
//!
//! ## Example
//!
//! ```
//! use ordoplay_shader_graph::{
//!     build_shader, Connection, FunctionNode, NodeRegistry, NodeTypeDefinition, PortSpec,
//!     SourceNode, Structure,
//! };
//!
//! let registry: NodeRegistry = [NodeTypeDefinition::new("double", "y = x * 2.0;")
//!     .with_input(PortSpec::new("x", "float"))
//!     .with_output(PortSpec::new("y", "float"))]
//! .into_iter()
//! .collect();
//!
//! let mut structure = Structure::new(&registry);
//! structure
//!     .add_node(SourceNode::new("A", "float"))
//!     .add_node(FunctionNode::new("B", "double"));
//! structure.add_connection("A", Connection::new("value", "B", "x"))?;
//!
//! let code = build_shader(&registry, &structure.to_records())?;
//! assert!(code.contains("y = inp_B_x * 2.0;"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codegen;
pub mod compiler;
pub mod connection;
pub mod evaluation;
pub mod node;
pub mod port;
pub mod record;
pub mod stock;
pub mod structure;
pub mod template;

pub use codegen::{CodeGenerator, DeclarationStyle, GenerateError, GeneratorOptions};
pub use compiler::{build_shader, build_shader_with, BuildError};
pub use connection::{Connection, SENTINEL};
pub use evaluation::SortError;
pub use node::{
    ExternalInput, ExternalSource, FunctionNode, Node, NodeCategory, NodeId, NodeRegistry,
    NodeTypeDefinition, SourceNode,
};
pub use port::{PortDirection, PortSpec, PortType};
pub use record::{NodeRecord, RecordError};
pub use structure::{Rejection, Structure, StructureError};
pub use template::SubstitutionMode;
