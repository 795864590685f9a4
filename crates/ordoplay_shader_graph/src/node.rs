// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the shader graph.
//!
//! Two node variants exist: [`FunctionNode`]s instantiate a
//! [`NodeTypeDefinition`] from the [`NodeRegistry`], and [`SourceNode`]s feed a
//! single value of a fixed type into the graph.

use crate::connection::Connection;
use crate::port::{PortDirection, PortSpec, PortType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a new random node ID.
    ///
    /// The result is a valid identifier in C-like languages, so it can be
    /// spliced into generated variable names.
    pub fn generate() -> Self {
        Self(format!("n{}", Uuid::new_v4().simple()))
    }

    /// The raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Arithmetic
    Math,
    /// Vector construction and geometry
    Vector,
    /// Color operations
    Color,
    /// Utility nodes
    Utility,
    /// Custom/user-defined
    #[default]
    Custom,
}

/// Node type definition, one entry of the [`NodeRegistry`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTypeDefinition {
    /// Unique type identifier
    #[serde(rename = "type")]
    pub id: String,
    /// Declared inputs, in order
    #[serde(default)]
    pub inputs: Vec<PortSpec>,
    /// Declared outputs, in order
    #[serde(default)]
    pub outputs: Vec<PortSpec>,
    /// Code template referencing the ports as free identifiers
    #[serde(default)]
    pub body: String,
    /// Category
    #[serde(default)]
    pub category: NodeCategory,
    /// Description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl NodeTypeDefinition {
    /// Create a definition with no ports
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            body: body.into(),
            category: NodeCategory::default(),
            description: String::new(),
        }
    }

    /// Append an input port
    pub fn with_input(mut self, port: PortSpec) -> Self {
        self.inputs.push(port);
        self
    }

    /// Append an output port
    pub fn with_output(mut self, port: PortSpec) -> Self {
        self.outputs.push(port);
        self
    }

    /// Set the category
    pub fn with_category(mut self, category: NodeCategory) -> Self {
        self.category = category;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Get an input port by name
    pub fn input(&self, name: &str) -> Option<&PortSpec> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Get an output port by name
    pub fn output(&self, name: &str) -> Option<&PortSpec> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Get a port by direction and name
    pub fn port(&self, direction: PortDirection, name: &str) -> Option<&PortSpec> {
        match direction {
            PortDirection::Input => self.input(name),
            PortDirection::Output => self.output(name),
        }
    }

    /// Generic outputs bound to `symbol`
    pub fn outputs_with_symbol<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a PortSpec> {
        self.outputs.iter().filter(move |p| p.symbol() == Some(symbol))
    }
}

/// Binds an input directly to a literal or uniform expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalInput {
    /// Input name on the node
    pub name: String,
    /// Expression substituted for the input in the body
    pub external: String,
}

/// Payload of a source node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSource {
    /// Type of the value the node provides
    #[serde(rename = "dataType")]
    pub data_type: String,
    /// Expression reading the value; the node ID names it when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

/// A node instantiating a registered node type
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub(crate) id: NodeId,
    pub(crate) node_type: String,
    pub(crate) outputs_to: Vec<Connection>,
    /// Input names fed by a connection
    pub(crate) incoming_connections: BTreeSet<String>,
    /// Generic symbol -> concrete type
    pub(crate) resolved_types: BTreeMap<String, String>,
    pub(crate) external_inputs: Vec<ExternalInput>,
}

impl FunctionNode {
    /// Create an unconnected node of the given type
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            outputs_to: Vec::new(),
            incoming_connections: BTreeSet::new(),
            resolved_types: BTreeMap::new(),
            external_inputs: Vec::new(),
        }
    }

    /// Bind an input to an expression instead of an upstream node
    pub fn with_external_input(mut self, name: impl Into<String>, external: impl Into<String>) -> Self {
        self.external_inputs.push(ExternalInput {
            name: name.into(),
            external: external.into(),
        });
        self
    }

    /// Node type ID
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    /// Input names currently fed by a connection
    pub fn incoming_connections(&self) -> &BTreeSet<String> {
        &self.incoming_connections
    }

    /// Resolved generic bindings, keyed by type symbol
    pub fn resolved_types(&self) -> &BTreeMap<String, String> {
        &self.resolved_types
    }

    /// Concrete type bound to a generic symbol
    pub fn resolved_type(&self, symbol: &str) -> Option<&str> {
        self.resolved_types.get(symbol).map(String::as_str)
    }

    /// Inputs bound to expressions
    pub fn external_inputs(&self) -> &[ExternalInput] {
        &self.external_inputs
    }

    /// Expression bound to an input, if any
    pub fn external_input(&self, name: &str) -> Option<&str> {
        self.external_inputs
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.external.as_str())
    }

    /// Whether an input is fed by a connection or an external expression
    pub fn is_occupied(&self, input: &str) -> bool {
        self.incoming_connections.contains(input) || self.external_input(input).is_some()
    }

    /// Type of a port on this instance, resolving generic symbols
    pub fn port_type<'a>(&'a self, port: &'a PortSpec) -> PortType<'a> {
        match port.symbol() {
            None => PortType::Concrete(&port.data_type),
            Some(symbol) => match self.resolved_type(symbol) {
                Some(ty) => PortType::Concrete(ty),
                None => PortType::Unresolved { symbol },
            },
        }
    }
}

/// A node providing a single value of a fixed type
#[derive(Debug, Clone, PartialEq)]
pub struct SourceNode {
    pub(crate) id: NodeId,
    pub(crate) external: ExternalSource,
    pub(crate) outputs_to: Vec<Connection>,
}

impl SourceNode {
    /// Create an unconnected source of the given data type
    pub fn new(id: impl Into<NodeId>, data_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: ExternalSource {
                data_type: data_type.into(),
                expression: None,
            },
            outputs_to: Vec::new(),
        }
    }

    /// Read the value from `expression` instead of an identifier named after the node
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.external.expression = Some(expression.into());
        self
    }

    /// Type of the provided value
    pub fn data_type(&self) -> &str {
        &self.external.data_type
    }

    /// External payload
    pub fn external(&self) -> &ExternalSource {
        &self.external
    }

    /// Expression producing the value
    pub fn expression(&self) -> &str {
        self.external.expression.as_deref().unwrap_or(self.id.as_str())
    }
}

/// A node instance in the graph
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Instance of a registered node type
    Function(FunctionNode),
    /// Fixed-type value provider
    Source(SourceNode),
}

impl Node {
    /// Unique instance ID
    pub fn id(&self) -> &NodeId {
        match self {
            Self::Function(node) => &node.id,
            Self::Source(node) => &node.id,
        }
    }

    /// Type ID; source nodes report [`EXTERNAL_TYPE`](crate::record::EXTERNAL_TYPE)
    pub fn node_type(&self) -> &str {
        match self {
            Self::Function(node) => &node.node_type,
            Self::Source(_) => crate::record::EXTERNAL_TYPE,
        }
    }

    /// Connections originating at this node, in insertion order
    pub fn outputs_to(&self) -> &[Connection] {
        match self {
            Self::Function(node) => &node.outputs_to,
            Self::Source(node) => &node.outputs_to,
        }
    }

    /// Non-sentinel connections originating at this node
    pub fn dependents(&self) -> impl Iterator<Item = &Connection> {
        self.outputs_to().iter().filter(|c| !c.is_terminal())
    }

    /// The function node payload, if this is a function node
    pub fn as_function(&self) -> Option<&FunctionNode> {
        match self {
            Self::Function(node) => Some(node),
            Self::Source(_) => None,
        }
    }

    pub(crate) fn as_function_mut(&mut self) -> Option<&mut FunctionNode> {
        match self {
            Self::Function(node) => Some(node),
            Self::Source(_) => None,
        }
    }

    pub(crate) fn outputs_to_mut(&mut self) -> &mut Vec<Connection> {
        match self {
            Self::Function(node) => &mut node.outputs_to,
            Self::Source(node) => &mut node.outputs_to,
        }
    }

    pub(crate) fn add_connection(&mut self, connection: Connection) {
        self.outputs_to_mut().push(connection);
    }

    pub(crate) fn remove_connection(&mut self, connection: &Connection) -> Option<Connection> {
        let outputs_to = self.outputs_to_mut();
        let index = outputs_to.iter().position(|c| c == connection)?;
        Some(outputs_to.remove(index))
    }
}

impl From<FunctionNode> for Node {
    fn from(node: FunctionNode) -> Self {
        Self::Function(node)
    }
}

impl From<SourceNode> for Node {
    fn from(node: SourceNode) -> Self {
        Self::Source(node)
    }
}

/// Registry of available node types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<NodeTypeDefinition>", into = "Vec<NodeTypeDefinition>")]
pub struct NodeRegistry {
    /// Registered node types by ID
    types: IndexMap<String, NodeTypeDefinition>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type, returning the definition it replaced
    pub fn register(&mut self, node_type: NodeTypeDefinition) -> Option<NodeTypeDefinition> {
        self.types.insert(node_type.id.clone(), node_type)
    }

    /// Get a node type by ID
    pub fn get(&self, id: &str) -> Option<&NodeTypeDefinition> {
        self.types.get(id)
    }

    /// Whether a node type is registered
    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeTypeDefinition> {
        self.types.values()
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeTypeDefinition> {
        self.types.values().filter(move |t| t.category == category)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Create an unconnected node from a type ID
    pub fn create_node(&self, type_id: &str, id: impl Into<NodeId>) -> Option<Node> {
        self.get(type_id)
            .map(|def| FunctionNode::new(id, def.id.clone()).into())
    }

    /// Parse a registry from a JSON array of definitions
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize the registry as a JSON array of definitions
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<Vec<NodeTypeDefinition>> for NodeRegistry {
    fn from(definitions: Vec<NodeTypeDefinition>) -> Self {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition);
        }
        registry
    }
}

impl From<NodeRegistry> for Vec<NodeTypeDefinition> {
    fn from(registry: NodeRegistry) -> Self {
        registry.types.into_values().collect()
    }
}

impl FromIterator<NodeTypeDefinition> for NodeRegistry {
    fn from_iter<I: IntoIterator<Item = NodeTypeDefinition>>(iter: I) -> Self {
        let mut registry = Self::new();
        for definition in iter {
            registry.register(definition);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_identifiers() {
        let id = NodeId::generate();
        assert!(id.as_str().starts_with('n'));
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, NodeId::generate());
    }

    #[test]
    fn registry_parses_definition_list() {
        let registry = NodeRegistry::from_json(
            r#"[{
                "type": "double",
                "inputs": [{"name": "x", "type": "float"}],
                "outputs": [{"name": "y", "type": "float"}],
                "body": "y = x * 2.0;"
            }]"#,
        )
        .unwrap();

        let def = registry.get("double").unwrap();
        assert_eq!(def.input("x"), Some(&PortSpec::new("x", "float")));
        assert_eq!(def.port(PortDirection::Output, "y").map(|p| p.data_type.as_str()), Some("float"));
        assert!(def.input("y").is_none());
        assert_eq!(def.category, NodeCategory::Custom);
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let mut registry = NodeRegistry::new();
        assert!(registry.register(NodeTypeDefinition::new("t", "a")).is_none());
        let previous = registry.register(NodeTypeDefinition::new("t", "b")).unwrap();
        assert_eq!(previous.body, "a");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("t").unwrap().body, "b");
    }

    #[test]
    fn create_node_requires_registered_type() {
        let registry: NodeRegistry = [NodeTypeDefinition::new("double", "y = x * 2.0;")].into_iter().collect();
        assert!(registry.contains("double"));
        assert!(!registry.contains("triple"));

        let node = registry.create_node("double", "B").unwrap();
        assert_eq!(node.id().as_str(), "B");
        assert_eq!(node.node_type(), "double");
        assert!(node.outputs_to().is_empty());
        assert!(registry.create_node("triple", "C").is_none());
    }

    #[test]
    fn occupancy_includes_external_inputs() {
        let mut node = FunctionNode::new("mix", "mix").with_external_input("t", "0.5");
        node.incoming_connections.insert("a".to_string());
        assert!(node.is_occupied("a"));
        assert!(node.is_occupied("t"));
        assert!(!node.is_occupied("b"));
        assert_eq!(node.external_input("t"), Some("0.5"));
    }

    #[test]
    fn node_level_connection_bookkeeping() {
        let mut node: Node = SourceNode::new("uv", "vec2").into();
        let connection = Connection::new("value", "tex", "uv");
        node.add_connection(connection.clone());
        node.add_connection(Connection::terminal("value"));
        assert_eq!(node.outputs_to().len(), 2);
        assert_eq!(node.dependents().count(), 1);
        assert_eq!(node.remove_connection(&connection), Some(connection));
        assert_eq!(node.dependents().count(), 0);
        assert_eq!(node.node_type(), "external");
    }
}
