// SPDX-License-Identifier: MIT OR Apache-2.0
//! The validated node structure.
//!
//! [`Structure`] owns every node of a shader graph and is the only way to
//! add or remove nodes and connections. Nodes refer to each other by
//! [`NodeId`] only; the id-indexed map is the single source of truth.
//!
//! After every successful mutation:
//! - node ids are unique,
//! - every `(target, input)` pair is fed by at most one connection,
//! - non-generic inputs receive exactly their declared type,
//! - generic symbols are bound to one concrete type per node,
//! - following non-sentinel connections never leads back to the start node.

use crate::connection::Connection;
use crate::node::{ExternalInput, FunctionNode, Node, NodeId, NodeRegistry, NodeTypeDefinition};
use crate::port::{PortDirection, PortSpec, PortType};
use crate::record::{NodeRecord, RecordError};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Reason a connection is refused by [`Structure::accepts_connection`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Node not found
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    /// Node references an unregistered type
    #[error("node type \"{0}\" is not registered")]
    UnknownNodeType(String),

    /// Port not declared on the node
    #[error("node {node} has no {direction} named \"{port}\"")]
    UnknownPort {
        /// Node ID
        node: NodeId,
        /// Which side was looked up
        direction: PortDirection,
        /// Port name
        port: String,
    },

    /// Input already fed by a connection or an external expression
    #[error("input \"{0}\" is already occupied")]
    InputOccupied(String),

    /// Generic output without a resolved type feeding a non-generic input
    #[error("output \"{output}\" has unresolved generic type {symbol}")]
    UnresolvedGeneric {
        /// Output name
        output: String,
        /// Type variable of the output
        symbol: String,
    },

    /// Output and input types differ
    #[error("could not match output \"{output}\" of type {output_type} with input \"{input}\" of type {input_type}")]
    TypeMismatch {
        /// Output name
        output: String,
        /// Output type
        output_type: String,
        /// Input name
        input: String,
        /// Input type
        input_type: String,
    },

    /// Connection would close a cycle
    #[error("cannot have cycles")]
    Cycle,
}

/// Error when mutating or loading a [`Structure`]
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    /// Connection refused by validation; the structure is unchanged
    #[error("could not connect {from}[{output}] to {to}[{input}]; {reason}")]
    Rejected {
        /// Source node ID
        from: NodeId,
        /// Source output
        output: String,
        /// Target node ID
        to: NodeId,
        /// Target input
        input: String,
        /// Why validation failed
        reason: Rejection,
    },

    /// A propagated type disagrees with a generic binding or a fixed-type input
    #[error("type conflict at {node}[{slot}]: resolved as {resolved}, cannot rebind to {attempted}")]
    TypeConflict {
        /// Node where the conflict surfaced
        node: NodeId,
        /// Generic symbol, or the name of the fixed-type input
        slot: String,
        /// Type already in place
        resolved: String,
        /// Type that reached the slot
        attempted: String,
    },

    /// External input binding refused
    #[error("could not bind {node}[{input}]; {reason}")]
    Binding {
        /// Node ID
        node: NodeId,
        /// Input name
        input: String,
        /// Why binding failed
        reason: Rejection,
    },

    /// Node not found
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Connection to remove does not exist
    #[error("connection not found: {from}[{output}] -> {to}[{input}]")]
    ConnectionNotFound {
        /// Source node ID
        from: NodeId,
        /// Source output
        output: String,
        /// Target node ID
        to: NodeId,
        /// Target input
        input: String,
    },

    /// Two records share an id
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// Malformed record
    #[error(transparent)]
    Record(#[from] RecordError),
}

impl StructureError {
    fn rejected(from: &str, connection: &Connection, reason: Rejection) -> Self {
        Self::Rejected {
            from: NodeId::from(from),
            output: connection.output.clone(),
            to: connection.to.clone(),
            input: connection.input.clone(),
            reason,
        }
    }
}

/// A shader node graph validated against a [`NodeRegistry`]
#[derive(Debug, Clone)]
pub struct Structure<'r> {
    registry: &'r NodeRegistry,
    /// Nodes in insertion order
    nodes: IndexMap<NodeId, Node>,
}

impl<'r> Structure<'r> {
    /// Create an empty structure
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self {
            registry,
            nodes: IndexMap::new(),
        }
    }

    /// The registry used for validation
    pub fn registry(&self) -> &'r NodeRegistry {
        self.registry
    }

    /// Add a node to the structure.
    ///
    /// A node with the same id is replaced, not merged.
    pub fn add_node(&mut self, node: impl Into<Node>) -> &mut Self {
        let node = node.into();
        tracing::debug!(node = %node.id(), node_type = node.node_type(), "add node");
        if let Some(previous) = self.nodes.insert(node.id().clone(), node) {
            tracing::debug!(node = %previous.id(), "replaced existing node");
        }
        self
    }

    /// Remove a node.
    ///
    /// Connections from or to the node are not severed; remove them first.
    pub fn remove_node(&mut self, node_id: &str) -> Option<Node> {
        let node = self.nodes.shift_remove(node_id)?;
        let dangling = node.dependents().count()
            + self
                .connections()
                .filter(|(_, c)| c.targets(node_id))
                .count();
        if dangling > 0 {
            tracing::warn!(node = node_id, dangling, "removed node still has connections");
        }
        Some(node)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Whether a node exists
    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Get all nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get all connections with their source node
    pub fn connections(&self) -> impl Iterator<Item = (&NodeId, &Connection)> {
        self.nodes
            .values()
            .flat_map(|node| node.outputs_to().iter().map(move |c| (node.id(), c)))
    }

    /// Get connections from or to a node
    pub fn connections_for_node<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = (&'a NodeId, &'a Connection)> {
        self.connections()
            .filter(move |(from, c)| from.as_str() == node_id || c.targets(node_id))
    }

    /// Concrete type bound to a generic symbol of a function node
    pub fn resolved_type(&self, node_id: &str, symbol: &str) -> Option<&str> {
        self.node(node_id)?.as_function()?.resolved_type(symbol)
    }

    /// Type produced by an output of a node, resolving generic symbols
    pub fn output_type(&self, node_id: &str, output: &str) -> Result<PortType<'_>, Rejection> {
        let node = self
            .node(node_id)
            .ok_or_else(|| Rejection::NodeNotFound(node_id.into()))?;
        self.output_port_type(node, output)
    }

    /// Check whether `connection` may be added from `source` without changing anything.
    ///
    /// Checks run in order and stop at the first failure: occupancy, output
    /// type, input type, cycles. Generic inputs accept any type here; a
    /// conflicting binding surfaces from [`add_connection`](Self::add_connection).
    pub fn accepts_connection(&self, source: &str, connection: &Connection) -> Result<(), Rejection> {
        let source_node = self
            .node(source)
            .ok_or_else(|| Rejection::NodeNotFound(source.into()))?;

        if connection.is_terminal() {
            return self.output_port_type(source_node, &connection.output).map(|_| ());
        }

        let target = self
            .node(connection.to.as_str())
            .ok_or_else(|| Rejection::NodeNotFound(connection.to.clone()))?;
        if let Node::Function(target) = target {
            if target.is_occupied(&connection.input) {
                return Err(Rejection::InputOccupied(connection.input.clone()));
            }
        }

        self.check_edge(source_node, connection)
    }

    /// Connect an output of `source` to an input of another node.
    ///
    /// On a [`StructureError::TypeConflict`] the connection and any bindings
    /// it produced are rolled back.
    pub fn add_connection(&mut self, source: &str, connection: Connection) -> Result<(), StructureError> {
        if let Err(reason) = self.accepts_connection(source, &connection) {
            return Err(StructureError::rejected(source, &connection, reason));
        }

        self.attach(source, connection.clone());

        let mut journal = Vec::new();
        if let Err(err) = self.reflow_types(source, &connection, &mut journal) {
            tracing::debug!(error = %err, "rolling back connection");
            self.detach(source, &connection);
            for (node_id, symbol) in journal {
                if let Some(Node::Function(node)) = self.nodes.get_mut(&node_id) {
                    node.resolved_types.remove(&symbol);
                }
            }
            return Err(err);
        }

        tracing::debug!(
            from = source,
            output = %connection.output,
            to = %connection.to,
            input = %connection.input,
            "connected"
        );
        Ok(())
    }

    /// Remove a connection.
    ///
    /// The target input becomes free again and generic bindings are recomputed
    /// from the remaining connections, so a slot only stays bound while some
    /// connection still constrains it. If the bindings cannot be recomputed
    /// the structure is left as it was.
    pub fn remove_connection(&mut self, source: &str, connection: &Connection) -> Result<Connection, StructureError> {
        let before = self.nodes.clone();
        let removed = self.detach(source, connection).ok_or_else(|| {
            StructureError::ConnectionNotFound {
                from: source.into(),
                output: connection.output.clone(),
                to: connection.to.clone(),
                input: connection.input.clone(),
            }
        })?;

        if !removed.is_terminal() {
            if let Err(err) = self.reflow_all() {
                tracing::debug!(error = %err, "restoring removed connection");
                self.nodes = before;
                return Err(err);
            }
        }
        tracing::debug!(from = source, to = %removed.to, input = %removed.input, "disconnected");
        Ok(removed)
    }

    /// Bind an input to an expression instead of an upstream node
    pub fn bind_external_input(
        &mut self,
        node_id: &str,
        input: &str,
        expression: impl Into<String>,
    ) -> Result<(), StructureError> {
        let binding_error = |reason| StructureError::Binding {
            node: node_id.into(),
            input: input.to_string(),
            reason,
        };

        let node = self
            .node(node_id)
            .ok_or_else(|| StructureError::NodeNotFound(node_id.into()))?;
        self.input_port(node, input).map_err(binding_error)?;

        let Some(node) = self.nodes.get_mut(node_id).and_then(Node::as_function_mut) else {
            return Err(StructureError::NodeNotFound(node_id.into()));
        };
        if node.is_occupied(input) {
            return Err(binding_error(Rejection::InputOccupied(input.to_string())));
        }
        node.external_inputs.push(ExternalInput {
            name: input.to_string(),
            external: expression.into(),
        });
        Ok(())
    }

    /// Remove an external input binding, returning its expression
    pub fn unbind_external_input(&mut self, node_id: &str, input: &str) -> Option<String> {
        let node = self.nodes.get_mut(node_id)?.as_function_mut()?;
        let index = node.external_inputs.iter().position(|e| e.name == input)?;
        Some(node.external_inputs.remove(index).external)
    }

    /// Re-check every connection against the registry.
    ///
    /// Mutations keep the structure valid; this is for structures whose
    /// registry may have changed underneath them.
    pub fn validate(&self) -> Result<(), StructureError> {
        for (from, connection) in self.connections() {
            let source = &self.nodes[from];
            let result = if connection.is_terminal() {
                self.output_port_type(source, &connection.output).map(|_| ())
            } else {
                self.check_edge(source, connection)
            };
            result.map_err(|reason| StructureError::rejected(from.as_str(), connection, reason))?;
        }
        Ok(())
    }

    /// Serialize all nodes, in insertion order
    pub fn to_records(&self) -> Vec<NodeRecord> {
        self.nodes.values().map(Node::to_record).collect()
    }

    /// Rebuild a structure from records.
    ///
    /// Occupancy and generic bindings are derived from the connections, and
    /// the result is validated like an incremental edit would be.
    pub fn from_records(registry: &'r NodeRegistry, records: &[NodeRecord]) -> Result<Self, StructureError> {
        let mut structure = Self::new(registry);
        for record in records {
            if structure.contains(record.id.as_str()) {
                return Err(StructureError::DuplicateNode(record.id.clone()));
            }
            structure.add_node(Node::from_record(record)?);
        }

        for record in records {
            for connection in &record.outputs_to {
                structure.load_connection(record.id.as_str(), connection)?;
            }
        }

        structure.reflow_all()?;
        structure.validate()?;
        Ok(structure)
    }

    /// Serialize as a JSON array of records
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_records())
    }

    /// Parse a JSON array of records
    pub fn from_json(registry: &'r NodeRegistry, json: &str) -> Result<Self, StructureError> {
        let records = crate::record::parse_records(json)?;
        Self::from_records(registry, &records)
    }

    fn definition(&self, node: &FunctionNode) -> Result<&'r NodeTypeDefinition, Rejection> {
        self.registry
            .get(&node.node_type)
            .ok_or_else(|| Rejection::UnknownNodeType(node.node_type.clone()))
    }

    fn output_port_type<'a>(&'a self, node: &'a Node, output: &str) -> Result<PortType<'a>, Rejection> {
        match node {
            Node::Source(source) => Ok(PortType::Concrete(source.data_type())),
            Node::Function(function) => {
                let port = self.definition(function)?.output(output).ok_or_else(|| {
                    Rejection::UnknownPort {
                        node: function.id.clone(),
                        direction: PortDirection::Output,
                        port: output.to_string(),
                    }
                })?;
                Ok(function.port_type(port))
            }
        }
    }

    fn input_port(&self, node: &Node, input: &str) -> Result<&'r PortSpec, Rejection> {
        let unknown = || Rejection::UnknownPort {
            node: node.id().clone(),
            direction: PortDirection::Input,
            port: input.to_string(),
        };
        match node {
            Node::Source(_) => Err(unknown()),
            Node::Function(function) => self.definition(function)?.input(input).ok_or_else(unknown),
        }
    }

    /// Type and cycle checks shared by new and existing connections
    fn check_edge(&self, source: &Node, connection: &Connection) -> Result<(), Rejection> {
        let output_type = self.output_port_type(source, &connection.output)?;

        let target = self
            .node(connection.to.as_str())
            .ok_or_else(|| Rejection::NodeNotFound(connection.to.clone()))?;
        let input = self.input_port(target, &connection.input)?;

        if !input.generic {
            match output_type {
                PortType::Concrete(ty) if ty == input.data_type => {}
                PortType::Concrete(ty) => {
                    return Err(Rejection::TypeMismatch {
                        output: connection.output.clone(),
                        output_type: ty.to_string(),
                        input: connection.input.clone(),
                        input_type: input.data_type.clone(),
                    });
                }
                PortType::Unresolved { symbol } => {
                    return Err(Rejection::UnresolvedGeneric {
                        output: connection.output.clone(),
                        symbol: symbol.to_string(),
                    });
                }
            }
        }

        if self.returns_to(source.id().as_str(), connection.to.as_str()) {
            return Err(Rejection::Cycle);
        }
        Ok(())
    }

    /// Whether following connections from `from` reaches `start`
    fn returns_to(&self, start: &str, from: &str) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == start {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(node) = self.node(current) {
                stack.extend(node.dependents().map(|c| c.to.as_str()));
            }
        }

        false
    }

    /// Append a connection and occupy its input, without validation
    fn attach(&mut self, source: &str, connection: Connection) {
        if !connection.is_terminal() {
            if let Some(Node::Function(target)) = self.nodes.get_mut(connection.to.as_str()) {
                target.incoming_connections.insert(connection.input.clone());
            }
        }
        if let Some(node) = self.nodes.get_mut(source) {
            node.add_connection(connection);
        }
    }

    /// Remove a connection and free its input
    fn detach(&mut self, source: &str, connection: &Connection) -> Option<Connection> {
        let removed = self.nodes.get_mut(source)?.remove_connection(connection)?;
        if !removed.is_terminal() {
            if let Some(Node::Function(target)) = self.nodes.get_mut(removed.to.as_str()) {
                target.incoming_connections.remove(&removed.input);
            }
        }
        Some(removed)
    }

    /// Attach a connection read from a record; types are checked once all are loaded
    fn load_connection(&mut self, source: &str, connection: &Connection) -> Result<(), StructureError> {
        let reject = |reason| StructureError::rejected(source, connection, reason);

        if !connection.is_terminal() {
            let target = self
                .node(connection.to.as_str())
                .ok_or_else(|| reject(Rejection::NodeNotFound(connection.to.clone())))?;
            self.input_port(target, &connection.input).map_err(reject)?;
            if let Node::Function(target) = target {
                if target.is_occupied(&connection.input) {
                    return Err(reject(Rejection::InputOccupied(connection.input.clone())));
                }
            }
        }

        self.attach(source, connection.clone());
        Ok(())
    }

    /// Propagate the type carried by a new connection into generic slots downstream.
    ///
    /// Every binding made is pushed to `journal` so the caller can undo it.
    fn reflow_types(
        &mut self,
        source: &str,
        connection: &Connection,
        journal: &mut Vec<(NodeId, String)>,
    ) -> Result<(), StructureError> {
        let registry = self.registry;
        // The starting edge had its fixed-type input checked on acceptance
        let mut pending = vec![(NodeId::from(source), connection.clone(), false)];

        while let Some((from, edge, propagated)) = pending.pop() {
            if edge.is_terminal() {
                continue;
            }
            let Some(output_type) = self
                .output_type(from.as_str(), &edge.output)
                .ok()
                .and_then(|ty| ty.concrete())
                .map(str::to_string)
            else {
                continue;
            };

            let Some(Node::Function(target)) = self.nodes.get_mut(edge.to.as_str()) else {
                continue;
            };
            let Some(definition) = registry.get(&target.node_type) else {
                continue;
            };
            let Some(input) = definition.input(&edge.input) else {
                continue;
            };

            let Some(symbol) = input.symbol() else {
                if propagated && input.data_type != output_type {
                    return Err(StructureError::TypeConflict {
                        node: target.id.clone(),
                        slot: input.name.clone(),
                        resolved: input.data_type.clone(),
                        attempted: output_type,
                    });
                }
                continue;
            };

            match target.resolved_types.get(symbol) {
                Some(resolved) if *resolved == output_type => continue,
                Some(resolved) => {
                    return Err(StructureError::TypeConflict {
                        node: target.id.clone(),
                        slot: symbol.to_string(),
                        resolved: resolved.clone(),
                        attempted: output_type,
                    });
                }
                None => {}
            }

            tracing::trace!(node = %target.id, symbol, ty = %output_type, "resolved generic");
            target
                .resolved_types
                .insert(symbol.to_string(), output_type);
            journal.push((target.id.clone(), symbol.to_string()));

            for output in definition.outputs_with_symbol(symbol) {
                pending.extend(
                    target
                        .outputs_to
                        .iter()
                        .filter(|c| c.output == output.name)
                        .map(|c| (target.id.clone(), c.clone(), true)),
                );
            }
        }

        Ok(())
    }

    /// Recompute every generic binding from the current connections
    fn reflow_all(&mut self) -> Result<(), StructureError> {
        for node in self.nodes.values_mut() {
            if let Some(function) = node.as_function_mut() {
                function.resolved_types.clear();
            }
        }

        let edges: Vec<(NodeId, Connection)> = self
            .connections()
            .filter(|(_, c)| !c.is_terminal())
            .map(|(from, c)| (from.clone(), c.clone()))
            .collect();

        let mut journal = Vec::new();
        for (from, connection) in edges {
            self.reflow_types(from.as_str(), &connection, &mut journal)?;
        }
        Ok(())
    }
}
