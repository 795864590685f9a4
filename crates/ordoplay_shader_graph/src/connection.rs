// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// Reserved `to` value marking an output as unused.
pub const SENTINEL: &str = "_";

/// A connection from an output of the owning node to an input of another node.
///
/// Connections are stored on their source node, so the source id is implicit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Output name on the source node
    pub output: String,
    /// Target node ID, or [`SENTINEL`]
    pub to: NodeId,
    /// Input name on the target node
    pub input: String,
}

impl Connection {
    /// Create a new connection
    pub fn new(output: impl Into<String>, to: impl Into<NodeId>, input: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            to: to.into(),
            input: input.into(),
        }
    }

    /// Create a connection marking `output` as unused
    pub fn terminal(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            to: NodeId::from(SENTINEL),
            input: String::new(),
        }
    }

    /// Whether this connection targets the sentinel and carries no dependency
    pub fn is_terminal(&self) -> bool {
        self.to.as_str() == SENTINEL
    }

    /// Check if this connection feeds a specific node
    pub fn targets(&self, node_id: &str) -> bool {
        self.to.as_str() == node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_connections_are_detected() {
        assert!(Connection::terminal("rgb").is_terminal());
        assert!(!Connection::new("rgb", "mix", "a").is_terminal());
    }

    #[test]
    fn record_shape() {
        let connection: Connection =
            serde_json::from_str(r#"{"output":"value","to":"B","input":"x"}"#).unwrap();
        assert_eq!(connection, Connection::new("value", "B", "x"));
        assert!(connection.targets("B"));
    }
}
