// SPDX-License-Identifier: MIT OR Apache-2.0
//! Evaluation ordering.
//!
//! Nodes are ordered so that every producer comes before all of its
//! consumers. Roots are visited in ascending id order, which makes the result
//! stable across runs even when the graph has several disconnected parts.

use crate::node::{Node, NodeId};
use std::collections::{BTreeMap, HashSet};

/// Id-keyed view of a node set
pub type NodeGraph<'a> = BTreeMap<&'a str, &'a Node>;

/// Error when ordering a graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SortError {
    /// Graph contains a cycle through the given node
    #[error("graph contains a cycle through node {0}")]
    Cycle(NodeId),

    /// A connection targets a node missing from the graph
    #[error("node {from} is connected to missing node {to}")]
    UnknownNode {
        /// Node owning the connection
        from: NodeId,
        /// Missing target
        to: NodeId,
    },
}

/// Index a node set by id
pub fn to_graph<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> NodeGraph<'a> {
    nodes.into_iter().map(|node| (node.id().as_str(), node)).collect()
}

/// Order every node of `graph` so producers precede consumers.
///
/// Depth-first post-order over non-sentinel connections, reversed at the end.
pub fn sort<'a>(graph: &NodeGraph<'a>) -> Result<Vec<&'a Node>, SortError> {
    let mut visited = HashSet::new();
    let mut temp_mark = HashSet::new();
    let mut order = Vec::with_capacity(graph.len());

    for &node_id in graph.keys() {
        if !visited.contains(node_id) {
            visit(graph, node_id, &mut visited, &mut temp_mark, &mut order)?;
        }
    }

    order.reverse();
    Ok(order)
}

fn visit<'a>(
    graph: &NodeGraph<'a>,
    node_id: &'a str,
    visited: &mut HashSet<&'a str>,
    temp_mark: &mut HashSet<&'a str>,
    order: &mut Vec<&'a Node>,
) -> Result<(), SortError> {
    if temp_mark.contains(node_id) {
        return Err(SortError::Cycle(node_id.into()));
    }
    if visited.contains(node_id) {
        return Ok(());
    }

    let node = graph[node_id];
    temp_mark.insert(node_id);

    // Visit all nodes that depend on this one
    for connection in node.dependents() {
        let Some((&target, _)) = graph.get_key_value(connection.to.as_str()) else {
            return Err(SortError::UnknownNode {
                from: node.id().clone(),
                to: connection.to.clone(),
            });
        };
        visit(graph, target, visited, temp_mark, order)?;
    }

    temp_mark.remove(node_id);
    visited.insert(node_id);
    order.push(node);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::node::{FunctionNode, SourceNode};

    fn node(id: &str, edges: &[(&str, &str)]) -> Node {
        let mut node: Node = FunctionNode::new(id, "t").into();
        for &(to, input) in edges {
            node.add_connection(Connection::new("out", to, input));
        }
        node
    }

    fn ids(order: &[&Node]) -> Vec<String> {
        order.iter().map(|n| n.id().to_string()).collect()
    }

    fn position(order: &[String], id: &str) -> usize {
        order.iter().position(|n| n == id).unwrap()
    }

    #[test]
    fn producers_precede_consumers() {
        // a -> b -> d, a -> c -> d
        let nodes = vec![
            node("d", &[]),
            node("c", &[("d", "y")]),
            node("b", &[("d", "x")]),
            node("a", &[("b", "in"), ("c", "in")]),
        ];
        let graph = to_graph(&nodes);
        let order = ids(&sort(&graph).unwrap());

        assert_eq!(order.len(), 4);
        assert!(position(&order, "a") < position(&order, "b"));
        assert!(position(&order, "a") < position(&order, "c"));
        assert!(position(&order, "b") < position(&order, "d"));
        assert!(position(&order, "c") < position(&order, "d"));
    }

    #[test]
    fn disconnected_parts_are_ordered_by_id() {
        let mut source: Node = SourceNode::new("m", "float").into();
        source.add_connection(Connection::new("value", "n", "x"));
        let nodes = vec![node("z", &[]), node("n", &[]), source, node("b", &[])];

        let first = ids(&sort(&to_graph(&nodes)).unwrap());
        let reversed: Vec<Node> = nodes.iter().rev().cloned().collect();
        let second = ids(&sort(&to_graph(&reversed)).unwrap());

        assert_eq!(first, second);
        assert_eq!(first, vec!["z", "m", "n", "b"]);
    }

    #[test]
    fn sentinel_edges_are_ignored() {
        let mut a = node("a", &[]);
        a.add_connection(Connection::terminal("out"));
        let nodes = vec![a];
        let order = sort(&to_graph(&nodes)).unwrap();
        assert_eq!(ids(&order), vec!["a"]);
    }

    #[test]
    fn dangling_targets_are_reported() {
        let nodes = vec![node("a", &[("gone", "x")])];
        assert_eq!(
            sort(&to_graph(&nodes)),
            Err(SortError::UnknownNode {
                from: "a".into(),
                to: "gone".into(),
            })
        );
    }

    #[test]
    fn cycles_are_reported() {
        let nodes = vec![node("a", &[("b", "x")]), node("b", &[("a", "x")])];
        assert!(matches!(sort(&to_graph(&nodes)), Err(SortError::Cycle(_))));
    }
}
