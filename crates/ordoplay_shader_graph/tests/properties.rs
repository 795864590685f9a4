// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based tests for structure validation and ordering.
//!
//! Random DAGs are built through the validating API in random insertion
//! order, then checked for ordering, determinism and record round trips.

use ordoplay_shader_graph::evaluation::{sort, to_graph};
use ordoplay_shader_graph::{
    Connection, FunctionNode, NodeRegistry, NodeTypeDefinition, PortSpec, Structure,
};
use proptest::prelude::*;
use std::collections::HashSet;

const MAX_NODES: usize = 10;

/// One node type with an input per possible upstream node
fn fan_in_registry() -> NodeRegistry {
    let mut sum = NodeTypeDefinition::new("sum", "o = 0.0;").with_output(PortSpec::new("o", "float"));
    for i in 0..MAX_NODES {
        sum = sum.with_input(PortSpec::new(format!("i{i}"), "float"));
    }
    [sum].into_iter().collect()
}

fn id(i: usize) -> String {
    format!("n{i}")
}

/// Edges `i -> j` with `i < j`, so the graph is acyclic by construction
fn dag() -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Vec<usize>)> {
    (1..=MAX_NODES).prop_flat_map(|n| {
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect();
        let count = pairs.len();
        (
            Just(n),
            prop::collection::vec(any::<bool>(), count).prop_map(move |mask| {
                pairs
                    .iter()
                    .zip(mask)
                    .filter_map(|(&pair, keep)| keep.then_some(pair))
                    .collect::<Vec<_>>()
            }),
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
        )
    })
}

fn build<'r>(
    registry: &'r NodeRegistry,
    insertion: &[usize],
    edges: &[(usize, usize)],
) -> Structure<'r> {
    let mut structure = Structure::new(registry);
    for &i in insertion {
        structure.add_node(FunctionNode::new(id(i), "sum"));
    }
    for &(from, to) in edges {
        structure
            .add_connection(&id(from), Connection::new("o", id(to), format!("i{from}")))
            .unwrap();
    }
    structure
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// The order is a permutation of the nodes with producers before consumers.
    #[test]
    fn sort_respects_every_edge((n, edges, insertion) in dag()) {
        let registry = fan_in_registry();
        let structure = build(&registry, &insertion, &edges);

        let graph = to_graph(structure.nodes());
        let order: Vec<&str> = sort(&graph).unwrap().into_iter().map(|node| node.id().as_str()).collect();

        prop_assert_eq!(order.len(), n);
        let unique: HashSet<&str> = order.iter().copied().collect();
        prop_assert_eq!(unique.len(), n);

        for &(from, to) in &edges {
            let (from, to) = (id(from), id(to));
            let p = order.iter().position(|&x| x == from).unwrap();
            let q = order.iter().position(|&x| x == to).unwrap();
            prop_assert!(p < q, "{} must precede {} in {:?}", from, to, order);
        }
    }

    /// Insertion order does not affect the evaluation order.
    #[test]
    fn sort_is_deterministic((_n, edges, insertion) in dag()) {
        let registry = fan_in_registry();
        let shuffled = build(&registry, &insertion, &edges);
        let mut ascending: Vec<usize> = insertion.clone();
        ascending.sort_unstable();
        let ordered = build(&registry, &ascending, &edges);

        let ids = |structure: &Structure<'_>| -> Vec<String> {
            sort(&to_graph(structure.nodes()))
                .unwrap()
                .iter()
                .map(|node| node.id().to_string())
                .collect()
        };
        prop_assert_eq!(ids(&shuffled), ids(&ordered));
    }

    /// Closing any path back to its start is refused and changes nothing.
    #[test]
    fn back_edges_are_rejected((_n, edges, insertion) in dag()) {
        let registry = fan_in_registry();
        let mut structure = build(&registry, &insertion, &edges);

        for &(from, to) in &edges {
            let before = structure.to_records();
            let back = Connection::new("o", id(from), format!("i{to}"));
            prop_assert!(structure.add_connection(&id(to), back).is_err());
            prop_assert_eq!(structure.to_records(), before);
        }
    }

    /// Records survive a JSON round trip in any order.
    #[test]
    fn records_round_trip((_n, edges, insertion) in dag()) {
        let registry = fan_in_registry();
        let structure = build(&registry, &insertion, &edges);

        let json = structure.to_json().unwrap();
        let restored = Structure::from_json(&registry, &json).unwrap();
        prop_assert_eq!(restored.to_records(), structure.to_records());

        let mut reversed = structure.to_records();
        reversed.reverse();
        let restored = Structure::from_records(&registry, &reversed).unwrap();
        prop_assert_eq!(restored.connections().count(), edges.len());
        for node in restored.nodes() {
            let expected = structure.node(node.id().as_str()).unwrap();
            prop_assert_eq!(node.outputs_to(), expected.outputs_to());
            prop_assert_eq!(
                node.as_function().unwrap().incoming_connections(),
                expected.as_function().unwrap().incoming_connections()
            );
        }
    }
}
