// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stock shader node types.
//!
//! A small GLSL-flavoured library for material graphs. Callers with their own
//! node library build a [`NodeRegistry`] directly instead.

use crate::node::{NodeCategory, NodeRegistry, NodeTypeDefinition};
use crate::port::PortSpec;

/// Create the stock node registry
pub fn create_stock_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    // ========================================================================
    // Math Nodes
    // ========================================================================

    for (id, op, description) in [
        ("add", "+", "Component-wise sum"),
        ("subtract", "-", "Component-wise difference"),
        ("multiply", "*", "Component-wise product"),
        ("divide", "/", "Component-wise quotient"),
    ] {
        registry.register(
            NodeTypeDefinition::new(id, format!("result = a {op} b;"))
                .with_input(PortSpec::generic("a", "T"))
                .with_input(PortSpec::generic("b", "T"))
                .with_output(PortSpec::generic("result", "T"))
                .with_category(NodeCategory::Math)
                .with_description(description),
        );
    }

    registry.register(
        NodeTypeDefinition::new("scale", "result = value * factor;")
            .with_input(PortSpec::generic("value", "T"))
            .with_input(PortSpec::new("factor", "float"))
            .with_output(PortSpec::generic("result", "T"))
            .with_category(NodeCategory::Math)
            .with_description("Multiply by a scalar"),
    );

    registry.register(
        NodeTypeDefinition::new("mix", "result = mix(a, b, t);")
            .with_input(PortSpec::generic("a", "T"))
            .with_input(PortSpec::generic("b", "T"))
            .with_input(PortSpec::new("t", "float"))
            .with_output(PortSpec::generic("result", "T"))
            .with_category(NodeCategory::Math)
            .with_description("Linear interpolation between a and b"),
    );

    registry.register(
        NodeTypeDefinition::new("saturate", "result = clamp(value, 0.0, 1.0);")
            .with_input(PortSpec::generic("value", "T"))
            .with_output(PortSpec::generic("result", "T"))
            .with_category(NodeCategory::Math)
            .with_description("Clamp to [0, 1]"),
    );

    // ========================================================================
    // Vector Nodes
    // ========================================================================

    registry.register(
        NodeTypeDefinition::new("dot", "result = dot(a, b);")
            .with_input(PortSpec::new("a", "vec3"))
            .with_input(PortSpec::new("b", "vec3"))
            .with_output(PortSpec::new("result", "float"))
            .with_category(NodeCategory::Vector)
            .with_description("Dot product"),
    );

    registry.register(
        NodeTypeDefinition::new("length", "result = length(vector);")
            .with_input(PortSpec::new("vector", "vec3"))
            .with_output(PortSpec::new("result", "float"))
            .with_category(NodeCategory::Vector)
            .with_description("Euclidean length"),
    );

    registry.register(
        NodeTypeDefinition::new("normalize", "result = normalize(vector);")
            .with_input(PortSpec::new("vector", "vec3"))
            .with_output(PortSpec::new("result", "vec3"))
            .with_category(NodeCategory::Vector)
            .with_description("Unit-length vector"),
    );

    registry.register(
        NodeTypeDefinition::new("compose_vec3", "vector = vec3(x, y, z);")
            .with_input(PortSpec::new("x", "float"))
            .with_input(PortSpec::new("y", "float"))
            .with_input(PortSpec::new("z", "float"))
            .with_output(PortSpec::new("vector", "vec3"))
            .with_category(NodeCategory::Vector)
            .with_description("Build a vector from components"),
    );

    registry.register(
        NodeTypeDefinition::new("split_vec3", "x = vector.x;\ny = vector.y;\nz = vector.z;")
            .with_input(PortSpec::new("vector", "vec3"))
            .with_output(PortSpec::new("x", "float"))
            .with_output(PortSpec::new("y", "float"))
            .with_output(PortSpec::new("z", "float"))
            .with_category(NodeCategory::Vector)
            .with_description("Split a vector into components"),
    );

    // ========================================================================
    // Color Nodes
    // ========================================================================

    registry.register(
        NodeTypeDefinition::new(
            "luminance",
            "result = dot(color, vec3(0.2126, 0.7152, 0.0722));",
        )
        .with_input(PortSpec::new("color", "vec3"))
        .with_output(PortSpec::new("result", "float"))
        .with_category(NodeCategory::Color)
        .with_description("Relative luminance of a linear RGB color"),
    );

    registry.register(
        NodeTypeDefinition::new("fragment_output", "frag_color = vec4(color, alpha);")
            .with_input(PortSpec::new("color", "vec3"))
            .with_input(PortSpec::new("alpha", "float"))
            .with_category(NodeCategory::Utility)
            .with_description("Write the final fragment color"),
    );

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_types_are_registered() {
        let registry = create_stock_registry();
        for id in ["add", "mix", "dot", "split_vec3", "luminance", "fragment_output"] {
            assert!(registry.contains(id), "missing {id}");
        }
        assert_eq!(registry.types_in_category(NodeCategory::Math).count(), 7);
    }

    #[test]
    fn bodies_reference_every_port() {
        let registry = create_stock_registry();
        for def in registry.types() {
            for port in def.inputs.iter().chain(&def.outputs) {
                assert!(
                    def.body.contains(&port.name),
                    "{} body does not mention {}",
                    def.id,
                    port.name
                );
            }
        }
    }

    #[test]
    fn registry_survives_json() {
        let registry = create_stock_registry();
        let restored = NodeRegistry::from_json(&registry.to_json().unwrap()).unwrap();
        assert_eq!(restored.len(), registry.len());
        assert_eq!(restored.get("mix"), registry.get("mix"));
    }
}
