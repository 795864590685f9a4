// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port declarations for node type inputs/outputs.

use serde::{Deserialize, Serialize};

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Input => "input",
            Self::Output => "output",
        })
    }
}

/// A declared input or output slot of a node type.
///
/// Types are opaque strings (`"float"`, `"vec3"`, ...). For a generic port the
/// `data_type` is a symbol (`"T"`) shared by every port of the node that must
/// resolve to the same concrete type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port name, also the free identifier used in the body template
    pub name: String,
    /// Concrete type, or the type variable for generic ports
    #[serde(rename = "type")]
    pub data_type: String,
    /// Whether the type is resolved per node instance
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub generic: bool,
}

impl PortSpec {
    /// Create a port with a fixed type
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            generic: false,
        }
    }

    /// Create a generic port bound to the type variable `symbol`
    pub fn generic(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: symbol.into(),
            generic: true,
        }
    }

    /// The generic symbol of this port, if any
    pub fn symbol(&self) -> Option<&str> {
        self.generic.then_some(self.data_type.as_str())
    }
}

/// Type of a port as seen on a particular node instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortType<'a> {
    /// Fixed or already-resolved type
    Concrete(&'a str),
    /// Generic port whose symbol has not been bound yet
    Unresolved {
        /// The type variable
        symbol: &'a str,
    },
}

impl<'a> PortType<'a> {
    /// The concrete type, if known
    pub fn concrete(&self) -> Option<&'a str> {
        match self {
            Self::Concrete(ty) => Some(*ty),
            Self::Unresolved { .. } => None,
        }
    }
}

impl std::fmt::Display for PortType<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Concrete(ty) => f.write_str(ty),
            Self::Unresolved { symbol } => write!(f, "unresolved {symbol}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_flag_defaults_to_false() {
        let port: PortSpec = serde_json::from_str(r#"{"name":"x","type":"float"}"#).unwrap();
        assert_eq!(port, PortSpec::new("x", "float"));
        assert_eq!(port.symbol(), None);
    }

    #[test]
    fn generic_port_exposes_symbol() {
        let port = PortSpec::generic("a", "T");
        assert_eq!(port.symbol(), Some("T"));
        let json = serde_json::to_string(&port).unwrap();
        assert_eq!(json, r#"{"name":"a","type":"T","generic":true}"#);
    }

    #[test]
    fn port_type_exposes_concrete_only() {
        assert_eq!(PortType::Concrete("vec3").concrete(), Some("vec3"));
        assert_eq!(PortType::Unresolved { symbol: "T" }.concrete(), None);
        assert_eq!(PortType::Unresolved { symbol: "T" }.to_string(), "unresolved T");
    }
}
