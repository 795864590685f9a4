// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flat, serializable node records.
//!
//! A structure is exchanged as an unordered list of [`NodeRecord`]s. Source
//! nodes are recognised by the reserved type [`EXTERNAL_TYPE`]; anything else
//! is a function node whose `type` names a registry entry.

use crate::connection::Connection;
use crate::node::{ExternalInput, ExternalSource, FunctionNode, Node, NodeId, SourceNode};
use serde::{Deserialize, Serialize};

/// Type discriminator of source node records
pub const EXTERNAL_TYPE: &str = "external";

/// Serialized form of a [`Node`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Node ID
    pub id: NodeId,
    /// Registry type, or [`EXTERNAL_TYPE`]
    #[serde(rename = "type")]
    pub node_type: String,
    /// Source payload, required for external nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalSource>,
    /// Inputs bound to expressions (function nodes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_inputs: Option<Vec<ExternalInput>>,
    /// Outgoing connections
    #[serde(default)]
    pub outputs_to: Vec<Connection>,
}

impl NodeRecord {
    /// Whether the record describes a source node
    pub fn is_external(&self) -> bool {
        self.node_type == EXTERNAL_TYPE
    }
}

/// Error when reading node records
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// External record without a payload
    #[error("external node {0} has no \"external\" payload")]
    MissingExternal(NodeId),

    /// Malformed JSON
    #[error("invalid node records: {0}")]
    Json(#[from] serde_json::Error),
}

impl Node {
    /// Build an unconnected node from a record.
    ///
    /// The record's `outputsTo` is not applied; connections are replayed by
    /// [`Structure::from_records`](crate::Structure::from_records) so they are
    /// validated.
    pub fn from_record(record: &NodeRecord) -> Result<Self, RecordError> {
        if record.is_external() {
            let external = record
                .external
                .clone()
                .ok_or_else(|| RecordError::MissingExternal(record.id.clone()))?;
            return Ok(Self::Source(SourceNode {
                id: record.id.clone(),
                external,
                outputs_to: Vec::new(),
            }));
        }

        let mut node = FunctionNode::new(record.id.clone(), record.node_type.clone());
        node.external_inputs = record.external_inputs.clone().unwrap_or_default();
        Ok(Self::Function(node))
    }

    /// Serialize this node
    pub fn to_record(&self) -> NodeRecord {
        match self {
            Self::Function(node) => NodeRecord {
                id: node.id.clone(),
                node_type: node.node_type.clone(),
                external: None,
                external_inputs: (!node.external_inputs.is_empty())
                    .then(|| node.external_inputs.clone()),
                outputs_to: node.outputs_to.clone(),
            },
            Self::Source(node) => NodeRecord {
                id: node.id.clone(),
                node_type: EXTERNAL_TYPE.to_string(),
                external: Some(node.external.clone()),
                external_inputs: None,
                outputs_to: node.outputs_to.clone(),
            },
        }
    }
}

/// Parse a JSON array of node records
pub fn parse_records(json: &str) -> Result<Vec<NodeRecord>, RecordError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminates_on_external_type() {
        let records = parse_records(
            r#"[
                {"id": "A", "type": "external", "external": {"dataType": "float"},
                 "outputsTo": [{"output": "value", "to": "B", "input": "x"}]},
                {"id": "B", "type": "double",
                 "externalInputs": [{"name": "bias", "external": "u_bias"}],
                 "outputsTo": []}
            ]"#,
        )
        .unwrap();

        let a = Node::from_record(&records[0]).unwrap();
        let b = Node::from_record(&records[1]).unwrap();
        assert!(matches!(&a, Node::Source(s) if s.data_type() == "float"));
        assert!(a.outputs_to().is_empty());
        let b = b.as_function().unwrap();
        assert_eq!(b.node_type(), "double");
        assert_eq!(b.external_input("bias"), Some("u_bias"));
    }

    #[test]
    fn external_without_payload_is_rejected() {
        let records = parse_records(r#"[{"id": "A", "type": "external"}]"#).unwrap();
        let err = Node::from_record(&records[0]).unwrap_err();
        assert!(matches!(err, RecordError::MissingExternal(id) if id.as_str() == "A"));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let node: Node = FunctionNode::new("B", "double").into();
        let json = serde_json::to_string(&node.to_record()).unwrap();
        assert_eq!(json, r#"{"id":"B","type":"double","outputsTo":[]}"#);
    }
}
