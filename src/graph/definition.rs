use super::{Edge, Graph, Node, NodeId};
use crate::error::ValidationError;
use crate::value::DataMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The submitted JSON shape of a graph.
///
/// ```json
/// {
///   "name": "pricing",
///   "description": "optional",
///   "nodes": [{ "node_id": "A", "data_in": {}, "data_out": { "out1": 10 } }],
///   "edges": [{ "src_node": "A", "dst_node": "B", "src_to_dst_data_keys": { "out1": "in1" } }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub nodes: Vec<NodeDefinition>,
    pub edges: Vec<EdgeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub node_id: NodeId,
    #[serde(default)]
    pub data_in: DataMap,
    #[serde(default)]
    pub data_out: DataMap,
}

/// Edge payload. The key mapping is an open JSON object on the wire and is
/// narrowed to exactly one entry when the graph is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDefinition {
    pub src_node: NodeId,
    pub dst_node: NodeId,
    #[serde(default)]
    pub src_to_dst_data_keys: BTreeMap<String, String>,
}

const REQUIRED_GRAPH_FIELDS: [&str; 3] = ["name", "nodes", "edges"];

impl GraphDefinition {
    /// Parses a graph payload, reporting absent top-level fields by name.
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        let raw: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ValidationError::Json(e.to_string()))?;
        if let Some(field) = REQUIRED_GRAPH_FIELDS
            .iter()
            .find(|field| raw.get(**field).is_none())
        {
            return Err(ValidationError::MissingField(field.to_string()));
        }
        serde_json::from_value(raw).map_err(|e| ValidationError::Json(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ValidationError> {
        serde_json::to_string_pretty(self).map_err(|e| ValidationError::Json(e.to_string()))
    }
}

impl From<&Node> for NodeDefinition {
    fn from(node: &Node) -> Self {
        Self {
            node_id: node.node_id.clone(),
            data_in: node.data_in.clone(),
            data_out: node.data_out.clone(),
        }
    }
}

impl From<&Edge> for EdgeDefinition {
    fn from(edge: &Edge) -> Self {
        Self {
            src_node: edge.src.clone(),
            dst_node: edge.dst.clone(),
            src_to_dst_data_keys: BTreeMap::from([(
                edge.keys.src_key.clone(),
                edge.keys.dst_key.clone(),
            )]),
        }
    }
}

/// Read-side projection of a stored graph: every node lists the edges that
/// enter (`paths_in`) and leave (`paths_out`) it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphView {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub node_id: NodeId,
    pub data_in: DataMap,
    pub data_out: DataMap,
    pub paths_in: Vec<EdgeDefinition>,
    pub paths_out: Vec<EdgeDefinition>,
}

impl GraphView {
    pub fn new(id: u64, name: &str, description: &str, graph: &Graph) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| NodeView {
                node_id: node.node_id.clone(),
                data_in: node.data_in.clone(),
                data_out: node.data_out.clone(),
                paths_in: graph
                    .incoming_edges(&node.node_id)
                    .map(EdgeDefinition::from)
                    .collect(),
                paths_out: graph
                    .outgoing_edges(&node.node_id)
                    .map(EdgeDefinition::from)
                    .collect(),
            })
            .collect();

        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            nodes,
            edges: graph.edges().iter().map(EdgeDefinition::from).collect(),
        }
    }
}
