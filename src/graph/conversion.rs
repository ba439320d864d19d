use super::{Edge, EdgeDefinition, Graph, GraphDefinition, KeyMapping, Node, NodeDefinition};
use crate::error::ValidationError;

/// A trait for payloads that can be turned into a validated [`Graph`].
///
/// Implement it on your own request or file format to feed the engine
/// without going through [`GraphDefinition`].
///
/// # Example
///
/// ```rust
/// use dagflow::prelude::*;
/// use dagflow::error::ValidationError;
///
/// struct Chain(Vec<&'static str>);
///
/// impl IntoGraph for Chain {
///     fn into_graph(self) -> std::result::Result<Graph, ValidationError> {
///         let nodes = self
///             .0
///             .iter()
///             .map(|id| Node::new(*id, DataMap::new(), data_map([("v", 1.0)])))
///             .collect();
///         let edges = self
///             .0
///             .windows(2)
///             .map(|pair| Edge::new(pair[0], pair[1], KeyMapping::new("v", "v")))
///             .collect();
///         Graph::new(nodes, edges)
///     }
/// }
///
/// let graph = Chain(vec!["a", "b", "c"]).into_graph().unwrap();
/// assert_eq!(graph.len(), 3);
/// ```
pub trait IntoGraph {
    /// Consumes the payload and builds the graph, rejecting malformed input.
    fn into_graph(self) -> Result<Graph, ValidationError>;
}

impl IntoGraph for Graph {
    fn into_graph(self) -> Result<Graph, ValidationError> {
        Ok(self)
    }
}

impl IntoGraph for GraphDefinition {
    fn into_graph(self) -> Result<Graph, ValidationError> {
        let nodes = self.nodes.into_iter().map(Node::from).collect();
        let edges = self
            .edges
            .into_iter()
            .map(Edge::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Graph::new(nodes, edges)
    }
}

impl IntoGraph for &GraphDefinition {
    fn into_graph(self) -> Result<Graph, ValidationError> {
        self.clone().into_graph()
    }
}

impl From<NodeDefinition> for Node {
    fn from(def: NodeDefinition) -> Self {
        Node::new(def.node_id, def.data_in, def.data_out)
    }
}

impl TryFrom<EdgeDefinition> for Edge {
    type Error = ValidationError;

    fn try_from(def: EdgeDefinition) -> Result<Self, Self::Error> {
        let found = def.src_to_dst_data_keys.len();
        let mut entries = def.src_to_dst_data_keys.into_iter();
        match (entries.next(), found) {
            (Some((src_key, dst_key)), 1) => Ok(Edge::new(
                def.src_node,
                def.dst_node,
                KeyMapping::new(src_key, dst_key),
            )),
            _ => Err(ValidationError::InvalidKeyMapping {
                src: def.src_node,
                dst: def.dst_node,
                found,
            }),
        }
    }
}

impl Graph {
    /// Projects the graph back into its payload shape.
    pub fn to_definition(&self, name: &str, description: &str) -> GraphDefinition {
        GraphDefinition {
            name: name.to_string(),
            description: description.to_string(),
            nodes: self.nodes().iter().map(NodeDefinition::from).collect(),
            edges: self.edges().iter().map(EdgeDefinition::from).collect(),
        }
    }
}
