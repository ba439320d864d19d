//! In-memory graph model: nodes, edges and the structural queries the
//! scheduler, the executor and the island finder run against.

use crate::error::ValidationError;
use crate::value::DataMap;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;

pub mod conversion;
pub mod definition;

pub use conversion::*;
pub use definition::*;

/// Node identifier, unique within one graph.
pub type NodeId = String;

/// A computation node. `data_out` holds the declared output defaults;
/// `data_in` is descriptive metadata and is never enforced at run time.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub node_id: NodeId,
    pub data_in: DataMap,
    pub data_out: DataMap,
}

impl Node {
    pub fn new(node_id: impl Into<NodeId>, data_in: DataMap, data_out: DataMap) -> Self {
        Self {
            node_id: node_id.into(),
            data_in,
            data_out,
        }
    }
}

/// The single source-output-key to destination-input-key pair an edge carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyMapping {
    pub src_key: String,
    pub dst_key: String,
}

impl KeyMapping {
    pub fn new(src_key: impl Into<String>, dst_key: impl Into<String>) -> Self {
        Self {
            src_key: src_key.into(),
            dst_key: dst_key.into(),
        }
    }
}

/// A directed edge between two nodes of the same graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub src: NodeId,
    pub dst: NodeId,
    pub keys: KeyMapping,
}

impl Edge {
    pub fn new(src: impl Into<NodeId>, dst: impl Into<NodeId>, keys: KeyMapping) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            keys,
        }
    }
}

/// A validated node/edge set with adjacency indexes.
///
/// Construction guarantees unique node ids, edges that only reference known
/// nodes and unique `(src, dst, mapping)` triples. Acyclicity and connectivity
/// are checked separately by [`crate::validation::validate`].
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: AHashMap<NodeId, usize>,
    /// Edge indices keyed by source node position.
    outgoing: Vec<Vec<usize>>,
    /// Edge indices keyed by destination node position.
    incoming: Vec<Vec<usize>>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, ValidationError> {
        let duplicates: Vec<String> = nodes
            .iter()
            .map(|n| n.node_id.clone())
            .duplicates()
            .collect();
        if !duplicates.is_empty() {
            return Err(ValidationError::DuplicateNodeIds(duplicates));
        }

        let index: AHashMap<NodeId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.node_id.clone(), i))
            .collect();

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];
        let mut seen: AHashSet<&Edge> = AHashSet::with_capacity(edges.len());

        for (edge_idx, edge) in edges.iter().enumerate() {
            let (Some(&src), Some(&dst)) = (index.get(&edge.src), index.get(&edge.dst)) else {
                return Err(ValidationError::UnknownEdgeNode {
                    src: edge.src.clone(),
                    dst: edge.dst.clone(),
                });
            };
            if !seen.insert(edge) {
                return Err(ValidationError::DuplicateEdge {
                    src: edge.src.clone(),
                    dst: edge.dst.clone(),
                    src_key: edge.keys.src_key.clone(),
                    dst_key: edge.keys.dst_key.clone(),
                });
            }
            outgoing[src].push(edge_idx);
            incoming[dst].push(edge_idx);
        }

        Ok(Self {
            nodes,
            edges,
            index,
            outgoing,
            incoming,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in declaration order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| &n.node_id)
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.index.get(node_id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.index.contains_key(node_id)
    }

    /// Declaration position of a node.
    pub fn position(&self, node_id: &str) -> Option<usize> {
        self.index.get(node_id).copied()
    }

    pub fn incoming_edges(&self, node_id: &str) -> impl Iterator<Item = &Edge> {
        self.edge_list(&self.incoming, node_id)
    }

    pub fn outgoing_edges(&self, node_id: &str) -> impl Iterator<Item = &Edge> {
        self.edge_list(&self.outgoing, node_id)
    }

    fn edge_list<'a>(
        &'a self,
        adjacency: &'a [Vec<usize>],
        node_id: &str,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        self.index
            .get(node_id)
            .into_iter()
            .flat_map(move |&i| adjacency[i].iter().map(move |&e| &self.edges[e]))
    }

    pub fn in_degree(&self, node_id: &str) -> usize {
        self.position(node_id).map_or(0, |i| self.incoming[i].len())
    }

    pub fn out_degree(&self, node_id: &str) -> usize {
        self.position(node_id).map_or(0, |i| self.outgoing[i].len())
    }

    /// A root has no incoming edges in the full graph, whatever a run enables.
    pub fn is_root(&self, node_id: &str) -> bool {
        self.in_degree(node_id) == 0
    }

    /// A leaf has no outgoing edges.
    pub fn is_leaf(&self, node_id: &str) -> bool {
        self.out_degree(node_id) == 0
    }

    pub fn roots(&self) -> impl Iterator<Item = &NodeId> {
        self.node_ids().filter(move |id| self.is_root(id))
    }

    pub fn leaves(&self) -> impl Iterator<Item = &NodeId> {
        self.node_ids().filter(move |id| self.is_leaf(id))
    }

    /// Direct predecessors, one entry per incoming edge.
    pub fn predecessors(&self, node_id: &str) -> impl Iterator<Item = &NodeId> {
        self.incoming_edges(node_id).map(|e| &e.src)
    }

    pub fn successors(&self, node_id: &str) -> impl Iterator<Item = &NodeId> {
        self.outgoing_edges(node_id).map(|e| &e.dst)
    }

    /// Neighbours with edge direction ignored: successors first, then predecessors.
    pub fn undirected_neighbors(&self, node_id: &str) -> impl Iterator<Item = &NodeId> {
        self.successors(node_id).chain(self.predecessors(node_id))
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.edges == other.edges
    }
}
