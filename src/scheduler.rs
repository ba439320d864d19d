//! Topological scheduling and level-wise stratification.
//!
//! Both operations are pure functions over a borrowed [`Graph`]; nothing is
//! cached between calls, so a graph that changes between requests is always
//! scheduled from scratch.

use crate::error::GraphError;
use crate::graph::{Graph, NodeId};
use ahash::AHashMap;
use std::collections::{BTreeMap, VecDeque};

/// Node ids grouped by level, ascending. Within a level, ids keep their
/// topological order.
pub type Levels = BTreeMap<usize, Vec<NodeId>>;

/// A complete schedule: the execution order and its level grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub order: Vec<NodeId>,
    pub levels: Levels,
}

impl Schedule {
    pub fn for_graph(graph: &Graph) -> Result<Self, GraphError> {
        let order = topological_order(graph)?;
        let levels = levels_from_order(graph, &order);
        Ok(Self { order, levels })
    }

    /// Number of levels, i.e. the longest root-to-node path plus one.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }
}

/// Orders every node so that each edge's source precedes its destination
/// (Kahn's algorithm).
///
/// Zero in-degree nodes are seeded in declaration order and released in FIFO
/// order, successors in edge declaration order. If any node is left over the
/// graph has a cycle and no partial order is returned.
pub fn topological_order(graph: &Graph) -> Result<Vec<NodeId>, GraphError> {
    let mut in_degree: Vec<usize> = graph
        .node_ids()
        .map(|id| graph.in_degree(id))
        .collect();

    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, degree)| *degree == 0)
        .map(|(i, _)| i)
        .collect();

    let nodes = graph.nodes();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(current) = queue.pop_front() {
        let node_id = &nodes[current].node_id;
        order.push(node_id.clone());

        for successor in graph.successors(node_id) {
            let Some(idx) = graph.position(successor) else {
                continue;
            };
            in_degree[idx] -= 1;
            if in_degree[idx] == 0 {
                queue.push_back(idx);
            }
        }
    }

    if order.len() != nodes.len() {
        let cyclic: Vec<NodeId> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, degree)| *degree > 0)
            .map(|(i, _)| nodes[i].node_id.clone())
            .collect();
        tracing::warn!(
            scheduled = order.len(),
            total = nodes.len(),
            "topological sort stalled on a cycle"
        );
        return Err(GraphError::CycleDetected { nodes: cyclic });
    }

    Ok(order)
}

/// Groups nodes by level: 0 for roots, otherwise one more than the deepest
/// direct predecessor.
pub fn levels(graph: &Graph) -> Result<Levels, GraphError> {
    let order = topological_order(graph)?;
    Ok(levels_from_order(graph, &order))
}

/// Level grouping over an order already known to be topological.
///
/// The order must come from [`topological_order`] on the same graph; on
/// anything else predecessors may not have a level yet and the result is
/// meaningless.
pub fn levels_from_order(graph: &Graph, order: &[NodeId]) -> Levels {
    let mut node_levels: AHashMap<&str, usize> = AHashMap::with_capacity(order.len());
    let mut levels = Levels::new();

    for node_id in order {
        let level = graph
            .predecessors(node_id)
            .filter_map(|pred| node_levels.get(pred.as_str()))
            .max()
            .map_or(0, |deepest| deepest + 1);
        node_levels.insert(node_id.as_str(), level);
        levels.entry(level).or_default().push(node_id.clone());
    }

    levels
}
