//! Whole-graph structural validation, run before a graph is accepted.

use crate::error::GraphError;
use crate::graph::Graph;
use crate::islands::components;
use crate::scheduler::topological_order;
use ahash::AHashSet;
use std::collections::VecDeque;

/// Checks that the graph is acyclic, then that it is weakly connected.
pub fn validate(graph: &Graph) -> Result<(), GraphError> {
    topological_order(graph)?;

    if !is_connected(graph) {
        let components = components(graph, graph.node_ids()).len();
        return Err(GraphError::Disconnected { components });
    }
    Ok(())
}

/// Breadth-first reachability from the first declared node with edges
/// treated as undirected. An empty graph is connected.
pub fn is_connected(graph: &Graph) -> bool {
    let Some(start) = graph.node_ids().next() else {
        return true;
    };

    let mut visited: AHashSet<&str> = AHashSet::with_capacity(graph.len());
    let mut queue = VecDeque::from([start.as_str()]);
    visited.insert(start);

    while let Some(current) = queue.pop_front() {
        for neighbor in graph.undirected_neighbors(current) {
            if visited.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }

    visited.len() == graph.len()
}
