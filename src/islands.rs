//! Connected components ("islands") over an enabled subset of a graph.
//!
//! This is a reporting view: several islands are a valid outcome here, unlike
//! whole-graph validation where they reject the graph.

use crate::graph::{Graph, NodeId};
use crate::run::EnabledSet;
use ahash::AHashSet;
use std::collections::VecDeque;

/// Islands of the nodes a run configuration enables.
///
/// Only edges with both endpoints enabled are kept, and direction is ignored.
/// Components are listed in the order their first node is declared, members in
/// breadth-first discovery order. A node with no retained edge is its own
/// singleton island.
pub fn islands(graph: &Graph, enabled: &EnabledSet) -> Vec<Vec<NodeId>> {
    components(graph, graph.node_ids().filter(|id| enabled.contains(id)))
}

/// Undirected components of the induced subgraph over `members`.
pub(crate) fn components<'g>(
    graph: &'g Graph,
    members: impl IntoIterator<Item = &'g NodeId>,
) -> Vec<Vec<NodeId>> {
    let members: Vec<&str> = members.into_iter().map(String::as_str).collect();
    let subset: AHashSet<&str> = members.iter().copied().collect();
    let mut visited: AHashSet<&str> = AHashSet::with_capacity(subset.len());
    let mut islands = Vec::new();

    for start in members {
        if !visited.insert(start) {
            continue;
        }

        let mut island = vec![start.to_string()];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for neighbor in graph.undirected_neighbors(current) {
                let neighbor = neighbor.as_str();
                if subset.contains(neighbor) && visited.insert(neighbor) {
                    island.push(neighbor.to_string());
                    queue.push_back(neighbor);
                }
            }
        }
        islands.push(island);
    }

    islands
}
