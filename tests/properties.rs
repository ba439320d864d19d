//! Property tests for scheduling, validation and island discovery over
//! randomly generated DAGs.
use dagflow::islands::islands;
use dagflow::prelude::*;
use dagflow::validation::{is_connected, validate};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// Node count and forward edges `(i, j)` with `i < j`, so the graph is acyclic.
fn dag_shape() -> impl Strategy<Value = (usize, BTreeSet<(usize, usize)>, bool)> {
    (1usize..14).prop_flat_map(|n| {
        let pairs = prop::collection::vec((0..n, 0..n), 0..40).prop_map(|pairs| {
            pairs
                .into_iter()
                .filter(|(a, b)| a != b)
                .map(|(a, b)| (a.min(b), a.max(b)))
                .collect::<BTreeSet<_>>()
        });
        (Just(n), pairs, any::<bool>())
    })
}

fn id(i: usize) -> String {
    format!("n{}", i)
}

/// `reversed` flips the declaration order so ties are not trivially sorted.
fn build(n: usize, pairs: &BTreeSet<(usize, usize)>, reversed: bool) -> Graph {
    let mut indices: Vec<usize> = (0..n).collect();
    if reversed {
        indices.reverse();
    }
    let nodes = indices
        .into_iter()
        .map(|i| Node::new(id(i), DataMap::new(), data_map([("v", i as f64)])))
        .collect();
    let edges = pairs
        .iter()
        .map(|&(a, b)| Edge::new(id(a), id(b), KeyMapping::new("v", "v")))
        .collect();
    Graph::new(nodes, edges).expect("Generated graph should be well-formed")
}

proptest! {
    #[test]
    fn prop_order_is_a_permutation_respecting_edges((n, pairs, reversed) in dag_shape()) {
        let graph = build(n, &pairs, reversed);
        let order = topological_order(&graph).unwrap();

        prop_assert_eq!(order.len(), n);
        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        prop_assert_eq!(position.len(), n);
        for edge in graph.edges() {
            prop_assert!(position[edge.src.as_str()] < position[edge.dst.as_str()]);
        }
    }

    #[test]
    fn prop_level_zero_is_exactly_the_roots((n, pairs, reversed) in dag_shape()) {
        let graph = build(n, &pairs, reversed);
        let levels = levels(&graph).unwrap();

        let level_zero: BTreeSet<&str> = levels[&0].iter().map(String::as_str).collect();
        let roots: BTreeSet<&str> = graph.roots().map(String::as_str).collect();
        prop_assert_eq!(level_zero, roots);
    }

    #[test]
    fn prop_level_is_one_past_deepest_predecessor((n, pairs, reversed) in dag_shape()) {
        let graph = build(n, &pairs, reversed);
        let levels = levels(&graph).unwrap();
        let level_of: HashMap<&str, usize> = levels
            .iter()
            .flat_map(|(level, ids)| ids.iter().map(move |id| (id.as_str(), *level)))
            .collect();

        prop_assert_eq!(level_of.len(), n);
        for node_id in graph.node_ids() {
            let expected = graph
                .predecessors(node_id)
                .map(|pred| level_of[pred.as_str()] + 1)
                .max()
                .unwrap_or(0);
            prop_assert_eq!(level_of[node_id.as_str()], expected);
        }
    }

    #[test]
    fn prop_back_edge_creates_a_cycle((n, pairs, reversed) in dag_shape()) {
        prop_assume!(!pairs.is_empty());
        let mut with_back_edge = pairs.clone();
        let &(a, b) = pairs.iter().next().unwrap();
        with_back_edge.insert((b, a));

        let graph = build(n, &with_back_edge, reversed);
        let is_cycle = matches!(
            topological_order(&graph),
            Err(GraphError::CycleDetected { .. })
        );
        prop_assert!(is_cycle);
        prop_assert!(validate(&graph).is_err());
    }

    #[test]
    fn prop_islands_partition_the_graph((n, pairs, reversed) in dag_shape()) {
        let graph = build(n, &pairs, reversed);
        let found = islands(&graph, &EnabledSet::all(&graph));

        let members: BTreeSet<&str> = found.iter().flatten().map(String::as_str).collect();
        prop_assert_eq!(found.iter().map(Vec::len).sum::<usize>(), n);
        prop_assert_eq!(members.len(), n);
        prop_assert_eq!(found.len() == 1, is_connected(&graph));

        for edge in graph.edges() {
            let home = found.iter().position(|island| island.contains(&edge.src));
            let away = found.iter().position(|island| island.contains(&edge.dst));
            prop_assert_eq!(home, away);
        }
    }

    #[test]
    fn prop_definition_round_trip((n, pairs, reversed) in dag_shape()) {
        let graph = build(n, &pairs, reversed);
        let json = graph.to_definition("generated", "").to_json().unwrap();
        let restored = GraphDefinition::from_json(&json).unwrap().into_graph().unwrap();
        prop_assert_eq!(restored, graph);
    }
}
