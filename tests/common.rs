//! Common test utilities for building graphs, payloads and run configurations.
use dagflow::prelude::*;

/// Shorthand for a node with no declared inputs.
#[allow(dead_code)]
pub fn node(id: &str, data_out: &[(&str, f64)]) -> Node {
    Node::new(id, DataMap::new(), data_map(data_out.iter().copied()))
}

#[allow(dead_code)]
pub fn edge(src: &str, dst: &str, src_key: &str, dst_key: &str) -> Edge {
    Edge::new(src, dst, KeyMapping::new(src_key, dst_key))
}

/// Builds a graph from `(src, dst)` pairs, every node emitting `v` and every
/// edge mapping `v -> v`. Node ids are declared in `ids` order.
#[allow(dead_code)]
pub fn simple_graph(ids: &[&str], pairs: &[(&str, &str)]) -> Graph {
    let nodes = ids.iter().map(|id| node(id, &[("v", 1.0)])).collect();
    let edges = pairs
        .iter()
        .map(|(src, dst)| edge(src, dst, "v", "v"))
        .collect();
    Graph::new(nodes, edges).expect("Failed to build test graph")
}

/// The three-node chain used throughout the docs:
///
/// `A{out1:10} --out1->in1--> B{out2:20} --out2->out3--> C{out3:30}`
#[allow(dead_code)]
pub const CHAIN_GRAPH_JSON: &str = r#"{
    "name": "chain",
    "description": "A feeds B feeds C",
    "nodes": [
        { "node_id": "A", "data_in": {}, "data_out": { "out1": 10 } },
        { "node_id": "B", "data_in": { "in1": 0 }, "data_out": { "out2": 20 } },
        { "node_id": "C", "data_in": { "in2": 0 }, "data_out": { "out3": 30 } }
    ],
    "edges": [
        { "src_node": "A", "dst_node": "B", "src_to_dst_data_keys": { "out1": "in1" } },
        { "src_node": "B", "dst_node": "C", "src_to_dst_data_keys": { "out2": "out3" } }
    ]
}"#;

/// Two roots feeding the same input key of one sink.
#[allow(dead_code)]
pub const MERGE_GRAPH_JSON: &str = r#"{
    "name": "merge",
    "nodes": [
        { "node_id": "P", "data_out": { "x": 5 } },
        { "node_id": "Q", "data_out": { "y": 7 } },
        { "node_id": "R", "data_out": { "z": 0 } }
    ],
    "edges": [
        { "src_node": "P", "dst_node": "R", "src_to_dst_data_keys": { "x": "z" } },
        { "src_node": "Q", "dst_node": "R", "src_to_dst_data_keys": { "y": "z" } }
    ]
}"#;

/// Diamond: `top` fans out to `left` and `right`, which join in `bottom`.
#[allow(dead_code)]
pub const DIAMOND_GRAPH_JSON: &str = r#"{
    "name": "diamond",
    "nodes": [
        { "node_id": "top", "data_out": { "v": 1 } },
        { "node_id": "left", "data_out": { "v": 10 } },
        { "node_id": "right", "data_out": { "v": 100 } },
        { "node_id": "bottom", "data_out": { "v": 0 } }
    ],
    "edges": [
        { "src_node": "top", "dst_node": "left", "src_to_dst_data_keys": { "v": "v" } },
        { "src_node": "top", "dst_node": "right", "src_to_dst_data_keys": { "v": "v" } },
        { "src_node": "left", "dst_node": "bottom", "src_to_dst_data_keys": { "v": "v" } },
        { "src_node": "right", "dst_node": "bottom", "src_to_dst_data_keys": { "v": "v" } }
    ]
}"#;

#[allow(dead_code)]
pub fn definition(json: &str) -> GraphDefinition {
    GraphDefinition::from_json(json).expect("Failed to parse graph payload")
}

#[allow(dead_code)]
pub fn chain_graph() -> Graph {
    definition(CHAIN_GRAPH_JSON)
        .into_graph()
        .expect("Failed to build chain graph")
}

/// A fresh engine holding one graph; returns the engine and the graph id.
#[allow(dead_code)]
pub fn engine_with(json: &str) -> (Engine, GraphId) {
    let mut engine = Engine::new();
    let id = engine
        .create_graph(definition(json))
        .expect("Failed to create graph");
    (engine, id)
}

#[allow(dead_code)]
pub fn number(map: &DataMap, key: &str) -> f64 {
    map.get(key)
        .and_then(Value::as_number)
        .unwrap_or_else(|| panic!("Expected a number under '{}' in {:?}", key, map))
}
