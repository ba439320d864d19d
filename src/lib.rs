//! # dagflow - DAG Execution Engine
//!
//! **dagflow** stores directed acyclic graphs of data-transforming nodes and
//! executes them. Every node declares named output defaults; every edge carries
//! one value from a source node's output key to a destination node's input key.
//! A run computes each enabled node in topological order and records its
//! output, so results can be looked up per run and per node afterwards.
//!
//! ## Core Workflow
//!
//! 1.  **Describe the graph**: Parse a JSON payload into a `GraphDefinition`, or implement
//!     `IntoGraph` on your own format.
//! 2.  **Create it**: `Engine::create_graph` validates the payload, rejects cycles and
//!     disconnected graphs, and stores it.
//! 3.  **Run it**: `Engine::run_graph` takes a `RunConfig` with root inputs, overwrites and an
//!     optional enable or disable list, and returns the run id.
//! 4.  **Read results**: `Engine::run_output` and `Engine::leaf_outputs` return what each node
//!     recorded during the run.
//!
//! Scheduling is exposed on its own as well: `scheduler::topological_order`,
//! `scheduler::levels` and `islands::islands` are pure functions over a [`graph::Graph`].
//!
//! ## Quick Start
//!
//! ```rust
//! use dagflow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let definition = GraphDefinition::from_json(
//!         r#"{
//!             "name": "pricing",
//!             "nodes": [
//!                 { "node_id": "A", "data_out": { "out1": 10 } },
//!                 { "node_id": "B", "data_in": { "in1": 0 }, "data_out": { "out2": 20 } },
//!                 { "node_id": "C", "data_out": { "out3": 30 } }
//!             ],
//!             "edges": [
//!                 { "src_node": "A", "dst_node": "B", "src_to_dst_data_keys": { "out1": "in1" } },
//!                 { "src_node": "B", "dst_node": "C", "src_to_dst_data_keys": { "out2": "out3" } }
//!             ]
//!         }"#,
//!     )?;
//!
//!     let mut engine = Engine::new();
//!     let graph_id = engine.create_graph(definition)?;
//!
//!     let config = RunConfig::default().with_root_input("A", data_map([("out1", 100.0)]));
//!     let run_id = engine.run_graph(graph_id, config)?;
//!
//!     // C's declared default 30 is shifted by the value B forwards into it.
//!     let c = engine.run_output(&run_id, "C")?;
//!     assert_eq!(c.data_out["out3"], Value::from(50.0));
//!
//!     let leaves: Vec<_> = engine.leaf_outputs(&run_id)?.iter().map(|o| o.node_id.clone()).collect();
//!     assert_eq!(leaves, vec!["C".to_string()]);
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod graph;
pub mod islands;
pub mod prelude;
pub mod run;
pub mod scheduler;
pub mod store;
pub mod trace;
pub mod validation;
pub mod value;
