//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the dagflow crate.
//! Import it to build graphs, run them and read their outputs without importing each
//! type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use dagflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let payload = std::fs::read_to_string("path/to/graph.json")?;
//! let definition = GraphDefinition::from_json(&payload)?;
//!
//! let mut engine = Engine::new();
//! let graph_id = engine.create_graph(definition)?;
//! let report = engine.run_graph_with_report(graph_id, RunConfig::default())?;
//!
//! println!("{}", TraceFormatter::format_run(&report));
//! # Ok(())
//! # }
//! ```

// Engine facade and storage
pub use crate::engine::{Engine, EngineBuilder};
pub use crate::store::{GraphId, GraphStore, MemoryStore, RunConfigId};

// Graph model
pub use crate::graph::{
    Edge, Graph, GraphDefinition, GraphView, IntoGraph, KeyMapping, Node, NodeId,
};
pub use crate::value::{DataMap, Value, data_map};

// Runs
pub use crate::run::{CommitMode, EnabledSet, RunConfig, RunExecutor, RunId, RunOutput, RunReport};
pub use crate::scheduler::{Levels, levels, topological_order};

// Error types
pub use crate::error::{EngineError, ExecutionError, GraphError, StoreError, ValidationError};

// Trace formatting
pub use crate::trace::TraceFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
