//! Entity storage for graphs, run configurations, runs and run outputs.
//!
//! The engine only talks to the [`GraphStore`] trait. [`MemoryStore`] is the
//! in-process implementation; [`snapshot`] persists it to disk.

use crate::error::StoreError;
use crate::graph::{Graph, NodeId};
use crate::run::{Run, RunConfig, RunId, RunOutput};

pub mod memory;
pub mod snapshot;

pub use memory::MemoryStore;

pub type GraphId = u64;
pub type RunConfigId = u64;

/// A stored graph. `name` is unique across the store.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRecord {
    pub id: GraphId,
    pub name: String,
    pub description: String,
    pub graph: Graph,
}

/// A stored run configuration, scoped to one graph.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfigRecord {
    pub id: RunConfigId,
    pub graph_id: GraphId,
    pub config: RunConfig,
}

/// A run and its outputs, staged for a single all-or-nothing commit.
#[derive(Debug, Clone, PartialEq)]
pub struct RunBatch {
    run: Run,
    outputs: Vec<RunOutput>,
}

impl RunBatch {
    pub fn new(run: Run) -> Self {
        Self {
            run,
            outputs: Vec::new(),
        }
    }

    pub fn push(&mut self, output: RunOutput) {
        self.outputs.push(output);
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn outputs(&self) -> &[RunOutput] {
        &self.outputs
    }

    pub fn into_parts(self) -> (Run, Vec<RunOutput>) {
        (self.run, self.outputs)
    }
}

/// CRUD over the persisted entities, with the unique-key constraints the
/// engine relies on:
///
/// * graph names are unique,
/// * run ids are unique,
/// * a run holds at most one output per node.
pub trait GraphStore {
    fn insert_graph(
        &mut self,
        name: &str,
        description: &str,
        graph: Graph,
    ) -> Result<GraphId, StoreError>;

    /// Replaces a graph's name, description and whole node/edge set.
    /// Outputs recorded against the old nodes are dropped.
    fn replace_graph(
        &mut self,
        id: GraphId,
        name: &str,
        description: &str,
        graph: Graph,
    ) -> Result<(), StoreError>;

    /// Deletes a graph with its configurations, runs and outputs.
    fn delete_graph(&mut self, id: GraphId) -> Result<(), StoreError>;

    fn graph(&self, id: GraphId) -> Result<&GraphRecord, StoreError>;

    fn graph_ids(&self) -> Vec<GraphId>;

    fn insert_run_config(
        &mut self,
        graph_id: GraphId,
        config: RunConfig,
    ) -> Result<RunConfigId, StoreError>;

    fn run_config(&self, id: RunConfigId) -> Result<&RunConfigRecord, StoreError>;

    /// The most recently created configuration of a graph, if any.
    fn latest_run_config(&self, graph_id: GraphId)
    -> Result<Option<&RunConfigRecord>, StoreError>;

    fn insert_run(&mut self, run: Run) -> Result<(), StoreError>;

    fn insert_run_output(&mut self, output: RunOutput) -> Result<(), StoreError>;

    /// Stores a run and all of its outputs, or nothing if any constraint fails.
    fn commit_batch(&mut self, batch: RunBatch) -> Result<(), StoreError>;

    fn run(&self, run_id: &RunId) -> Result<&Run, StoreError>;

    /// Outputs of a run in the order they were recorded.
    fn run_outputs(&self, run_id: &RunId) -> Result<Vec<&RunOutput>, StoreError>;

    fn run_output(&self, run_id: &RunId, node_id: &str) -> Result<&RunOutput, StoreError> {
        self.run_outputs(run_id)?
            .into_iter()
            .find(|output| output.node_id == node_id)
            .ok_or_else(|| StoreError::RunOutputNotFound {
                run_id: *run_id,
                node_id: NodeId::from(node_id),
            })
    }

    /// The graph a run was executed against.
    fn graph_of_run(&self, run_id: &RunId) -> Result<&GraphRecord, StoreError> {
        let run = self.run(run_id)?;
        let config = self.run_config(run.config_id)?;
        self.graph(config.graph_id)
    }
}
