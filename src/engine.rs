//! The request-level facade over a [`GraphStore`].
//!
//! Every operation here is all-or-nothing with respect to the store: payloads
//! and graphs are validated before the first write.

use crate::error::{EngineError, StoreError};
use crate::graph::{Graph, GraphDefinition, GraphView, IntoGraph, NodeId};
use crate::islands;
use crate::run::{CommitMode, ExecutorOptions, RunConfig, RunExecutor, RunId, RunOutput, RunReport};
use crate::scheduler::{self, Levels};
use crate::store::{GraphId, GraphRecord, GraphStore, MemoryStore, RunConfigId};
use crate::validation;

/// Owns a store and runs graphs against it.
pub struct Engine<S: GraphStore = MemoryStore> {
    store: S,
    options: ExecutorOptions,
}

/// Builder for [`Engine`].
pub struct EngineBuilder<S: GraphStore> {
    store: S,
    options: ExecutorOptions,
}

impl<S: GraphStore> EngineBuilder<S> {
    /// Chooses how run records reach the store. Defaults to [`CommitMode::Atomic`].
    pub fn commit_mode(mut self, mode: CommitMode) -> Self {
        self.options.commit_mode = mode;
        self
    }

    pub fn build(self) -> Engine<S> {
        Engine {
            store: self.store,
            options: self.options,
        }
    }
}

impl Engine<MemoryStore> {
    /// An engine over an empty [`MemoryStore`] with default options.
    pub fn new() -> Self {
        Engine::builder(MemoryStore::new()).build()
    }
}

impl Default for Engine<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphStore> Engine<S> {
    pub fn builder(store: S) -> EngineBuilder<S> {
        EngineBuilder {
            store,
            options: ExecutorOptions::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn commit_mode(&self) -> CommitMode {
        self.options.commit_mode
    }

    /// Validates a graph payload and stores it under its name.
    pub fn create_graph(&mut self, definition: GraphDefinition) -> Result<GraphId, EngineError> {
        let name = definition.name.clone();
        let description = definition.description.clone();
        self.create_graph_from(&name, &description, definition)
    }

    /// Stores any [`IntoGraph`] payload under `name`, after the same checks
    /// as [`Engine::create_graph`].
    pub fn create_graph_from(
        &mut self,
        name: &str,
        description: &str,
        payload: impl IntoGraph,
    ) -> Result<GraphId, EngineError> {
        let graph = accept(name, payload)?;
        let nodes = graph.len();
        let id = self.store.insert_graph(name, description, graph)?;
        tracing::info!(graph_id = id, graph = %name, nodes, "graph created");
        Ok(id)
    }

    /// Replaces a stored graph wholesale. Outputs of earlier runs are dropped,
    /// unless the definition matches what is already stored, in which case
    /// nothing is touched.
    pub fn update_graph(
        &mut self,
        id: GraphId,
        definition: GraphDefinition,
    ) -> Result<(), EngineError> {
        let current = self.store.graph(id)?;
        let name = definition.name.clone();
        let description = definition.description.clone();
        let graph = accept(&name, definition)?;
        if current.name == name && current.description == description && current.graph == graph {
            tracing::debug!(graph_id = id, graph = %name, "graph unchanged");
            return Ok(());
        }
        self.store.replace_graph(id, &name, &description, graph)?;
        tracing::info!(graph_id = id, graph = %name, "graph updated");
        Ok(())
    }

    pub fn delete_graph(&mut self, id: GraphId) -> Result<(), EngineError> {
        self.store.delete_graph(id)?;
        tracing::info!(graph_id = id, "graph deleted");
        Ok(())
    }

    pub fn graph(&self, id: GraphId) -> Result<&GraphRecord, EngineError> {
        Ok(self.store.graph(id)?)
    }

    pub fn graph_ids(&self) -> Vec<GraphId> {
        self.store.graph_ids()
    }

    /// The stored graph with each node's incoming and outgoing edges.
    pub fn graph_view(&self, id: GraphId) -> Result<GraphView, EngineError> {
        let record = self.store.graph(id)?;
        Ok(GraphView::new(
            record.id,
            &record.name,
            &record.description,
            &record.graph,
        ))
    }

    /// Stores a run configuration for a graph without executing it.
    pub fn create_run_config(
        &mut self,
        graph_id: GraphId,
        config: RunConfig,
    ) -> Result<RunConfigId, EngineError> {
        config.validate()?;
        Ok(self.store.insert_run_config(graph_id, config)?)
    }

    /// Stores `config` and executes it, returning the new run's id.
    pub fn run_graph(&mut self, graph_id: GraphId, config: RunConfig) -> Result<RunId, EngineError> {
        self.run_graph_with_report(graph_id, config)
            .map(|report| report.run_id)
    }

    /// Like [`Engine::run_graph`], returning the full report with order,
    /// levels and trace.
    pub fn run_graph_with_report(
        &mut self,
        graph_id: GraphId,
        config: RunConfig,
    ) -> Result<RunReport, EngineError> {
        let config_id = self.create_run_config(graph_id, config)?;
        self.execute_config(config_id)
    }

    /// Executes a stored configuration against the current version of its graph.
    pub fn execute_config(&mut self, config_id: RunConfigId) -> Result<RunReport, EngineError> {
        let record = self.store.run_config(config_id)?;
        let config = record.config.clone();
        let graph = self.store.graph(record.graph_id)?.graph.clone();

        validation::validate(&graph)?;

        let report = RunExecutor::new(&graph, &config)
            .with_options(self.options)
            .execute(&mut self.store, config_id)?;
        Ok(report)
    }

    /// The output a node recorded in a run.
    pub fn run_output(&self, run_id: &RunId, node_id: &str) -> Result<&RunOutput, EngineError> {
        let record = self.store.graph_of_run(run_id)?;
        if !record.graph.contains(node_id) {
            return Err(StoreError::NodeNotFound {
                graph_id: record.id,
                node_id: NodeId::from(node_id),
            }
            .into());
        }
        Ok(self.store.run_output(run_id, node_id)?)
    }

    /// Recorded outputs of the graph's leaves for a run, in recording order.
    pub fn leaf_outputs(&self, run_id: &RunId) -> Result<Vec<&RunOutput>, EngineError> {
        let graph = &self.store.graph_of_run(run_id)?.graph;
        Ok(self
            .store
            .run_outputs(run_id)?
            .into_iter()
            .filter(|output| graph.is_leaf(&output.node_id))
            .collect())
    }

    /// Islands of the nodes the latest run configuration enables. A graph
    /// without configurations has no islands.
    pub fn islands(&self, graph_id: GraphId) -> Result<Vec<Vec<NodeId>>, EngineError> {
        let graph = &self.store.graph(graph_id)?.graph;
        let Some(latest) = self.store.latest_run_config(graph_id)? else {
            return Ok(Vec::new());
        };
        let enabled = latest.config.enabled_set(graph);
        Ok(islands::islands(graph, &enabled))
    }

    pub fn toposort(&self, graph_id: GraphId) -> Result<Vec<NodeId>, EngineError> {
        let graph = self.configured_graph(graph_id)?;
        Ok(scheduler::topological_order(graph)?)
    }

    pub fn level_traversal(&self, graph_id: GraphId) -> Result<Levels, EngineError> {
        let graph = self.configured_graph(graph_id)?;
        Ok(scheduler::levels(graph)?)
    }

    /// Scheduling queries are only answered for graphs that have been
    /// configured for a run at least once.
    fn configured_graph(&self, graph_id: GraphId) -> Result<&Graph, EngineError> {
        let graph = &self.store.graph(graph_id)?.graph;
        if self.store.latest_run_config(graph_id)?.is_none() {
            return Err(EngineError::NoRunConfig(graph_id));
        }
        Ok(graph)
    }
}

fn accept(name: &str, payload: impl IntoGraph) -> Result<Graph, EngineError> {
    let graph = payload
        .into_graph()
        .map_err(EngineError::from)
        .and_then(|graph| {
            validation::validate(&graph)?;
            Ok(graph)
        });
    if let Err(e) = &graph {
        tracing::warn!(graph = %name, error = %e, "graph rejected");
    }
    graph
}
