use super::{GraphId, GraphRecord, GraphStore, RunBatch, RunConfigId, RunConfigRecord};
use crate::error::StoreError;
use crate::graph::Graph;
use crate::run::{Run, RunConfig, RunId, RunOutput};
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeMap;

/// In-process [`GraphStore`]. Ids are handed out from 1 upwards and never
/// reused, so "latest" configuration means highest id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub(super) graphs: BTreeMap<GraphId, GraphRecord>,
    pub(super) names: AHashMap<String, GraphId>,
    pub(super) configs: BTreeMap<RunConfigId, RunConfigRecord>,
    pub(super) runs: AHashMap<RunId, Run>,
    pub(super) outputs: AHashMap<RunId, Vec<RunOutput>>,
    pub(super) last_graph_id: GraphId,
    pub(super) last_config_id: RunConfigId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn graph_by_name(&self, name: &str) -> Option<&GraphRecord> {
        self.names.get(name).and_then(|id| self.graphs.get(id))
    }

    /// Runs of every configuration of a graph.
    pub fn runs_of_graph(&self, graph_id: GraphId) -> Vec<&Run> {
        let mut runs: Vec<&Run> = self
            .runs
            .values()
            .filter(|run| {
                self.configs
                    .get(&run.config_id)
                    .is_some_and(|c| c.graph_id == graph_id)
            })
            .collect();
        runs.sort_by_key(|run| run.created_at);
        runs
    }

    fn ensure_name_free(&self, name: &str, owner: Option<GraphId>) -> Result<(), StoreError> {
        match self.names.get(name) {
            Some(id) if Some(*id) != owner => Err(StoreError::DuplicateGraphName(name.to_string())),
            _ => Ok(()),
        }
    }

    fn config_ids_of(&self, graph_id: GraphId) -> Vec<RunConfigId> {
        self.configs
            .values()
            .filter(|c| c.graph_id == graph_id)
            .map(|c| c.id)
            .collect()
    }

    fn run_ids_of(&self, config_ids: &[RunConfigId]) -> Vec<RunId> {
        self.runs
            .values()
            .filter(|run| config_ids.contains(&run.config_id))
            .map(|run| run.run_id)
            .collect()
    }

    fn check_new_run(&self, run: &Run) -> Result<(), StoreError> {
        if self.runs.contains_key(&run.run_id) {
            return Err(StoreError::DuplicateRunId(run.run_id));
        }
        if !self.configs.contains_key(&run.config_id) {
            return Err(StoreError::RunConfigNotFound(run.config_id));
        }
        Ok(())
    }
}

impl GraphStore for MemoryStore {
    fn insert_graph(
        &mut self,
        name: &str,
        description: &str,
        graph: Graph,
    ) -> Result<GraphId, StoreError> {
        self.ensure_name_free(name, None)?;
        self.last_graph_id += 1;
        let id = self.last_graph_id;
        self.names.insert(name.to_string(), id);
        self.graphs.insert(
            id,
            GraphRecord {
                id,
                name: name.to_string(),
                description: description.to_string(),
                graph,
            },
        );
        tracing::debug!(graph_id = id, name, "graph stored");
        Ok(id)
    }

    fn replace_graph(
        &mut self,
        id: GraphId,
        name: &str,
        description: &str,
        graph: Graph,
    ) -> Result<(), StoreError> {
        if !self.graphs.contains_key(&id) {
            return Err(StoreError::GraphNotFound(id));
        }
        self.ensure_name_free(name, Some(id))?;

        let stale_runs = self.run_ids_of(&self.config_ids_of(id));
        for run_id in &stale_runs {
            self.outputs.remove(run_id);
        }

        if let Some(record) = self.graphs.get_mut(&id) {
            if record.name != name {
                self.names.remove(&record.name);
                self.names.insert(name.to_string(), id);
                record.name = name.to_string();
            }
            record.description = description.to_string();
            record.graph = graph;
        }
        tracing::debug!(
            graph_id = id,
            dropped_runs = stale_runs.len(),
            "graph replaced"
        );
        Ok(())
    }

    fn delete_graph(&mut self, id: GraphId) -> Result<(), StoreError> {
        let record = self.graphs.remove(&id).ok_or(StoreError::GraphNotFound(id))?;
        self.names.remove(&record.name);

        let config_ids = self.config_ids_of(id);
        for run_id in self.run_ids_of(&config_ids) {
            self.runs.remove(&run_id);
            self.outputs.remove(&run_id);
        }
        for config_id in &config_ids {
            self.configs.remove(config_id);
        }
        tracing::debug!(graph_id = id, configs = config_ids.len(), "graph deleted");
        Ok(())
    }

    fn graph(&self, id: GraphId) -> Result<&GraphRecord, StoreError> {
        self.graphs.get(&id).ok_or(StoreError::GraphNotFound(id))
    }

    fn graph_ids(&self) -> Vec<GraphId> {
        self.graphs.keys().copied().collect()
    }

    fn insert_run_config(
        &mut self,
        graph_id: GraphId,
        config: RunConfig,
    ) -> Result<RunConfigId, StoreError> {
        if !self.graphs.contains_key(&graph_id) {
            return Err(StoreError::GraphNotFound(graph_id));
        }
        self.last_config_id += 1;
        let id = self.last_config_id;
        self.configs.insert(
            id,
            RunConfigRecord {
                id,
                graph_id,
                config,
            },
        );
        Ok(id)
    }

    fn run_config(&self, id: RunConfigId) -> Result<&RunConfigRecord, StoreError> {
        self.configs.get(&id).ok_or(StoreError::RunConfigNotFound(id))
    }

    fn latest_run_config(
        &self,
        graph_id: GraphId,
    ) -> Result<Option<&RunConfigRecord>, StoreError> {
        if !self.graphs.contains_key(&graph_id) {
            return Err(StoreError::GraphNotFound(graph_id));
        }
        Ok(self
            .configs
            .values()
            .rev()
            .find(|c| c.graph_id == graph_id))
    }

    fn insert_run(&mut self, run: Run) -> Result<(), StoreError> {
        self.check_new_run(&run)?;
        self.outputs.insert(run.run_id, Vec::new());
        self.runs.insert(run.run_id, run);
        Ok(())
    }

    fn insert_run_output(&mut self, output: RunOutput) -> Result<(), StoreError> {
        if !self.runs.contains_key(&output.run_id) {
            return Err(StoreError::RunNotFound(output.run_id));
        }
        let recorded = self.outputs.entry(output.run_id).or_default();
        if recorded.iter().any(|o| o.node_id == output.node_id) {
            return Err(StoreError::DuplicateRunOutput {
                run_id: output.run_id,
                node_id: output.node_id,
            });
        }
        recorded.push(output);
        Ok(())
    }

    fn commit_batch(&mut self, batch: RunBatch) -> Result<(), StoreError> {
        let (run, outputs) = batch.into_parts();
        self.check_new_run(&run)?;

        {
            let mut seen = AHashSet::with_capacity(outputs.len());
            for output in &outputs {
                if output.run_id != run.run_id {
                    return Err(StoreError::RunNotFound(output.run_id));
                }
                if !seen.insert(output.node_id.as_str()) {
                    return Err(StoreError::DuplicateRunOutput {
                        run_id: run.run_id,
                        node_id: output.node_id.clone(),
                    });
                }
            }
        }

        tracing::debug!(run_id = %run.run_id, outputs = outputs.len(), "run committed");
        self.outputs.insert(run.run_id, outputs);
        self.runs.insert(run.run_id, run);
        Ok(())
    }

    fn run(&self, run_id: &RunId) -> Result<&Run, StoreError> {
        self.runs.get(run_id).ok_or(StoreError::RunNotFound(*run_id))
    }

    fn run_outputs(&self, run_id: &RunId) -> Result<Vec<&RunOutput>, StoreError> {
        self.run(run_id)?;
        Ok(self
            .outputs
            .get(run_id)
            .map(|outputs| outputs.iter().collect())
            .unwrap_or_default())
    }
}
