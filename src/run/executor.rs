use super::{Run, RunConfig, RunId, RunOutput};
use crate::error::ExecutionError;
use crate::graph::{Graph, Node, NodeId};
use crate::scheduler::{Levels, levels_from_order, topological_order};
use crate::store::{GraphStore, RunBatch, RunConfigId};
use crate::trace::{RunTrace, TraceEvent};
use crate::value::{DataMap, Value};
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a run's records reach the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// The run and all of its outputs are committed together once every
    /// enabled node has been computed. A failed run stores nothing.
    #[default]
    Atomic,
    /// The run is stored up front and each output as soon as it is computed.
    /// A failed run keeps the outputs recorded before the failure.
    Incremental,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorOptions {
    pub commit_mode: CommitMode,
}

/// Everything a finished run exposes besides its stored outputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub created_at: DateTime<Utc>,
    /// Topological order of the full graph, skipped nodes included.
    pub order: Vec<NodeId>,
    /// Level grouping of the full graph, skipped nodes included.
    pub levels: Levels,
    pub trace: RunTrace,
}

/// Drives one run of a graph under one configuration.
///
/// The executor borrows its inputs and keeps no state across calls: every
/// `execute` works on its own output table, so concurrent runs of the same
/// graph never share anything but the store.
pub struct RunExecutor<'a> {
    graph: &'a Graph,
    config: &'a RunConfig,
    options: ExecutorOptions,
}

impl<'a> RunExecutor<'a> {
    pub fn new(graph: &'a Graph, config: &'a RunConfig) -> Self {
        Self {
            graph,
            config,
            options: ExecutorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes every enabled node in topological order and records its
    /// output under a new run bound to `config_id`.
    pub fn execute<S>(
        &self,
        store: &mut S,
        config_id: RunConfigId,
    ) -> Result<RunReport, ExecutionError>
    where
        S: GraphStore + ?Sized,
    {
        let enabled = self.config.enabled_set(self.graph);
        let order = topological_order(self.graph)?;
        let run = Run::new(config_id);
        let run_id = run.run_id;
        let created_at = run.created_at;

        tracing::info!(
            run_id = %run_id,
            config_id,
            enabled = enabled.len(),
            total = self.graph.len(),
            mode = ?self.options.commit_mode,
            "starting run"
        );

        let mut batch = match self.options.commit_mode {
            CommitMode::Atomic => Some(RunBatch::new(run)),
            CommitMode::Incremental => {
                store.insert_run(run)?;
                None
            }
        };

        let mut outputs: AHashMap<&str, DataMap> = AHashMap::with_capacity(enabled.len());
        let mut trace = RunTrace::default();

        for node_id in &order {
            if !enabled.contains(node_id) {
                tracing::debug!(run_id = %run_id, node = %node_id, "node disabled, skipping");
                trace.push(TraceEvent::Skipped {
                    node_id: node_id.clone(),
                });
                continue;
            }
            let Some(node) = self.graph.node(node_id) else {
                continue;
            };

            let root = self.graph.is_root(node_id);
            let (inputs, data_out) = if root {
                (DataMap::new(), self.root_output(node))
            } else {
                let inputs = self.resolve_inputs(node, &outputs).inspect_err(|e| {
                    tracing::warn!(run_id = %run_id, error = %e, "run aborted");
                })?;
                let data_out = overlay_output(node, &inputs);
                (inputs, data_out)
            };
            tracing::trace!(run_id = %run_id, node = %node_id, "node computed");

            let record = RunOutput {
                run_id,
                node_id: node_id.clone(),
                data_out: data_out.clone(),
            };
            match batch.as_mut() {
                Some(batch) => batch.push(record),
                None => store.insert_run_output(record)?,
            }

            trace.push(TraceEvent::Computed {
                node_id: node_id.clone(),
                root,
                inputs,
                outputs: data_out.clone(),
            });
            outputs.insert(node_id.as_str(), data_out);
        }

        if let Some(batch) = batch {
            store.commit_batch(batch)?;
        }

        let levels = levels_from_order(self.graph, &order);
        tracing::info!(
            run_id = %run_id,
            computed = outputs.len(),
            levels = levels.len(),
            "run finished"
        );

        Ok(RunReport {
            run_id,
            created_at,
            order,
            levels,
            trace,
        })
    }

    /// Root output: declared defaults, then root inputs, then overwrites,
    /// the last writer winning per key.
    fn root_output(&self, node: &Node) -> DataMap {
        let mut data = node.data_out.clone();
        for layer in [&self.config.root_inputs, &self.config.data_overwrites] {
            if let Some(values) = layer.get(&node.node_id) {
                data.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        data
    }

    /// Inputs of a non-root node: overwrites first, then one value per
    /// incoming edge read from the upstream node's output for this run.
    /// Values landing on an occupied key accumulate.
    fn resolve_inputs(
        &self,
        node: &Node,
        outputs: &AHashMap<&str, DataMap>,
    ) -> Result<DataMap, ExecutionError> {
        let mut inputs = self
            .config
            .data_overwrites
            .get(&node.node_id)
            .cloned()
            .unwrap_or_default();

        for edge in self.graph.incoming_edges(&node.node_id) {
            let value = outputs
                .get(edge.src.as_str())
                .and_then(|upstream| upstream.get(&edge.keys.src_key))
                .filter(|value| !value.is_null())
                .ok_or_else(|| ExecutionError::MissingUpstreamOutput {
                    node_id: node.node_id.clone(),
                    upstream_id: edge.src.clone(),
                    key: edge.keys.src_key.clone(),
                })?;

            match inputs.get_mut(&edge.keys.dst_key) {
                Some(existing) => *existing = existing.accumulate(value),
                None => {
                    inputs.insert(edge.keys.dst_key.clone(), value.clone());
                }
            }
        }

        Ok(inputs)
    }
}

/// Output of a non-root node: each declared key keeps its default, shifted
/// by a same-named numeric input when there is one. Other inputs are dropped.
pub fn overlay_output(node: &Node, inputs: &DataMap) -> DataMap {
    node.data_out
        .iter()
        .map(|(key, default)| (key.clone(), Value::overlay(default, inputs.get(key))))
        .collect()
}

/// Runs `config` against `graph`, recording into `store`, and returns the new
/// run's identifier.
pub fn execute<S>(
    graph: &Graph,
    config: &RunConfig,
    store: &mut S,
    config_id: RunConfigId,
) -> Result<RunId, ExecutionError>
where
    S: GraphStore + ?Sized,
{
    RunExecutor::new(graph, config)
        .execute(store, config_id)
        .map(|report| report.run_id)
}
