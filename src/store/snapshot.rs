//! Binary snapshots of a [`MemoryStore`].
//!
//! Snapshots are bincode-encoded. bincode is not self-describing, so values
//! are written through an explicit tagged mirror instead of the JSON-shaped
//! serde impl of [`Value`].

use super::{GraphRecord, MemoryStore, RunConfigRecord};
use crate::error::StoreError;
use crate::graph::{Edge, Graph, KeyMapping, Node, NodeId};
use crate::run::{Run, RunConfig, RunOutput};
use crate::value::{DataMap, Value};
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use uuid::Uuid;

const SNAPSHOT_VERSION: u32 = 2;

#[derive(Serialize, Deserialize)]
enum StoredValue {
    Number(f64),
    Json(String),
}

type StoredMap = Vec<(String, StoredValue)>;

#[derive(Serialize, Deserialize)]
struct StoredGraph {
    id: u64,
    name: String,
    description: String,
    nodes: Vec<(NodeId, StoredMap, StoredMap)>,
    edges: Vec<(NodeId, NodeId, String, String)>,
}

#[derive(Serialize, Deserialize)]
struct StoredConfig {
    id: u64,
    graph_id: u64,
    root_inputs: Vec<(NodeId, StoredMap)>,
    data_overwrites: Vec<(NodeId, StoredMap)>,
    enable_list: Vec<NodeId>,
    disable_list: Vec<NodeId>,
}

#[derive(Serialize, Deserialize)]
struct StoredRun {
    run_id: Uuid,
    config_id: u64,
    created_at: DateTime<Utc>,
    outputs: Vec<(NodeId, StoredMap)>,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    last_graph_id: u64,
    last_config_id: u64,
    graphs: Vec<StoredGraph>,
    configs: Vec<StoredConfig>,
    runs: Vec<StoredRun>,
}

impl MemoryStore {
    /// Saves the whole store to a file using the bincode format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|e| {
            StoreError::Io(format!("Could not write to file '{}': {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), graphs = self.graphs.len(), "snapshot saved");
        Ok(())
    }

    /// Loads a store from a snapshot file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            StoreError::Io(format!("Could not read from file '{}': {}", path.display(), e))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        encode_to_vec(self.to_snapshot()?, standard())
            .map_err(|e| StoreError::Snapshot(format!("Serialization failed: {}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        let (snapshot, _): (Snapshot, usize) = decode_from_slice(bytes, standard())
            .map_err(|e| StoreError::Snapshot(format!("Deserialization failed: {}", e)))?;
        Self::from_snapshot(snapshot)
    }

    fn to_snapshot(&self) -> Result<Snapshot, StoreError> {
        let graphs = self
            .graphs
            .values()
            .map(|record| {
                Ok(StoredGraph {
                    id: record.id,
                    name: record.name.clone(),
                    description: record.description.clone(),
                    nodes: record
                        .graph
                        .nodes()
                        .iter()
                        .map(|n| {
                            Ok((n.node_id.clone(), store_map(&n.data_in)?, store_map(&n.data_out)?))
                        })
                        .collect::<Result<_, StoreError>>()?,
                    edges: record
                        .graph
                        .edges()
                        .iter()
                        .map(|e| {
                            (
                                e.src.clone(),
                                e.dst.clone(),
                                e.keys.src_key.clone(),
                                e.keys.dst_key.clone(),
                            )
                        })
                        .collect(),
                })
            })
            .collect::<Result<_, StoreError>>()?;

        let configs = self
            .configs
            .values()
            .map(|record| {
                Ok(StoredConfig {
                    id: record.id,
                    graph_id: record.graph_id,
                    root_inputs: store_nested(&record.config.root_inputs)?,
                    data_overwrites: store_nested(&record.config.data_overwrites)?,
                    enable_list: record.config.enable_list.clone(),
                    disable_list: record.config.disable_list.clone(),
                })
            })
            .collect::<Result<_, StoreError>>()?;

        let runs = self
            .runs
            .values()
            .map(|run| {
                let outputs = self
                    .outputs
                    .get(&run.run_id)
                    .map(|outputs| {
                        outputs
                            .iter()
                            .map(|o| Ok((o.node_id.clone(), store_map(&o.data_out)?)))
                            .collect::<Result<Vec<_>, StoreError>>()
                    })
                    .transpose()?
                    .unwrap_or_default();
                Ok(StoredRun {
                    run_id: run.run_id,
                    config_id: run.config_id,
                    created_at: run.created_at,
                    outputs,
                })
            })
            .collect::<Result<_, StoreError>>()?;

        Ok(Snapshot {
            version: SNAPSHOT_VERSION,
            last_graph_id: self.last_graph_id,
            last_config_id: self.last_config_id,
            graphs,
            configs,
            runs,
        })
    }

    fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::Snapshot(format!(
                "Unsupported snapshot version {}",
                snapshot.version
            )));
        }

        let mut store = MemoryStore {
            last_graph_id: snapshot.last_graph_id,
            last_config_id: snapshot.last_config_id,
            ..MemoryStore::default()
        };

        for stored in snapshot.graphs {
            let nodes = stored
                .nodes
                .into_iter()
                .map(|(id, data_in, data_out)| {
                    Ok(Node::new(id, load_map(data_in)?, load_map(data_out)?))
                })
                .collect::<Result<Vec<_>, StoreError>>()?;
            let edges = stored
                .edges
                .into_iter()
                .map(|(src, dst, src_key, dst_key)| {
                    Edge::new(src, dst, KeyMapping::new(src_key, dst_key))
                })
                .collect();
            let graph = Graph::new(nodes, edges).map_err(|e| {
                StoreError::Snapshot(format!("Graph '{}' is corrupt: {}", stored.name, e))
            })?;
            store.names.insert(stored.name.clone(), stored.id);
            store.graphs.insert(
                stored.id,
                GraphRecord {
                    id: stored.id,
                    name: stored.name,
                    description: stored.description,
                    graph,
                },
            );
        }

        for stored in snapshot.configs {
            let config = RunConfig {
                root_inputs: load_nested(stored.root_inputs)?,
                data_overwrites: load_nested(stored.data_overwrites)?,
                enable_list: stored.enable_list,
                disable_list: stored.disable_list,
            };
            store.configs.insert(
                stored.id,
                RunConfigRecord {
                    id: stored.id,
                    graph_id: stored.graph_id,
                    config,
                },
            );
        }

        for stored in snapshot.runs {
            let run_id = stored.run_id;
            let outputs = stored
                .outputs
                .into_iter()
                .map(|(node_id, data_out)| {
                    Ok(RunOutput {
                        run_id,
                        node_id,
                        data_out: load_map(data_out)?,
                    })
                })
                .collect::<Result<Vec<_>, StoreError>>()?;
            store.outputs.insert(run_id, outputs);
            store.runs.insert(
                run_id,
                Run {
                    run_id,
                    config_id: stored.config_id,
                    created_at: stored.created_at,
                },
            );
        }

        Ok(store)
    }
}

fn store_map(map: &DataMap) -> Result<StoredMap, StoreError> {
    map.iter()
        .map(|(key, value)| {
            let stored = match value {
                Value::Number(n) => StoredValue::Number(*n),
                Value::Other(v) => StoredValue::Json(
                    serde_json::to_string(v)
                        .map_err(|e| StoreError::Snapshot(format!("Serialization failed: {}", e)))?,
                ),
            };
            Ok((key.clone(), stored))
        })
        .collect()
}

fn load_map(stored: StoredMap) -> Result<DataMap, StoreError> {
    stored
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                StoredValue::Number(n) => Value::Number(n),
                StoredValue::Json(text) => Value::Other(serde_json::from_str(&text).map_err(
                    |e| StoreError::Snapshot(format!("Deserialization failed: {}", e)),
                )?),
            };
            Ok((key, value))
        })
        .collect()
}

fn store_nested(map: &BTreeMap<NodeId, DataMap>) -> Result<Vec<(NodeId, StoredMap)>, StoreError> {
    map.iter()
        .map(|(node_id, data)| Ok((node_id.clone(), store_map(data)?)))
        .collect()
}

fn load_nested(stored: Vec<(NodeId, StoredMap)>) -> Result<BTreeMap<NodeId, DataMap>, StoreError> {
    stored
        .into_iter()
        .map(|(node_id, data)| Ok((node_id, load_map(data)?)))
        .collect()
}
