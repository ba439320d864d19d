use crate::graph::NodeId;
use crate::store::{GraphId, RunConfigId};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while turning a submitted payload into graph or run-config
/// entities. Nothing is stored when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Failed to parse payload JSON: {0}")]
    Json(String),

    #[error("Missing field in graph data: '{0}'")]
    MissingField(String),

    #[error("Duplicate node_id(s) found within the graph: {}", .0.join(", "))]
    DuplicateNodeIds(Vec<String>),

    #[error("Invalid edge with src: '{src}', dst: '{dst}' (unknown node)")]
    UnknownEdgeNode { src: String, dst: String },

    #[error(
        "Edge '{src}' -> '{dst}' must map exactly one source key to one destination key, found {found}"
    )]
    InvalidKeyMapping {
        src: String,
        dst: String,
        found: usize,
    },

    #[error("Duplicate edge '{src}' -> '{dst}' mapping '{src_key}' to '{dst_key}'")]
    DuplicateEdge {
        src: String,
        dst: String,
        src_key: String,
        dst_key: String,
    },

    #[error("Cannot provide both enable_list and disable_list simultaneously")]
    ConflictingNodeFilters,
}

/// Structural defects found by the scheduler or the connectivity check.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Graph contains a cycle through node(s): {}", .nodes.join(", "))]
    CycleDetected { nodes: Vec<NodeId> },

    #[error("Graph contains {components} disconnected components (islands)")]
    Disconnected { components: usize },
}

/// Errors that abort a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Missing input '{key}' from node '{upstream_id}' for node '{node_id}'")]
    MissingUpstreamOutput {
        node_id: NodeId,
        upstream_id: NodeId,
        key: String,
    },

    #[error("Failed to record run state: {0}")]
    Store(#[from] StoreError),
}

/// Entity store failures, mostly unique-key and lookup violations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("A graph named '{0}' already exists")]
    DuplicateGraphName(String),

    #[error("Graph {0} not found")]
    GraphNotFound(GraphId),

    #[error("Run configuration {0} not found")]
    RunConfigNotFound(RunConfigId),

    #[error("Run '{0}' not found")]
    RunNotFound(Uuid),

    #[error("Run '{0}' already exists")]
    DuplicateRunId(Uuid),

    #[error("Run '{run_id}' already has an output for node '{node_id}'")]
    DuplicateRunOutput { run_id: Uuid, node_id: NodeId },

    #[error("Node '{node_id}' does not exist in graph {graph_id}")]
    NodeNotFound { graph_id: GraphId, node_id: NodeId },

    #[error("Run output not found for node '{node_id}' in run '{run_id}'")]
    RunOutputNotFound { run_id: Uuid, node_id: NodeId },

    #[error("Snapshot encoding failed: {0}")]
    Snapshot(String),

    #[error("Snapshot I/O failed: {0}")]
    Io(String),
}

/// Top-level error for the [`Engine`](crate::engine::Engine) facade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No run configurations found for graph {0}")]
    NoRunConfig(GraphId),
}
