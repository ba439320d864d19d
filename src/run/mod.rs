//! Run configurations, run records and the executor that produces them.

use crate::graph::NodeId;
use crate::store::RunConfigId;
use crate::value::DataMap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub mod config;
pub mod executor;

pub use config::*;
pub use executor::*;

/// Opaque, globally unique run identifier.
pub type RunId = Uuid;

/// One execution of a stored run configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub run_id: RunId,
    pub config_id: RunConfigId,
    pub created_at: DateTime<Utc>,
}

impl Run {
    /// A fresh run with a new v4 identifier, stamped now.
    pub fn new(config_id: RunConfigId) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            config_id,
            created_at: Utc::now(),
        }
    }
}

/// The recorded output of one node in one run. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutput {
    pub run_id: RunId,
    pub node_id: NodeId,
    pub data_out: DataMap,
}
