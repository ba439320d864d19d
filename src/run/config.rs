use crate::error::ValidationError;
use crate::graph::{Graph, NodeId};
use crate::value::DataMap;
use ahash::AHashSet;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One execution configuration for a graph.
///
/// `root_inputs` only reach nodes without incoming edges; `data_overwrites`
/// reach any node and win over root inputs. At most one of `enable_list` and
/// `disable_list` may be non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub root_inputs: BTreeMap<NodeId, DataMap>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_overwrites: BTreeMap<NodeId, DataMap>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enable_list: Vec<NodeId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disable_list: Vec<NodeId>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RunConfig {
    /// Parses and validates a run configuration payload.
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ValidationError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enable_list.is_empty() && !self.disable_list.is_empty() {
            return Err(ValidationError::ConflictingNodeFilters);
        }
        Ok(())
    }

    pub fn with_root_input(mut self, node_id: impl Into<NodeId>, inputs: DataMap) -> Self {
        self.root_inputs.insert(node_id.into(), inputs);
        self
    }

    pub fn with_overwrite(mut self, node_id: impl Into<NodeId>, inputs: DataMap) -> Self {
        self.data_overwrites.insert(node_id.into(), inputs);
        self
    }

    pub fn enabling<I, S>(mut self, node_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.enable_list = node_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn disabling<I, S>(mut self, node_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.disable_list = node_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Resolves which nodes take part in a run: the enable list if given,
    /// otherwise every node minus the disable list, otherwise every node.
    pub fn enabled_set(&self, graph: &Graph) -> EnabledSet {
        let unknown = self
            .enable_list
            .iter()
            .chain(&self.disable_list)
            .filter(|id| !graph.contains(id))
            .count();
        if unknown > 0 {
            tracing::warn!(unknown, "run configuration names nodes absent from the graph");
        }

        if !self.enable_list.is_empty() {
            return EnabledSet::from_ids(self.enable_list.iter().cloned());
        }
        let disabled: AHashSet<&str> = self.disable_list.iter().map(String::as_str).collect();
        EnabledSet::from_ids(
            graph
                .node_ids()
                .filter(|id| !disabled.contains(id.as_str()))
                .cloned(),
        )
    }
}

/// The node ids participating in one run.
#[derive(Debug, Clone, Default)]
pub struct EnabledSet {
    ids: AHashSet<NodeId>,
}

impl EnabledSet {
    pub fn from_ids(ids: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Every node of the graph.
    pub fn all(graph: &Graph) -> Self {
        Self::from_ids(graph.node_ids().cloned())
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.ids.contains(node_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
