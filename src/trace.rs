//! Per-run execution trace and its text rendering.

use crate::graph::NodeId;
use crate::run::RunReport;
use crate::value::DataMap;
use itertools::Itertools;
use serde::Serialize;

/// What happened to one node during a run, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    Computed {
        node_id: NodeId,
        root: bool,
        inputs: DataMap,
        outputs: DataMap,
    },
    Skipped {
        node_id: NodeId,
    },
}

impl TraceEvent {
    pub fn node_id(&self) -> &str {
        match self {
            TraceEvent::Computed { node_id, .. } | TraceEvent::Skipped { node_id } => node_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunTrace {
    pub events: Vec<TraceEvent>,
}

impl RunTrace {
    pub fn computed(&self) -> impl Iterator<Item = &TraceEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, TraceEvent::Computed { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            TraceEvent::Skipped { node_id } => Some(node_id.as_str()),
            TraceEvent::Computed { .. } => None,
        })
    }

    pub(crate) fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

/// Formats run reports into human-readable text.
pub struct TraceFormatter;

impl TraceFormatter {
    pub fn format_run(report: &RunReport) -> String {
        let mut out = format!(
            "Run {} ({})\n",
            report.run_id,
            report.created_at.to_rfc3339()
        );

        out.push_str("Levels:\n");
        for (level, nodes) in &report.levels {
            out.push_str(&format!("  {}: {}\n", level, nodes.join(", ")));
        }

        out.push_str("Nodes:\n");
        for event in &report.trace.events {
            out.push_str(&format!("  {}\n", Self::format_event(event)));
        }
        out
    }

    pub fn format_event(event: &TraceEvent) -> String {
        match event {
            TraceEvent::Computed {
                node_id,
                root,
                inputs,
                outputs,
            } => {
                let origin = if *root {
                    "root".to_string()
                } else {
                    format!("in {{{}}}", Self::format_map(inputs))
                };
                format!("{} [{}] -> {{{}}}", node_id, origin, Self::format_map(outputs))
            }
            TraceEvent::Skipped { node_id } => format!("{} (skipped)", node_id),
        }
    }

    pub fn format_map(map: &DataMap) -> String {
        map.iter().map(|(k, v)| format!("{}: {}", k, v)).join(", ")
    }
}
