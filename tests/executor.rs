//! Tests for run execution: input resolution, output overlay and commit modes.
mod common;
use common::*;
use dagflow::prelude::*;
use dagflow::run::{ExecutorOptions, execute, overlay_output};
use dagflow::trace::TraceEvent;

/// Stores `graph` and `config` and returns the store with the config id.
fn prepared(graph: &Graph, config: &RunConfig) -> (MemoryStore, GraphId, RunConfigId) {
    let mut store = MemoryStore::new();
    let graph_id = store
        .insert_graph("under-test", "", graph.clone())
        .expect("Failed to store graph");
    let config_id = store
        .insert_run_config(graph_id, config.clone())
        .expect("Failed to store config");
    (store, graph_id, config_id)
}

fn run(graph: &Graph, config: &RunConfig) -> (MemoryStore, RunReport) {
    let (mut store, _, config_id) = prepared(graph, config);
    let report = RunExecutor::new(graph, config)
        .execute(&mut store, config_id)
        .expect("Run should succeed");
    (store, report)
}

fn output<'s>(store: &'s MemoryStore, report: &RunReport, node_id: &str) -> &'s DataMap {
    &store
        .run_output(&report.run_id, node_id)
        .unwrap_or_else(|e| panic!("No output for '{}': {}", node_id, e))
        .data_out
}

fn inputs_of<'r>(report: &'r RunReport, node_id: &str) -> &'r DataMap {
    report
        .trace
        .events
        .iter()
        .find_map(|event| match event {
            TraceEvent::Computed {
                node_id: id,
                inputs,
                ..
            } if id == node_id => Some(inputs),
            _ => None,
        })
        .unwrap_or_else(|| panic!("'{}' was not computed", node_id))
}

#[cfg(test)]
mod resolution_tests {
    use super::*;

    #[test]
    fn test_overwrite_and_edge_value_accumulate_on_the_same_key() {
        let graph = chain_graph();
        let config = RunConfig::default()
            .with_root_input("A", data_map([("out1", 100.0)]))
            .with_overwrite("B", data_map([("in1", 200.0)]))
            .enabling(["A", "B", "C"]);
        let (store, report) = run(&graph, &config);

        assert_eq!(output(&store, &report, "A"), &data_map([("out1", 100.0)]));
        assert_eq!(number(inputs_of(&report, "B"), "in1"), 300.0);
        // B declares no `in1` output, so its output keeps the default.
        assert_eq!(output(&store, &report, "B"), &data_map([("out2", 20.0)]));
        assert_eq!(number(output(&store, &report, "C"), "out3"), 50.0);
    }

    #[test]
    fn test_root_output_layers_defaults_inputs_and_overwrites() {
        let graph = chain_graph();
        let config = RunConfig::default()
            .with_root_input("A", data_map([("out1", 100.0), ("extra", 1.0)]))
            .with_overwrite("A", data_map([("out1", 7.0)]));
        let (store, report) = run(&graph, &config);

        assert_eq!(
            output(&store, &report, "A"),
            &data_map([("extra", 1.0), ("out1", 7.0)])
        );
        assert_eq!(number(inputs_of(&report, "B"), "in1"), 7.0);
    }

    #[test]
    fn test_root_defaults_are_used_without_inputs() {
        let graph = chain_graph();
        let (store, report) = run(&graph, &RunConfig::default());
        assert_eq!(output(&store, &report, "A"), &data_map([("out1", 10.0)]));
        assert_eq!(number(output(&store, &report, "C"), "out3"), 50.0);
    }

    #[test]
    fn test_root_inputs_do_not_reach_non_root_nodes() {
        let graph = chain_graph();
        let config = RunConfig::default().with_root_input("B", data_map([("out2", 999.0)]));
        let (store, report) = run(&graph, &config);
        assert_eq!(output(&store, &report, "B"), &data_map([("out2", 20.0)]));
    }

    #[test]
    fn test_overwrite_on_output_key_shifts_non_root_output() {
        let graph = chain_graph();
        let config = RunConfig::default().with_overwrite("B", data_map([("out2", 5.0)]));
        let (store, report) = run(&graph, &config);
        assert_eq!(number(output(&store, &report, "B"), "out2"), 25.0);
        assert_eq!(number(output(&store, &report, "C"), "out3"), 55.0);
    }

    #[test]
    fn test_two_edges_into_one_key_add_up() {
        let graph = definition(MERGE_GRAPH_JSON).into_graph().unwrap();
        let (store, report) = run(&graph, &RunConfig::default());
        assert_eq!(number(inputs_of(&report, "R"), "z"), 12.0);
        assert_eq!(number(output(&store, &report, "R"), "z"), 12.0);
    }

    #[test]
    fn test_non_numeric_values_last_writer_wins_and_defaults_hold() {
        let nodes = vec![
            Node::new("P", DataMap::new(), data_map([("label", "p")])),
            Node::new("Q", DataMap::new(), data_map([("label", "q")])),
            Node::new("R", DataMap::new(), data_map([("label", "r")])),
        ];
        let edges = vec![
            edge("P", "R", "label", "label"),
            edge("Q", "R", "label", "label"),
        ];
        let graph = Graph::new(nodes, edges).unwrap();
        let (store, report) = run(&graph, &RunConfig::default());

        assert_eq!(inputs_of(&report, "R")["label"], Value::from("q"));
        assert_eq!(output(&store, &report, "R")["label"], Value::from("r"));
    }

    #[test]
    fn test_overlay_drops_undeclared_keys() {
        let target = node("n", &[("keep", 1.0)]);
        let inputs = data_map([("keep", 2.0), ("stray", 9.0)]);
        assert_eq!(overlay_output(&target, &inputs), data_map([("keep", 3.0)]));
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[test]
    fn test_disabled_middle_node_starves_downstream() {
        let graph = chain_graph();
        let config = RunConfig::default().enabling(["A", "C"]);
        let (mut store, _, config_id) = prepared(&graph, &config);

        let err = RunExecutor::new(&graph, &config)
            .execute(&mut store, config_id)
            .unwrap_err();
        assert_eq!(
            err,
            ExecutionError::MissingUpstreamOutput {
                node_id: "C".to_string(),
                upstream_id: "B".to_string(),
                key: "out2".to_string(),
            }
        );
        // Atomic commit leaves nothing behind.
        assert_eq!(store.run_count(), 0);
    }

    #[test]
    fn test_incremental_mode_keeps_outputs_before_failure() {
        let graph = chain_graph();
        let config = RunConfig::default().disabling(["B"]);
        let (mut store, graph_id, config_id) = prepared(&graph, &config);

        let result = RunExecutor::new(&graph, &config)
            .with_options(ExecutorOptions {
                commit_mode: CommitMode::Incremental,
            })
            .execute(&mut store, config_id);
        assert!(matches!(
            result,
            Err(ExecutionError::MissingUpstreamOutput { .. })
        ));

        let runs = store.runs_of_graph(graph_id);
        assert_eq!(runs.len(), 1);
        let recorded: Vec<_> = store
            .run_outputs(&runs[0].run_id)
            .unwrap()
            .iter()
            .map(|o| o.node_id.clone())
            .collect();
        assert_eq!(recorded, vec!["A"]);
    }

    #[test]
    fn test_null_upstream_value_counts_as_missing() {
        let nodes = vec![
            Node::new(
                "src",
                DataMap::new(),
                DataMap::from([("x".to_string(), Value::Other(serde_json::Value::Null))]),
            ),
            node("dst", &[("x", 0.0)]),
        ];
        let graph = Graph::new(nodes, vec![edge("src", "dst", "x", "x")]).unwrap();
        let (mut store, _, config_id) = prepared(&graph, &RunConfig::default());

        let err = execute(&graph, &RunConfig::default(), &mut store, config_id).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::MissingUpstreamOutput { ref upstream_id, .. } if upstream_id == "src"
        ));
    }

    #[test]
    fn test_cyclic_graph_never_starts() {
        let graph = simple_graph(&["a", "b"], &[("a", "b"), ("b", "a")]);
        let (mut store, _, config_id) = prepared(&graph, &RunConfig::default());

        let err = RunExecutor::new(&graph, &RunConfig::default())
            .execute(&mut store, config_id)
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Graph(GraphError::CycleDetected { .. })
        ));
        assert_eq!(store.run_count(), 0);
    }
}

#[cfg(test)]
mod report_tests {
    use super::*;

    #[test]
    fn test_skipped_nodes_are_traced_in_order() {
        let graph = chain_graph();
        let config = RunConfig::default().enabling(["A"]);
        let (store, report) = run(&graph, &config);

        assert_eq!(report.order, vec!["A", "B", "C"]);
        assert_eq!(report.trace.skipped().collect::<Vec<_>>(), vec!["B", "C"]);
        assert_eq!(report.trace.computed().count(), 1);
        assert_eq!(store.run_outputs(&report.run_id).unwrap().len(), 1);
        assert_eq!(report.levels.len(), 3);
    }

    #[test]
    fn test_every_run_gets_a_fresh_id() {
        let graph = chain_graph();
        let config = RunConfig::default();
        let (mut store, _, config_id) = prepared(&graph, &config);

        let first = execute(&graph, &config, &mut store, config_id).unwrap();
        let second = execute(&graph, &config, &mut store, config_id).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.run_count(), 2);
        assert_eq!(store.run(&first).unwrap().config_id, config_id);
    }

    #[test]
    fn test_formatter_renders_levels_and_nodes() {
        let graph = chain_graph();
        let config = RunConfig::default().enabling(["A"]);
        let (_store, report) = run(&graph, &config);

        let text = TraceFormatter::format_run(&report);
        assert!(text.contains(&report.run_id.to_string()));
        assert!(text.contains("0: A"));
        assert!(text.contains("A [root] -> {out1: 10}"));
        assert!(text.contains("B (skipped)"));
    }
}
