use clap::Parser;
use dagflow::graph::{EdgeDefinition, GraphDefinition, NodeDefinition};
use dagflow::value::{DataMap, data_map};
use rand::rngs::ThreadRng;
use rand::{Rng, seq::index};
use std::collections::BTreeMap;
use std::fs;

/// A CLI tool to generate random, connected DAG payloads for the dagflow engine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_graph.json")]
    output: String,

    /// Name of the generated graph
    #[arg(long, default_value = "generated")]
    name: String,

    /// Number of nodes to generate
    #[arg(short, long, default_value_t = 20)]
    nodes: usize,

    /// The maximum number of parents each non-root node is wired to
    #[arg(long, default_value_t = 3)]
    max_parents: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.nodes == 0 || cli.max_parents == 0 {
        eprintln!("Error: --nodes and --max-parents must both be at least 1");
        std::process::exit(1);
    }

    println!(
        "Generating graph '{}' with {} nodes (up to {} parents per node)...",
        cli.name, cli.nodes, cli.max_parents
    );

    let nodes = generate_nodes(&mut rng, cli.nodes);
    let edges = generate_edges(&mut rng, cli.nodes, cli.max_parents);
    println!("-> Generated {} edges.", edges.len());

    let definition = GraphDefinition {
        name: cli.name,
        description: format!("Random DAG with {} nodes", cli.nodes),
        nodes,
        edges,
    };

    fs::write(&cli.output, definition.to_json()?)?;
    println!(
        "Successfully generated and saved graph payload to '{}'",
        cli.output
    );

    Ok(())
}

fn node_id(i: usize) -> String {
    format!("node_{:04}", i)
}

/// Every node declares one numeric output `value`.
fn generate_nodes(rng: &mut ThreadRng, count: usize) -> Vec<NodeDefinition> {
    (0..count)
        .map(|i| NodeDefinition {
            node_id: node_id(i),
            data_in: DataMap::new(),
            data_out: data_map([("value", rng.random_range(0..100) as f64)]),
        })
        .collect()
}

/// Wires every node after the first to between one and `max_parents`
/// distinct earlier nodes. Edges only point forward, so the graph is acyclic,
/// and every node reaches node 0, so it is connected.
fn generate_edges(rng: &mut ThreadRng, count: usize, max_parents: usize) -> Vec<EdgeDefinition> {
    let mut edges = Vec::new();
    for child in 1..count {
        let parents = rng.random_range(1..=max_parents.min(child));
        for parent in index::sample(rng, child, parents) {
            edges.push(EdgeDefinition {
                src_node: node_id(parent),
                dst_node: node_id(child),
                src_to_dst_data_keys: BTreeMap::from([("value".to_string(), "value".to_string())]),
            });
        }
    }
    edges
}
