use clap::{Parser, Subcommand, ValueEnum};
use dagflow::islands::islands;
use dagflow::prelude::*;
use dagflow::validation::validate;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Command line front end for the dagflow execution engine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a graph payload for malformed input, cycles and islands
    Validate { graph_path: PathBuf },
    /// Print the execution order of a graph
    Toposort { graph_path: PathBuf },
    /// Print the nodes of a graph grouped by level
    Levels { graph_path: PathBuf },
    /// Print the islands formed by the nodes a run configuration enables
    Islands {
        graph_path: PathBuf,
        /// Run configuration JSON; every node is enabled when omitted
        config_path: Option<PathBuf>,
    },
    /// Execute a graph with a run configuration
    Run {
        graph_path: PathBuf,
        config_path: PathBuf,

        /// Snapshot file to load the store from and save it back to
        #[arg(long, env = "DAGFLOW_SNAPSHOT")]
        snapshot: Option<PathBuf>,

        /// How run records reach the store
        #[arg(long, value_enum, env = "DAGFLOW_COMMIT_MODE", default_value = "atomic")]
        commit_mode: CommitModeCli,
    },
    /// Print the recorded outputs of a run from a snapshot
    Show {
        snapshot: PathBuf,
        run_id: String,

        /// Only print the output of this node
        #[arg(long, conflicts_with = "leaves")]
        node: Option<String>,

        /// Only print the outputs of leaf nodes
        #[arg(long)]
        leaves: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CommitModeCli {
    Atomic,
    Incremental,
}

impl From<CommitModeCli> for CommitMode {
    fn from(mode: CommitModeCli) -> Self {
        match mode {
            CommitModeCli::Atomic => CommitMode::Atomic,
            CommitModeCli::Incremental => CommitMode::Incremental,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { graph_path } => run_validate(&graph_path),
        Command::Toposort { graph_path } => run_toposort(&graph_path),
        Command::Levels { graph_path } => run_levels(&graph_path),
        Command::Islands {
            graph_path,
            config_path,
        } => run_islands(&graph_path, config_path.as_deref()),
        Command::Run {
            graph_path,
            config_path,
            snapshot,
            commit_mode,
        } => run_graph(&graph_path, &config_path, snapshot.as_deref(), commit_mode.into()),
        Command::Show {
            snapshot,
            run_id,
            node,
            leaves,
        } => run_show(&snapshot, &run_id, node.as_deref(), leaves),
    }
}

fn load_definition(path: &Path) -> GraphDefinition {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read graph file '{}': {}",
            path.display(),
            e
        ))
    });
    GraphDefinition::from_json(&text)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse graph JSON: {}", e)))
}

fn load_graph(path: &Path) -> Graph {
    load_definition(path)
        .into_graph()
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid graph: {}", e)))
}

fn load_config(path: &Path) -> RunConfig {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read run configuration '{}': {}",
            path.display(),
            e
        ))
    });
    RunConfig::from_json(&text)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid run configuration: {}", e)))
}

fn run_validate(graph_path: &Path) {
    let graph = load_graph(graph_path);
    match validate(&graph) {
        Ok(()) => println!(
            "Graph is valid: {} nodes, {} edges",
            graph.len(),
            graph.edges().len()
        ),
        Err(e) => exit_with_error(&format!("Graph rejected: {}", e)),
    }
}

fn run_toposort(graph_path: &Path) {
    let graph = load_graph(graph_path);
    let order = topological_order(&graph)
        .unwrap_or_else(|e| exit_with_error(&format!("Cannot schedule graph: {}", e)));
    for (position, node_id) in order.iter().enumerate() {
        println!("{:>4}  {}", position, node_id);
    }
}

fn run_levels(graph_path: &Path) {
    let graph = load_graph(graph_path);
    let levels = levels(&graph)
        .unwrap_or_else(|e| exit_with_error(&format!("Cannot schedule graph: {}", e)));
    for (level, nodes) in &levels {
        println!("Level {}: {}", level, nodes.join(", "));
    }
}

fn run_islands(graph_path: &Path, config_path: Option<&Path>) {
    let graph = load_graph(graph_path);
    let enabled = match config_path {
        Some(path) => load_config(path).enabled_set(&graph),
        None => EnabledSet::all(&graph),
    };
    let found = islands(&graph, &enabled);
    println!("{} island(s)", found.len());
    for (i, island) in found.iter().enumerate() {
        println!("  {}: {}", i + 1, island.join(", "));
    }
}

fn run_graph(
    graph_path: &Path,
    config_path: &Path,
    snapshot: Option<&Path>,
    commit_mode: CommitMode,
) {
    let total_start = Instant::now();

    let definition = load_definition(graph_path);
    let config = load_config(config_path);
    let store = match snapshot {
        Some(path) if path.exists() => MemoryStore::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load snapshot: {}", e))),
        _ => MemoryStore::new(),
    };
    let existing = store.graph_by_name(&definition.name).map(|record| record.id);
    let mut engine = Engine::builder(store).commit_mode(commit_mode).build();

    let graph_id = match existing {
        Some(id) => {
            engine
                .update_graph(id, definition)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to update graph: {}", e)));
            id
        }
        None => engine
            .create_graph(definition)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to create graph: {}", e))),
    };

    let run_start = Instant::now();
    let report = engine
        .run_graph_with_report(graph_id, config)
        .unwrap_or_else(|e| exit_with_error(&format!("Run failed: {}", e)));
    let run_duration = run_start.elapsed();

    println!("{}", TraceFormatter::format_run(&report));

    if let Some(path) = snapshot {
        engine
            .store()
            .save(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save snapshot: {}", e)));
        println!("Snapshot written to '{}'", path.display());
    }

    println!("\n--- Performance Summary ---");
    println!("Execution:        {:?}", run_duration);
    println!("Total:            {:?}", total_start.elapsed());
}

fn run_show(snapshot: &Path, run_id: &str, node: Option<&str>, leaves: bool) {
    let run_id = Uuid::parse_str(run_id)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid run id '{}': {}", run_id, e)));
    let store = MemoryStore::from_file(snapshot)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load snapshot: {}", e)));
    let engine = Engine::builder(store).build();

    let outputs: Vec<&RunOutput> = match node {
        Some(node_id) => vec![
            engine
                .run_output(&run_id, node_id)
                .unwrap_or_else(|e| exit_with_error(&e.to_string())),
        ],
        None if leaves => engine
            .leaf_outputs(&run_id)
            .unwrap_or_else(|e| exit_with_error(&e.to_string())),
        None => engine
            .store()
            .run_outputs(&run_id)
            .unwrap_or_else(|e| exit_with_error(&e.to_string())),
    };

    let json = serde_json::to_string_pretty(&outputs)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to render outputs: {}", e)));
    println!("{}", json);
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
