//! Graph Insights - command line
//!
//! Builds an entity graph from a JSON dataset and prints analysis results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use graph_insights::graph::{
    AnalyticsEngine, ColumnDescriptor, GraphBuilder, GraphQuery, GraphStore, Row,
};
use graph_insights::Config;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "graph-insights")]
#[command(about = "Entity graph analytics over tabular datasets")]
struct Cli {
    /// YAML config file (defaults to ./graph-insights.yaml)
    #[arg(short, long, global = true, env = "GRAPH_INSIGHTS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and print the report
    Analyze {
        /// Dataset file: {"columns": [...], "rows": [...]}
        file: PathBuf,

        /// Dataset id attached to every insight (defaults to the file stem)
        #[arg(short, long)]
        dataset_id: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Build the graph and print the nodes / relationships matching a pattern
    Query {
        file: PathBuf,

        /// e.g. "(n:Person)", "()-[r:LOCATED_IN]->()", "neighbors(#customer:A)"
        pattern: String,
    },

    /// Build the graph and print its whole-graph metrics
    Metrics { file: PathBuf },
}

/// On-disk dataset format.
#[derive(Debug, Deserialize)]
struct Dataset {
    columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    rows: Vec<Row>,
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let dataset: Dataset = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse dataset {}", path.display()))?;
    tracing::debug!(
        "Loaded {} rows, {} columns from {}",
        dataset.rows.len(),
        dataset.columns.len(),
        path.display()
    );
    Ok(dataset)
}

fn dataset_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string())
}

fn build_store(config: &Config, path: &Path) -> Result<GraphStore> {
    let dataset = load_dataset(path)?;
    let builder = GraphBuilder::new(config.builder.clone());
    Ok(builder.build(&dataset.rows, &dataset.columns, &dataset_id_for(path)))
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing (stderr, stdout carries the JSON output)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,graph_insights=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            file,
            dataset_id,
            pretty,
        } => {
            let dataset = load_dataset(&file)?;
            let dataset_id = dataset_id.unwrap_or_else(|| dataset_id_for(&file));
            let report = config
                .analyzer()
                .run(&dataset.rows, &dataset.columns, &dataset_id);
            tracing::info!(
                "Analysis of {} produced {} insights",
                dataset_id,
                report.insights.len()
            );
            print_json(&report, pretty)
        }
        Commands::Query { file, pattern } => {
            let query: GraphQuery = pattern
                .parse()
                .with_context(|| format!("Cannot parse pattern {:?}", pattern))?;
            let store = build_store(&config, &file)?;
            print_json(&store.query(&query), true)
        }
        Commands::Metrics { file } => {
            let store = build_store(&config, &file)?;
            print_json(&store.compute_metrics(), true)
        }
    }
}
