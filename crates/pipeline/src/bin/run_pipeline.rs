use anyhow::Result;
use clap::{Parser, Subcommand};
use ingest::{DirectorySource, FileReader};
use pipeline::{
    analyze_similarity, build_graph, categorize_directory, cluster_patents, extract_directory,
    extract_from_source, load_graph, render_markdown, run_all, PipelineConfig, PipelineSummary,
    StageReport,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "run_pipeline")]
#[command(about = "Patent RFSL knowledge graph batch pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file; defaults apply to missing fields
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root for raw/, rfsl/, graph/ and results/
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Align requirement offsets to the full text before building edges
    #[arg(long, global = true)]
    align_offsets: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract RFSL entities from raw patent records
    Extract {
        /// Only these patent ids (JSON list or one id per line)
        #[arg(long)]
        ids: Option<PathBuf>,
    },
    /// Build and persist the knowledge graph
    Build,
    /// Pairwise similarity over the persisted graph
    Similarity,
    /// Cluster patents over the persisted graph
    Cluster {
        /// Number of clusters; elbow knee when omitted
        #[arg(short)]
        k: Option<usize>,
    },
    /// Categorize raw records by classification code
    Categorize,
    /// Run every stage
    All,
}

fn print_stage(report: &StageReport) {
    println!(
        "{}: {} succeeded, {} failed",
        report.stage,
        report.succeeded,
        report.failed.len()
    );
    for failure in &report.failed {
        println!("  {} -> {}", failure.item, failure.error);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        let layout = PipelineConfig::with_base_dir(dir);
        config.raw_dir = layout.raw_dir;
        config.rfsl_dir = layout.rfsl_dir;
        config.graph_dir = layout.graph_dir;
        config.results_dir = layout.results_dir;
    }
    if cli.align_offsets {
        config.build.align_requirement_offsets = true;
    }

    match cli.command {
        Commands::Extract { ids } => {
            let report = match ids {
                Some(path) => {
                    let ids = FileReader::read_id_list(&path).await?;
                    let source = DirectorySource::new(config.raw_dir.clone());
                    extract_from_source(&source, &ids, &config).await?
                }
                None => extract_directory(&config).await?,
            };
            print_stage(&report);
        }
        Commands::Build => {
            let (graph, report) = build_graph(&config)?;
            print_stage(&report);
            println!("{}", serde_json::to_string_pretty(&graph.stats())?);
        }
        Commands::Similarity => {
            let graph = load_graph(&config)?;
            let (results, report) = analyze_similarity(&graph, &config)?;
            print_stage(&report);

            let summary = PipelineSummary {
                similarity: results,
                ..Default::default()
            };
            print!("{}", render_markdown(&summary, config.similarity.top_n));
        }
        Commands::Cluster { k } => {
            let graph = load_graph(&config)?;
            let (result, report) = cluster_patents(&graph, &config, k)?;
            print_stage(&report);

            for cluster in &result.clusters {
                println!("Cluster {} ({}): {}", cluster.id, cluster.size, cluster.patents.join(", "));
            }
        }
        Commands::Categorize => {
            let (results, report) = categorize_directory(&config).await?;
            print_stage(&report);

            for result in &results {
                let c = &result.categorization;
                println!(
                    "{}: {} ({}/{} codes matched)",
                    c.patent_id,
                    c.principal_name.as_deref().unwrap_or("uncategorized"),
                    c.categorization.total_matched,
                    c.categorization.total_input
                );
            }
        }
        Commands::All => {
            let summary = run_all(&config).await?;
            for stage in &summary.stages {
                print_stage(stage);
            }
        }
    }

    Ok(())
}
