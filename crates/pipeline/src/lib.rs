pub mod batch;
pub mod categories;
pub mod config;
pub mod report;

pub use batch::{
    analyze_similarity, build_graph, categorize_directory, categorize_record, cluster_patents,
    extract_directory, extract_from_source, load_graph, ItemFailure, Stage, StageReport,
    TaxonomyReport,
};
pub use categories::{
    category_statistics, group_by_category, write_csv, CategoryGroup, CategoryOverview,
    CategoryStatistics, GroupMember,
};
pub use config::{PipelineConfig, SimilarityConfig};
pub use report::{render_markdown, PipelineSummary, SUMMARY_FILE};

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Run every stage in order and write the markdown summary.
pub async fn run_all(config: &PipelineConfig) -> Result<PipelineSummary> {
    let mut summary = PipelineSummary::default();

    // Step 1: extract
    summary.stages.push(extract_directory(config).await?);

    // Step 2: build
    let (graph, build) = build_graph(config)?;
    summary.stages.push(build);
    summary.graph = Some(graph.stats());

    // Step 3: analyze
    if graph.is_empty() {
        warn!("Knowledge graph is empty, skipping similarity and clustering");
    } else {
        let (results, report) = analyze_similarity(&graph, config)?;
        summary.similarity = results;
        summary.stages.push(report);

        let (clustering, report) = cluster_patents(&graph, config, None)?;
        summary.clustering = Some(clustering);
        summary.stages.push(report);
    }

    // Step 4: categorize
    let (categories, report) = categorize_directory(config).await?;
    summary.categories = categories;
    summary.stages.push(report);

    let path = config.results_dir.join(SUMMARY_FILE);
    std::fs::write(&path, render_markdown(&summary, config.similarity.top_n))
        .context(format!("Failed to write summary: {:?}", path))?;
    info!(path = %path.display(), "Pipeline finished");

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::tests::sample_config;

    #[tokio::test]
    async fn test_run_all() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = sample_config(dir.path());
        config.clustering.k = Some(2);

        let summary = run_all(&config).await.unwrap();

        let stages: Vec<Stage> = summary.stages.iter().map(|s| s.stage).collect();
        assert_eq!(stages.first(), Some(&Stage::Extract));
        assert_eq!(stages.last(), Some(&Stage::Categorize));
        assert_eq!(summary.categories.len(), 3);
        assert!(config.results_dir.join(SUMMARY_FILE).is_file());

        let markdown = std::fs::read_to_string(config.results_dir.join(SUMMARY_FILE)).unwrap();
        assert!(markdown.contains("## Taxonomy"));
    }
}
