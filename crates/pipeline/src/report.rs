use communities::ClusteringResult;
use pkg::GraphStats;
use serde::{Deserialize, Serialize};
use similarity::{summarize, PatentSimilarity};
use std::fmt::Write;

use crate::batch::{StageReport, TaxonomyReport};
use crate::categories::group_by_category;

pub const SUMMARY_FILE: &str = "summary.md";

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub stages: Vec<StageReport>,
    pub graph: Option<GraphStats>,
    pub similarity: Vec<PatentSimilarity>,
    pub clustering: Option<ClusteringResult>,
    pub categories: Vec<TaxonomyReport>,
}

/// Markdown report of a run; `top_n` bounds the listed pairs.
pub fn render_markdown(summary: &PipelineSummary, top_n: usize) -> String {
    let mut out = String::from("# Patent Knowledge Graph Report\n\n");

    // Stages
    out.push_str("## Stages\n\n| Stage | Succeeded | Failed |\n|-------|-----------|--------|\n");
    for stage in &summary.stages {
        let _ = writeln!(out, "| {} | {} | {} |", stage.stage, stage.succeeded, stage.failed.len());
    }

    if let Some(graph) = &summary.graph {
        let _ = write!(
            out,
            "\n## Graph\n\n- Patents: {}\n- Nodes: {}\n- Edges: {}\n- Density: {:.4}\n",
            graph.num_patents, graph.total_nodes, graph.total_edges, graph.density
        );
        for (kind, count) in &graph.nodes_by_kind {
            let _ = writeln!(out, "- {:?} nodes: {}", kind, count);
        }
        for (relation, count) in &graph.edges_by_relation {
            let _ = writeln!(out, "- `{}` edges: {}", relation, count);
        }
    }

    if let Some(stats) = summarize(&summary.similarity) {
        let scores: Vec<f64> = summary
            .similarity
            .iter()
            .map(|r| r.overall_similarity)
            .collect();

        let _ = write!(
            out,
            "\n## Similarity\n\n- Pairs: {}\n- Average: {:.3}\n- Median: {:.3}\n",
            stats.pairs,
            stats.average_similarity,
            statistical::median(&scores)
        );
        if scores.len() > 1 {
            let _ = writeln!(
                out,
                "- Std deviation: {:.3}",
                statistical::standard_deviation(&scores, None)
            );
        }

        out.push_str("\n| Patent 1 | Patent 2 | Overall | Entity | Structure | Relation | Size |\n");
        out.push_str("|----------|----------|---------|--------|-----------|----------|------|\n");
        for pair in summary.similarity.iter().take(top_n) {
            let _ = writeln!(
                out,
                "| {} | {} | {:.3} | {:.3} | {:.3} | {:.3} | {:.3} |",
                pair.patent1,
                pair.patent2,
                pair.overall_similarity,
                pair.entity_similarity,
                pair.structure_similarity,
                pair.relation_similarity,
                pair.size_similarity
            );
        }
    }

    if let Some(clustering) = &summary.clustering {
        let _ = write!(
            out,
            "\n## Clusters\n\n- K: {}\n- Inertia: {:.3}\n",
            clustering.n_clusters, clustering.inertia
        );
        for cluster in &clustering.clusters {
            let features: Vec<&str> = cluster
                .top_features
                .iter()
                .map(|f| f.name.as_str())
                .collect();
            let _ = writeln!(
                out,
                "- Cluster {} ({} patents): {} [{}]",
                cluster.id,
                cluster.size,
                cluster.patents.join(", "),
                features.join(", ")
            );
        }
    }

    let groups = group_by_category(&summary.categories);
    if !groups.is_empty() {
        out.push_str("\n## Taxonomy\n\n| Principal category | Patents |\n|--------------------|---------|\n");
        for group in &groups {
            let _ = writeln!(out, "| {} | {} |", group.category, group.patents.len());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{ItemFailure, Stage};

    #[test]
    fn test_empty_summary_lists_stages_only() {
        let mut stage = StageReport::new(Stage::Extract);
        stage.succeeded = 2;
        stage.failed.push(ItemFailure {
            item: "broken.json".to_string(),
            error: "parse".to_string(),
        });

        let summary = PipelineSummary {
            stages: vec![stage],
            ..Default::default()
        };
        let markdown = render_markdown(&summary, 10);

        assert!(markdown.contains("| extract | 2 | 1 |"));
        assert!(!markdown.contains("## Similarity"));
        assert!(!markdown.contains("## Taxonomy"));
    }
}
