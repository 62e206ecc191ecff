use anyhow::{Context, Result};
use communities::{ClusteringResult, PatentClusterer};
use extract::{ExtractionResult, RfslExtractor};
use ingest::{FileReader, PatentRecord, PatentSource, is_safe_file_stem};
use pkg::{KnowledgeGraph, PkgBuilder, RFSL_SUFFIX};
use serde::{Deserialize, Serialize};
use similarity::{PatentSimilarity, SimilarityAnalyzer};
use std::fmt;
use std::path::Path;
use taxonomy::{
    code_scores, ensemble_rules, EnsembleDecision, FusedClassification, FusionWeights,
    KeywordScores, PatentCategorization, Taxonomy, TaxonomyFeatures,
};
use tracing::{info, warn};

use crate::categories::{self, CategoryOverview};
use crate::config::PipelineConfig;

pub const SIMILARITY_FILE: &str = "similarity_results.json";
pub const FEATURES_FILE: &str = "patent_features.json";
pub const CLUSTERING_FILE: &str = "clustering_results.json";
pub const CATEGORIZATION_FILE: &str = "categorization_results.json";
pub const CATEGORIZATION_CSV_FILE: &str = "categorization_results.csv";
pub const CATEGORY_OVERVIEW_FILE: &str = "category_overview.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Build,
    Similarity,
    Cluster,
    Categorize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Build => "build",
            Stage::Similarity => "similarity",
            Stage::Cluster => "cluster",
            Stage::Categorize => "categorize",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item: String,
    pub error: String,
}

/// Outcome of one stage; a failed item never aborts the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub succeeded: usize,
    pub failed: Vec<ItemFailure>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            succeeded: 0,
            failed: Vec::new(),
        }
    }

    fn fail(&mut self, item: impl Into<String>, error: impl fmt::Display) {
        let item = item.into();
        warn!(stage = %self.stage, item = %item, error = %error, "Item failed");
        self.failed.push(ItemFailure {
            item,
            error: error.to_string(),
        });
    }

    fn finish(self) -> Self {
        info!(
            stage = %self.stage,
            succeeded = self.succeeded,
            failed = self.failed.len(),
            "Stage finished"
        );
        self
    }
}

/// Taxonomy signals for one patent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyReport {
    pub categorization: PatentCategorization,
    pub features: TaxonomyFeatures,
    pub keywords: KeywordScores,
    pub fused: FusedClassification,
    pub ensemble: EnsembleDecision,
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize results")?;
    std::fs::write(path, json).context(format!("Failed to write results: {:?}", path))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).context(format!("Failed to create directory: {:?}", dir))
}

fn write_extractions(
    dir: &Path,
    extractions: &[ExtractionResult],
    report: &mut StageReport,
) -> Result<()> {
    ensure_dir(dir)?;

    for extraction in extractions {
        if !is_safe_file_stem(&extraction.patent_id) {
            report.fail(&extraction.patent_id, "patent id is not a valid file name");
            continue;
        }

        let path = dir.join(format!("{}{}", extraction.patent_id, RFSL_SUFFIX));
        match write_json(&path, extraction) {
            Ok(()) => report.succeeded += 1,
            Err(e) => report.fail(&extraction.patent_id, format!("{:#}", e)),
        }
    }

    Ok(())
}

fn extractor(config: &PipelineConfig) -> Result<RfslExtractor> {
    Ok(RfslExtractor::new(config.load_lexicon()?)?.with_description_limit(config.description_limit))
}

/// Extract every record in `raw_dir` into `rfsl_dir`.
pub async fn extract_directory(config: &PipelineConfig) -> Result<StageReport> {
    let extractor = extractor(config)?;
    let mut report = StageReport::new(Stage::Extract);

    // Step 1: read records
    let mut records = Vec::new();
    for (path, record) in FileReader::read_directory(&config.raw_dir).await? {
        match record {
            Ok(record) => records.push(record),
            Err(e) => report.fail(path.display().to_string(), format!("{:#}", e)),
        }
    }

    info!(records = records.len(), "Extracting RFSL entities");

    // Step 2: extract in parallel, write sequentially
    let extractions = extractor.extract_batch(&records);
    write_extractions(&config.rfsl_dir, &extractions, &mut report)?;

    Ok(report.finish())
}

/// Extract the listed patents fetched from `source`; unknown ids are failures.
pub async fn extract_from_source<S: PatentSource>(
    source: &S,
    patent_ids: &[String],
    config: &PipelineConfig,
) -> Result<StageReport> {
    let extractor = extractor(config)?;
    let mut report = StageReport::new(Stage::Extract);
    let mut records: Vec<PatentRecord> = Vec::new();

    for patent_id in patent_ids {
        match source.fetch(patent_id).await {
            Ok(Some(record)) => records.push(record),
            Ok(None) => report.fail(patent_id, "patent not found"),
            Err(e) => report.fail(patent_id, format!("{:#}", e)),
        }
    }

    let extractions = extractor.extract_batch(&records);
    write_extractions(&config.rfsl_dir, &extractions, &mut report)?;

    Ok(report.finish())
}

/// Build the graph from `rfsl_dir` and persist it under `graph_dir`.
pub fn build_graph(config: &PipelineConfig) -> Result<(KnowledgeGraph, StageReport)> {
    let mut builder = PkgBuilder::new(config.build);
    let build = builder.build_from_dir(&config.rfsl_dir)?;

    let mut report = StageReport::new(Stage::Build);
    report.succeeded = build.patents.len();
    report.failed = build
        .failures
        .into_iter()
        .map(|f| ItemFailure {
            item: f.source,
            error: f.error,
        })
        .collect();

    let graph = builder.into_graph();
    ensure_dir(&config.graph_dir)?;
    graph.save(&config.graph_path())?;
    graph.save_plain(&config.plain_graph_path())?;

    Ok((graph, report.finish()))
}

pub fn load_graph(config: &PipelineConfig) -> Result<KnowledgeGraph> {
    let path = config.graph_path();
    let graph = KnowledgeGraph::load(&path)?;
    info!(path = %path.display(), nodes = graph.node_count(), "Loaded knowledge graph");
    Ok(graph)
}

/// All-pairs similarity, written sorted to `results_dir`.
pub fn analyze_similarity(
    graph: &KnowledgeGraph,
    config: &PipelineConfig,
) -> Result<(Vec<PatentSimilarity>, StageReport)> {
    let results = SimilarityAnalyzer::new(graph).analyze_all_pairs();

    ensure_dir(&config.results_dir)?;
    write_json(&config.results_dir.join(SIMILARITY_FILE), &results)?;

    let mut report = StageReport::new(Stage::Similarity);
    report.succeeded = results.len();
    Ok((results, report.finish()))
}

/// Cluster patents with `k`, the configured K, or the elbow knee.
pub fn cluster_patents(
    graph: &KnowledgeGraph,
    config: &PipelineConfig,
    k: Option<usize>,
) -> Result<(ClusteringResult, StageReport)> {
    let clusterer = PatentClusterer::from_graph(graph, config.clustering.clone());
    let result = clusterer.cluster(k)?;

    ensure_dir(&config.results_dir)?;
    write_json(&config.results_dir.join(FEATURES_FILE), clusterer.features())?;
    write_json(&config.results_dir.join(CLUSTERING_FILE), &result)?;

    let mut report = StageReport::new(Stage::Cluster);
    report.succeeded = result.assignments.len();
    Ok((result, report.finish()))
}

pub fn categorize_record(taxonomy: &Taxonomy, record: &PatentRecord) -> TaxonomyReport {
    let categorization = taxonomy.categorize_patent(record);
    let features = taxonomy.feature_vector(&categorization.categorization);
    let keywords = taxonomy.keyword_scores(record);
    let fused = taxonomy.fuse_scores(
        &keywords.scores,
        &code_scores(&categorization.categorization),
        FusionWeights::default(),
    );
    let ensemble = ensemble_rules(&keywords, &categorization.categorization);

    TaxonomyReport {
        categorization,
        features,
        keywords,
        fused,
        ensemble,
    }
}

/// Categorize every record in `raw_dir` by its classification codes and
/// write the per-patent results, a CSV table and the category overview.
pub async fn categorize_directory(
    config: &PipelineConfig,
) -> Result<(Vec<TaxonomyReport>, StageReport)> {
    let taxonomy = Taxonomy::from_version(config.taxonomy);
    let mut report = StageReport::new(Stage::Categorize);
    let mut results = Vec::new();

    for (path, record) in FileReader::read_directory(&config.raw_dir).await? {
        match record {
            Ok(record) => {
                results.push(categorize_record(&taxonomy, &record));
                report.succeeded += 1;
            }
            Err(e) => report.fail(path.display().to_string(), format!("{:#}", e)),
        }
    }

    ensure_dir(&config.results_dir)?;
    write_json(&config.results_dir.join(CATEGORIZATION_FILE), &results)?;
    categories::write_csv(&config.results_dir.join(CATEGORIZATION_CSV_FILE), &taxonomy, &results)?;

    let overview = CategoryOverview {
        statistics: categories::category_statistics(&taxonomy, &results),
        groups: categories::group_by_category(&results),
    };
    write_json(&config.results_dir.join(CATEGORY_OVERVIEW_FILE), &overview)?;

    Ok((results, report.finish()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ingest::DirectorySource;

    pub(crate) fn write_record(dir: &Path, id: &str, title: &str, abstract_text: &str, codes: &[&str]) {
        let record = serde_json::json!({
            "patent_id": id,
            "title": title,
            "abstract": abstract_text,
            "claims": ["A blade comprising a spar cap and a shear web."],
            "description": "The spar cap is bonded to the shear web near the root.",
            "cpc_codes": codes,
        });
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(format!("{}.json", id)), record.to_string()).unwrap();
    }

    pub(crate) fn sample_config(base: &Path) -> PipelineConfig {
        let config = PipelineConfig::with_base_dir(base);
        write_record(
            &config.raw_dir,
            "US1",
            "Wind turbine blade with spar cap",
            "A spar cap reduces the bending load at the blade root.",
            &["F03D1/0675"],
        );
        write_record(
            &config.raw_dir,
            "US2",
            "Blade with serrated trailing edge",
            "Serrations at the trailing edge reduce noise near the tip.",
            &["F05B2240/3042", "F03D7/0296"],
        );
        write_record(
            &config.raw_dir,
            "US3",
            "Pitch bearing for a rotor blade",
            "The pitch bearing connects the blade root to the hub.",
            &["F03D7/0224"],
        );
        config
    }

    #[tokio::test]
    async fn test_extract_writes_one_file_per_patent() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(dir.path());
        std::fs::write(config.raw_dir.join("broken.json"), "{ not json").unwrap();

        let report = extract_directory(&config).await.unwrap();

        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].item.ends_with("broken.json"));
        assert!(config.rfsl_dir.join("US1_rfsl.json").is_file());
    }

    #[tokio::test]
    async fn test_extract_from_source_reports_unknown_ids() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(dir.path());
        let source = DirectorySource::new(config.raw_dir.clone());

        let ids = vec!["US2".to_string(), "US9".to_string()];
        let report = extract_from_source(&source, &ids, &config).await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed[0].item, "US9");
        assert!(config.rfsl_dir.join("US2_rfsl.json").is_file());
        assert!(!config.rfsl_dir.join("US1_rfsl.json").exists());
    }

    #[tokio::test]
    async fn test_build_persists_graph() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(dir.path());
        extract_directory(&config).await.unwrap();

        let (graph, report) = build_graph(&config).unwrap();
        assert_eq!(report.succeeded, 3);
        assert!(report.failed.is_empty());

        let loaded = load_graph(&config).unwrap();
        assert_eq!(loaded.node_count(), graph.node_count());
        assert_eq!(loaded.edge_count(), graph.edge_count());
        assert!(config.plain_graph_path().is_file());
    }

    #[tokio::test]
    async fn test_categorize_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(dir.path());

        let (results, report) = categorize_directory(&config).await.unwrap();
        assert_eq!(report.succeeded, 3);

        let us2 = results
            .iter()
            .find(|r| r.categorization.patent_id == "US2")
            .unwrap();
        assert_eq!(us2.categorization.categorization.total_matched, 2);
        assert!(config.results_dir.join(CATEGORIZATION_FILE).is_file());
        assert!(config.results_dir.join(CATEGORIZATION_CSV_FILE).is_file());

        let overview: CategoryOverview = serde_json::from_str(
            &std::fs::read_to_string(config.results_dir.join(CATEGORY_OVERVIEW_FILE)).unwrap(),
        )
        .unwrap();
        let grouped: usize = overview.groups.iter().map(|g| g.patents.len()).sum();
        assert_eq!(grouped, 3);
        assert_eq!(overview.statistics.len(), 10);
    }

    #[tokio::test]
    async fn test_categorize_with_second_taxonomy() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = sample_config(dir.path());
        config.taxonomy = taxonomy::TaxonomyVersion::V2;

        let (results, _) = categorize_directory(&config).await.unwrap();
        let us3 = results
            .iter()
            .find(|r| r.categorization.patent_id == "US3")
            .unwrap();
        assert_eq!(us3.categorization.categorization.principal.as_deref(), Some("control"));
        assert_eq!(us3.features.scores.len(), 7);
    }

    #[tokio::test]
    async fn test_extract_skips_ids_that_escape_the_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(dir.path());
        std::fs::write(
            config.raw_dir.join("escape.json"),
            r#"{"patent_id": "../escape", "title": "Blade with spar cap"}"#,
        )
        .unwrap();

        let report = extract_directory(&config).await.unwrap();

        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].item, "../escape");
        assert!(!dir.path().join("escape_rfsl.json").exists());
    }

    #[test]
    fn test_build_from_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::with_base_dir(dir.path());
        assert!(build_graph(&config).is_err());
    }
}
