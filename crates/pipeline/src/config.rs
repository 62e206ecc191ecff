use anyhow::{Context, Result};
use communities::ClusteringConfig;
use extract::Lexicon;
use ingest::DEFAULT_DESCRIPTION_LIMIT;
use pkg::BuildOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use taxonomy::TaxonomyVersion;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Downloaded patent records, one `{id}.json` per patent
    pub raw_dir: PathBuf,
    /// Extraction output, one `{id}_rfsl.json` per patent
    pub rfsl_dir: PathBuf,
    pub graph_dir: PathBuf,
    pub results_dir: PathBuf,
    /// Replacement vocabulary; the built-in wind blade lexicon when unset
    pub lexicon: Option<PathBuf>,
    /// Characters of the description fed to the extractor
    pub description_limit: usize,
    pub build: BuildOptions,
    pub clustering: ClusteringConfig,
    pub similarity: SimilarityConfig,
    /// Code taxonomy used by the categorize stage
    pub taxonomy: TaxonomyVersion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Pairs listed in the summary report
    pub top_n: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self { top_n: 10 }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            rfsl_dir: PathBuf::from("data/rfsl"),
            graph_dir: PathBuf::from("data/graph"),
            results_dir: PathBuf::from("data/results"),
            lexicon: None,
            description_limit: DEFAULT_DESCRIPTION_LIMIT,
            build: BuildOptions::default(),
            clustering: ClusteringConfig::default(),
            similarity: SimilarityConfig::default(),
            taxonomy: TaxonomyVersion::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from JSON; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config: {:?}", path))?;
        serde_json::from_str(&content).context(format!("Failed to parse config: {:?}", path))
    }

    /// Same layout rooted at `base`
    pub fn with_base_dir(base: &Path) -> Self {
        Self {
            raw_dir: base.join("raw"),
            rfsl_dir: base.join("rfsl"),
            graph_dir: base.join("graph"),
            results_dir: base.join("results"),
            ..Self::default()
        }
    }

    pub fn load_lexicon(&self) -> Result<Lexicon> {
        match &self.lexicon {
            Some(path) => Lexicon::from_json_file(path),
            None => Ok(Lexicon::wind_blade()),
        }
    }

    pub fn graph_path(&self) -> PathBuf {
        self.graph_dir.join(pkg::GRAPH_FILE)
    }

    pub fn plain_graph_path(&self) -> PathBuf {
        self.graph_dir.join(pkg::PLAIN_GRAPH_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();

        assert_eq!(config.description_limit, 10_000);
        assert_eq!(config.clustering.max_k, 5);
        assert_eq!(config.clustering.seed, 42);
        assert!(!config.build.align_requirement_offsets);
        assert_eq!(config.graph_path(), PathBuf::from("data/graph/pkg_complete.json"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(
            &path,
            r#"{"rfsl_dir": "out/rfsl", "build": {"align_requirement_offsets": true}, "clustering": {"k": 3, "max_k": 5, "seed": 7, "n_init": 10}}"#,
        )
        .unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.rfsl_dir, PathBuf::from("out/rfsl"));
        assert_eq!(config.raw_dir, PathBuf::from("data/raw"));
        assert!(config.build.align_requirement_offsets);
        assert_eq!(config.clustering.k, Some(3));
        assert_eq!(config.similarity.top_n, 10);
        assert_eq!(config.taxonomy, TaxonomyVersion::V1);
    }

    #[test]
    fn test_taxonomy_version_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{"taxonomy": "v2"}"#).unwrap();

        assert_eq!(PipelineConfig::from_file(&path).unwrap().taxonomy, TaxonomyVersion::V2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(PipelineConfig::from_file(Path::new("/nonexistent/pipeline.json")).is_err());
    }
}
