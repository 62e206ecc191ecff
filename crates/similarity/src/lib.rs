pub mod metrics;

pub use metrics::{cosine, jaccard, size_similarity};

use anyhow::{Context, Result};
use extract::EntityKind;
use pkg::{KnowledgeGraph, Relation};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// What the analyzer needs to know about one patent subgraph.
#[derive(Debug, Clone, PartialEq)]
pub struct PatentProfile {
    pub patent_id: String,
    pub labels: BTreeSet<String>,
    pub stats: ProfileStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub nodes: usize,
    pub edges: usize,
    pub entity_types: BTreeMap<EntityKind, usize>,
    pub relations: BTreeMap<Relation, usize>,
}

impl PatentProfile {
    pub fn from_subgraph(patent_id: &str, subgraph: &KnowledgeGraph) -> Self {
        Self {
            patent_id: patent_id.to_string(),
            labels: subgraph
                .labels()
                .into_iter()
                .filter(|l| !l.is_empty())
                .collect(),
            stats: ProfileStats {
                nodes: subgraph.node_count(),
                edges: subgraph.edge_count(),
                entity_types: subgraph.kind_counts(),
                relations: subgraph.relation_counts(),
            },
        }
    }
}

/// Weights of the four sub-metrics in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub entity: f64,
    pub structure: f64,
    pub relation: f64,
    pub size: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            entity: 0.4,
            structure: 0.2,
            relation: 0.2,
            size: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentSimilarity {
    pub patent1: String,
    pub patent2: String,
    pub overall_similarity: f64,
    pub entity_similarity: f64,
    pub structure_similarity: f64,
    pub relation_similarity: f64,
    pub size_similarity: f64,
    pub graph1_stats: ProfileStats,
    pub graph2_stats: ProfileStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    pub patent1: String,
    pub patent2: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilaritySummary {
    pub pairs: usize,
    pub average_similarity: f64,
    pub most_similar: PairScore,
    pub least_similar: PairScore,
}

/// Descending by overall score, ties by id pair
fn by_score_desc(a: &PatentSimilarity, b: &PatentSimilarity) -> Ordering {
    b.overall_similarity
        .total_cmp(&a.overall_similarity)
        .then_with(|| a.patent1.cmp(&b.patent1))
        .then_with(|| a.patent2.cmp(&b.patent2))
}

/// Pairwise similarity over the per-patent subgraphs of a knowledge graph.
pub struct SimilarityAnalyzer {
    profiles: BTreeMap<String, PatentProfile>,
    weights: SimilarityWeights,
}

impl SimilarityAnalyzer {
    pub fn new(graph: &KnowledgeGraph) -> Self {
        let profiles: BTreeMap<_, _> = graph
            .patent_ids()
            .into_par_iter()
            .map(|id| {
                let profile = PatentProfile::from_subgraph(&id, &graph.subgraph(&id));
                (id, profile)
            })
            .collect();

        info!(patents = profiles.len(), "Built similarity profiles");

        Self {
            profiles,
            weights: SimilarityWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: SimilarityWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn patent_ids(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    pub fn profile(&self, patent_id: &str) -> Option<&PatentProfile> {
        self.profiles.get(patent_id)
    }

    fn profile_or_err(&self, patent_id: &str) -> Result<&PatentProfile> {
        self.profiles
            .get(patent_id)
            .context(format!("Unknown patent: {}", patent_id))
    }

    pub fn compare(&self, a: &PatentProfile, b: &PatentProfile) -> PatentSimilarity {
        let entity_similarity = jaccard(&a.labels, &b.labels);
        let structure_similarity = cosine(&a.stats.entity_types, &b.stats.entity_types);
        let relation_similarity = cosine(&a.stats.relations, &b.stats.relations);
        let size_similarity = size_similarity(
            (a.stats.nodes, b.stats.nodes),
            (a.stats.edges, b.stats.edges),
        );

        let w = &self.weights;
        let overall_similarity = w.entity * entity_similarity
            + w.structure * structure_similarity
            + w.relation * relation_similarity
            + w.size * size_similarity;

        PatentSimilarity {
            patent1: a.patent_id.clone(),
            patent2: b.patent_id.clone(),
            overall_similarity,
            entity_similarity,
            structure_similarity,
            relation_similarity,
            size_similarity,
            graph1_stats: a.stats.clone(),
            graph2_stats: b.stats.clone(),
        }
    }

    pub fn calculate(&self, patent1: &str, patent2: &str) -> Result<PatentSimilarity> {
        let a = self.profile_or_err(patent1)?;
        let b = self.profile_or_err(patent2)?;
        Ok(self.compare(a, b))
    }

    /// Every unordered pair once, most similar first.
    pub fn analyze_all_pairs(&self) -> Vec<PatentSimilarity> {
        let profiles: Vec<&PatentProfile> = self.profiles.values().collect();
        let pairs: Vec<(usize, usize)> = (0..profiles.len())
            .flat_map(|i| (i + 1..profiles.len()).map(move |j| (i, j)))
            .collect();

        info!(pairs = pairs.len(), "Calculating pairwise similarity");

        let mut results: Vec<PatentSimilarity> = pairs
            .par_iter()
            .map(|&(i, j)| self.compare(profiles[i], profiles[j]))
            .collect();

        results.sort_by(by_score_desc);
        results
    }

    pub fn most_similar(&self, patent_id: &str, top_n: usize) -> Result<Vec<PatentSimilarity>> {
        let target = self.profile_or_err(patent_id)?;

        let mut results: Vec<PatentSimilarity> = self
            .profiles
            .values()
            .filter(|p| p.patent_id != patent_id)
            .map(|p| self.compare(target, p))
            .collect();

        results.sort_by(by_score_desc);
        results.truncate(top_n);
        Ok(results)
    }
}

/// Average plus the extreme pairs of a result list; `None` when empty.
pub fn summarize(results: &[PatentSimilarity]) -> Option<SimilaritySummary> {
    let pair = |r: &PatentSimilarity| PairScore {
        patent1: r.patent1.clone(),
        patent2: r.patent2.clone(),
        score: r.overall_similarity,
    };

    let most = results
        .iter()
        .max_by(|a, b| a.overall_similarity.total_cmp(&b.overall_similarity))?;
    let least = results
        .iter()
        .min_by(|a, b| a.overall_similarity.total_cmp(&b.overall_similarity))?;

    let total: f64 = results.iter().map(|r| r.overall_similarity).sum();

    Some(SimilaritySummary {
        pairs: results.len(),
        average_similarity: total / results.len() as f64,
        most_similar: pair(most),
        least_similar: pair(least),
    })
}
