pub mod features;
pub mod kmeans;
pub mod scaler;

pub use features::{extract_features, patent_features, FeatureMatrix, FEATURE_NAMES};
pub use kmeans::{choose_k, elbow_sweep, ElbowPoint, KMeans, KMeansModel};
pub use scaler::StandardScaler;

use anyhow::{bail, Result};
use pkg::KnowledgeGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

const TOP_FEATURES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Fixed number of clusters; chosen by the elbow sweep when unset
    pub k: Option<usize>,
    pub max_k: usize,
    pub seed: u64,
    pub n_init: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: None,
            max_k: 5,
            seed: kmeans::DEFAULT_SEED,
            n_init: kmeans::DEFAULT_N_INIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub name: String,
    /// Centroid coordinate in standardized space
    pub distinctiveness: f64,
    /// Raw mean of the feature over the cluster's patents
    pub mean_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: usize,
    pub patents: Vec<String>,
    pub size: usize,
    pub top_features: Vec<FeatureScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringResult {
    pub n_clusters: usize,
    pub inertia: f64,
    pub assignments: BTreeMap<String, usize>,
    pub clusters: Vec<Cluster>,
    /// Empty when K was given
    pub elbow: Vec<ElbowPoint>,
}

/// Groups patents by the shape of their subgraphs.
pub struct PatentClusterer {
    features: FeatureMatrix,
    config: ClusteringConfig,
}

impl PatentClusterer {
    pub fn new(features: FeatureMatrix, config: ClusteringConfig) -> Self {
        Self { features, config }
    }

    pub fn from_graph(graph: &KnowledgeGraph, config: ClusteringConfig) -> Self {
        Self::new(extract_features(graph), config)
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    fn template(&self) -> KMeans {
        KMeans::new(1)
            .with_seed(self.config.seed)
            .with_n_init(self.config.n_init)
    }

    /// Cluster with `k`, or with the config's K, or with the elbow knee.
    pub fn cluster(&self, k: Option<usize>) -> Result<ClusteringResult> {
        if self.features.is_empty() {
            bail!("No patents to cluster");
        }

        // Step 1: standardize
        let (_, scaled) = StandardScaler::fit_transform(&self.features.rows)?;

        // Step 2: pick K
        let (k, elbow) = match k.or(self.config.k) {
            Some(k) => (k, Vec::new()),
            None => {
                let points = elbow_sweep(&scaled, self.config.max_k, &self.template())?;
                (choose_k(&points), points)
            }
        };

        info!(patents = self.features.len(), k, "Clustering patents");

        // Step 3: fit
        let model = KMeans {
            k,
            ..self.template()
        }
        .fit(&scaled)?;

        // Step 4: describe clusters
        let mut assignments = BTreeMap::new();
        for (id, &label) in self.features.patent_ids.iter().zip(&model.labels) {
            assignments.insert(id.clone(), label);
        }

        let clusters = (0..k)
            .map(|cluster| self.describe(cluster, &model))
            .collect();

        Ok(ClusteringResult {
            n_clusters: k,
            inertia: model.inertia,
            assignments,
            clusters,
            elbow,
        })
    }

    fn describe(&self, cluster: usize, model: &KMeansModel) -> Cluster {
        let members: Vec<usize> = model
            .labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == cluster)
            .map(|(i, _)| i)
            .collect();

        let centroid = &model.centroids[cluster];
        let mut ranked: Vec<usize> = (0..centroid.len()).collect();
        // stable sort keeps feature order among equal scores
        ranked.sort_by(|&a, &b| centroid[b].abs().total_cmp(&centroid[a].abs()));

        let top_features = ranked
            .into_iter()
            .take(TOP_FEATURES)
            .map(|f| {
                let mean_value = if members.is_empty() {
                    0.0
                } else {
                    members.iter().map(|&i| self.features.rows[i][f]).sum::<f64>()
                        / members.len() as f64
                };

                FeatureScore {
                    name: self.features.feature_names[f].clone(),
                    distinctiveness: centroid[f].abs(),
                    mean_value,
                }
            })
            .collect();

        Cluster {
            id: cluster,
            patents: members
                .iter()
                .map(|&i| self.features.patent_ids[i].clone())
                .collect(),
            size: members.len(),
            top_features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::sample_graph;

    #[test]
    fn test_cluster_with_fixed_k() {
        let clusterer = PatentClusterer::from_graph(&sample_graph(), ClusteringConfig::default());
        let result = clusterer.cluster(Some(2)).unwrap();

        assert_eq!(result.n_clusters, 2);
        assert!(result.elbow.is_empty());
        assert_eq!(result.assignments.len(), 6);

        // the three star-shaped patents end up together
        let a = result.assignments["A0"];
        assert_eq!(result.assignments["A1"], a);
        assert_eq!(result.assignments["A2"], a);
        assert_ne!(result.assignments["B0"], a);

        let sizes: usize = result.clusters.iter().map(|c| c.size).sum();
        assert_eq!(sizes, 6);
        assert!(result.clusters.iter().all(|c| c.top_features.len() == 5));
    }

    #[test]
    fn test_clustering_is_reproducible() {
        let graph = sample_graph();
        let config = ClusteringConfig::default();

        let first = PatentClusterer::from_graph(&graph, config.clone()).cluster(None).unwrap();
        let second = PatentClusterer::from_graph(&graph, config).cluster(None).unwrap();

        assert_eq!(first, second);
        let ks: Vec<_> = first.elbow.iter().map(|p| p.k).collect();
        assert_eq!(ks, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_single_patent_gets_one_cluster() {
        let graph = sample_graph().subgraph("A0");
        let result = PatentClusterer::from_graph(&graph, ClusteringConfig::default())
            .cluster(None)
            .unwrap();

        assert_eq!(result.n_clusters, 1);
        assert_eq!(result.clusters[0].patents, vec!["A0".to_string()]);
    }

    #[test]
    fn test_empty_graph_is_an_error() {
        let clusterer = PatentClusterer::from_graph(&KnowledgeGraph::new(), ClusteringConfig::default());
        assert!(clusterer.cluster(Some(2)).is_err());
    }
}
