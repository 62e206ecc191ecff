use extract::EntityKind;
use pkg::{KnowledgeGraph, Relation};
use serde::{Deserialize, Serialize};

pub const FEATURE_NAMES: [&str; 20] = [
    "count_R",
    "count_F",
    "count_S",
    "count_L",
    "ratio_R",
    "ratio_F",
    "ratio_S",
    "ratio_L",
    "edges_addresses",
    "edges_uses",
    "edges_located_at",
    "edges_occurs_at",
    "total_nodes",
    "total_edges",
    "density",
    "avg_degree",
    "max_degree",
    "std_degree",
    "num_components",
    "centralization",
];

/// One feature row per patent, rows in patent id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub patent_ids: Vec<String>,
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, patent_id: &str) -> Option<&[f64]> {
        self.patent_ids
            .iter()
            .position(|id| id == patent_id)
            .map(|i| self.rows[i].as_slice())
    }
}

pub fn extract_features(graph: &KnowledgeGraph) -> FeatureMatrix {
    let patent_ids = graph.patent_ids();
    let rows = patent_ids
        .iter()
        .map(|id| patent_features(&graph.subgraph(id)))
        .collect();

    FeatureMatrix {
        patent_ids,
        feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
        rows,
    }
}

/// The 20 features of a single patent subgraph, in `FEATURE_NAMES` order.
pub fn patent_features(subgraph: &KnowledgeGraph) -> Vec<f64> {
    let mut features = Vec::with_capacity(FEATURE_NAMES.len());

    // Step 1: node counts and ratios per kind
    let kinds = subgraph.kind_counts();
    let total_nodes = subgraph.node_count();

    for kind in EntityKind::ALL {
        features.push(kinds[&kind] as f64);
    }
    for kind in EntityKind::ALL {
        let ratio = if total_nodes > 0 {
            kinds[&kind] as f64 / total_nodes as f64
        } else {
            0.0
        };
        features.push(ratio);
    }

    // Step 2: edge counts per relation
    let relations = subgraph.relation_counts();
    for relation in Relation::ALL {
        features.push(relations[&relation] as f64);
    }

    // Step 3: topology
    features.push(total_nodes as f64);
    features.push(subgraph.edge_count() as f64);
    features.push(subgraph.density());

    // Step 4: degree distribution
    let degrees: Vec<f64> = subgraph.degrees().into_iter().map(|d| d as f64).collect();
    if degrees.is_empty() {
        features.extend([0.0, 0.0, 0.0]);
    } else {
        let mean = statistical::mean(&degrees);
        let max = degrees.iter().copied().fold(0.0, f64::max);
        let std = statistical::population_standard_deviation(&degrees, Some(mean));
        features.extend([mean, max, std]);
    }

    // Step 5: connectivity and centralization
    features.push(subgraph.weakly_connected_components() as f64);
    features.push(centralization(subgraph));

    features
}

/// `Σ(max_c - c_i) / ((n-1)(n-2))` over degree centrality
pub fn centralization(graph: &KnowledgeGraph) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }

    let max_possible = ((n - 1) * (n - 2)) as f64;
    if max_possible == 0.0 {
        return 0.0;
    }

    let values: Vec<f64> = graph.degree_centrality().into_iter().map(|(_, c)| c).collect();
    let max = values.iter().copied().fold(0.0, f64::max);

    values.iter().map(|c| max - c).sum::<f64>() / max_possible
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use extract::{Entity, EntitySet, ExtractionMethod, ExtractionResult, TextSources, TextView};
    use pkg::PkgBuilder;

    fn entity(kind: EntityKind, text: &str, offset: usize) -> Entity {
        Entity {
            text: text.to_string(),
            kind,
            category: String::new(),
            char_offset: offset,
            method: ExtractionMethod::LexiconMatch,
            view: TextView::FullText,
        }
    }

    /// Six patents in two obvious shapes: dense F-S-L stars and lone structures
    pub(crate) fn sample_graph() -> KnowledgeGraph {
        let mut builder = PkgBuilder::default();

        for i in 0..3 {
            let entities = EntitySet {
                functions: vec![entity(EntityKind::Function, "support the load", 0)],
                structures: vec![
                    entity(EntityKind::Structure, "spar cap", 10),
                    entity(EntityKind::Structure, "shear web", 20 + i),
                ],
                locations: vec![entity(EntityKind::Location, "at the root", 30)],
                ..Default::default()
            };
            builder
                .add_extraction(&ExtractionResult::new(
                    format!("A{}", i),
                    entities,
                    TextSources::default(),
                ))
                .unwrap();
        }

        for i in 0..3 {
            let mut structures = vec![entity(EntityKind::Structure, "coating", 0)];
            for j in 0..=i {
                structures.push(entity(EntityKind::Structure, "blade", 1000 * (j + 1)));
            }
            let entities = EntitySet {
                structures,
                ..Default::default()
            };
            builder
                .add_extraction(&ExtractionResult::new(
                    format!("B{}", i),
                    entities,
                    TextSources::default(),
                ))
                .unwrap();
        }

        builder.into_graph()
    }

    #[test]
    fn test_feature_vector_layout() {
        let graph = sample_graph();
        let matrix = extract_features(&graph);

        assert_eq!(matrix.patent_ids, vec!["A0", "A1", "A2", "B0", "B1", "B2"]);
        assert!(matrix.rows.iter().all(|r| r.len() == 20));

        let a0 = matrix.row("A0").unwrap();
        assert_eq!(&a0[0..4], &[0.0, 1.0, 2.0, 1.0]);
        assert_eq!(a0[5], 0.25);
        // F uses two structures, both located at the root, F occurs at the root
        assert_eq!(&a0[8..12], &[0.0, 2.0, 2.0, 1.0]);
        assert_eq!(a0[12], 4.0);
        assert_eq!(a0[13], 5.0);
        assert_eq!(a0[18], 1.0);
    }

    #[test]
    fn test_degree_features() {
        let graph = sample_graph();
        let a0 = patent_features(&graph.subgraph("A0"));

        // degrees: F=3, S=2, S=2, L=3
        assert_eq!(a0[15], 2.5);
        assert_eq!(a0[16], 3.0);
        assert!((a0[17] - 0.5).abs() < 1e-12);
        // centrality 1, 2/3, 2/3, 1 -> (1/3 + 1/3) / (3 * 2)
        assert!((a0[19] - (2.0 / 3.0) / 6.0).abs() < 1e-12);

        let b0 = patent_features(&graph.subgraph("B0"));
        assert_eq!(b0[13], 0.0);
        assert_eq!(b0[18], 2.0);
        assert_eq!(b0[19], 0.0);
    }

    #[test]
    fn test_features_are_reproducible() {
        let graph = sample_graph();
        assert_eq!(extract_features(&graph), extract_features(&graph));
    }

    #[test]
    fn test_empty_subgraph_features_are_zero() {
        let features = patent_features(&KnowledgeGraph::new());
        assert_eq!(features, vec![0.0; 20]);
    }
}
