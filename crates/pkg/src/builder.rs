use anyhow::Result;
use extract::{normalize_label, EntityKind, ExtractionResult, TextView};
use ingest::FileReader;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

use crate::error::BuildError;
use crate::model::{GraphEdge, GraphNode, PROXIMITY_RULES};
use crate::store::KnowledgeGraph;

/// Suffix of extraction output files
pub const RFSL_SUFFIX: &str = "_rfsl.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Move requirement offsets from the abstract+title view into the
    /// full-text view before applying the proximity rules
    #[serde(default)]
    pub align_requirement_offsets: bool,
}

/// Nodes and edges of one patent, ready to merge.
#[derive(Debug, Clone, PartialEq)]
pub struct PatentSubgraph {
    pub patent_id: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentBuildStats {
    pub patent_id: String,
    pub nodes: usize,
    pub edges: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildFailure {
    pub source: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub patents: Vec<PatentBuildStats>,
    pub failures: Vec<BuildFailure>,
}

/// Turn one extraction record into its patent subgraph.
pub fn build_patent_subgraph(
    extraction: &ExtractionResult,
    options: &BuildOptions,
) -> Result<PatentSubgraph, BuildError> {
    let patent_id = extraction.patent_id.trim();
    if patent_id.is_empty() {
        return Err(BuildError::MissingField("patent_id"));
    }

    // Step 1: one node per entity, kinds in R, F, S, L order
    let mut nodes = Vec::with_capacity(extraction.entities.total());
    let mut occurrences: HashMap<(EntityKind, String), usize> = HashMap::new();

    for kind in EntityKind::ALL {
        for (seq, entity) in extraction.entities.of_kind(kind).iter().enumerate() {
            let label = normalize_label(&entity.text);
            let seen = occurrences.entry((kind, label.clone())).or_insert(0);

            let (char_offset, view) =
                if options.align_requirement_offsets && entity.view != TextView::FullText {
                    let offset = extraction.text_sources.map_offset(
                        entity.char_offset,
                        entity.view,
                        TextView::FullText,
                    );
                    (offset, TextView::FullText)
                } else {
                    (entity.char_offset, entity.view)
                };

            nodes.push(GraphNode {
                id: format!("{}_{}_{}", patent_id, kind.tag(), seq),
                label,
                kind,
                patent_id: patent_id.to_string(),
                category: entity.category.clone(),
                char_offset,
                view,
                occurrence: *seen,
            });
            *seen += 1;
        }
    }

    // Step 2: proximity rules over char offsets
    let mut edges = Vec::new();
    for rule in PROXIMITY_RULES {
        for source in nodes.iter().filter(|n| n.kind == rule.source) {
            for target in nodes.iter().filter(|n| n.kind == rule.target) {
                if rule.applies(source.char_offset, target.char_offset) {
                    edges.push(GraphEdge {
                        source: source.id.clone(),
                        target: target.id.clone(),
                        relation: rule.relation,
                    });
                }
            }
        }
    }

    Ok(PatentSubgraph {
        patent_id: patent_id.to_string(),
        nodes,
        edges,
    })
}

/// Read an extraction file, naming the first missing required field.
pub fn load_extraction(path: &Path) -> Result<ExtractionResult, BuildError> {
    let content = std::fs::read_to_string(path).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| BuildError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    match value.get("patent_id").and_then(|v| v.as_str()) {
        Some(id) if !id.trim().is_empty() => {}
        _ => return Err(BuildError::MissingField("patent_id")),
    }
    if value.get("entities").is_none() {
        return Err(BuildError::MissingField("entities"));
    }

    serde_json::from_value(value).map_err(|source| BuildError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Single-writer merge of patent subgraphs into one knowledge graph.
pub struct PkgBuilder {
    graph: KnowledgeGraph,
    options: BuildOptions,
    merged: HashSet<String>,
}

impl PkgBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            graph: KnowledgeGraph::new(),
            options,
            merged: HashSet::new(),
        }
    }

    /// Continue merging into an existing graph; its patents count as merged.
    pub fn from_graph(graph: KnowledgeGraph, options: BuildOptions) -> Self {
        let merged = graph.patent_ids().into_iter().collect();
        Self {
            graph,
            options,
            merged,
        }
    }

    pub fn add_extraction(
        &mut self,
        extraction: &ExtractionResult,
    ) -> Result<PatentBuildStats, BuildError> {
        let subgraph = build_patent_subgraph(extraction, &self.options)?;
        self.add_subgraph(subgraph)
    }

    /// Merge one patent; a patent id seen before is rejected.
    pub fn add_subgraph(
        &mut self,
        subgraph: PatentSubgraph,
    ) -> Result<PatentBuildStats, BuildError> {
        if !self.merged.insert(subgraph.patent_id.clone()) {
            return Err(BuildError::DuplicatePatent(subgraph.patent_id));
        }

        let stats = PatentBuildStats {
            patent_id: subgraph.patent_id,
            nodes: subgraph.nodes.len(),
            edges: subgraph.edges.len(),
        };

        self.graph.add_patent(&stats.patent_id);
        for node in subgraph.nodes {
            self.graph.add_node(node);
        }
        for edge in &subgraph.edges {
            self.graph.add_edge(&edge.source, &edge.target, edge.relation);
        }

        Ok(stats)
    }

    /// Build subgraphs in parallel, then merge them in input order.
    pub fn add_batch(&mut self, extractions: &[ExtractionResult]) -> BuildReport {
        let options = self.options;
        let subgraphs: Vec<_> = extractions
            .par_iter()
            .map(|e| (e.patent_id.clone(), build_patent_subgraph(e, &options)))
            .collect();

        let mut report = BuildReport::default();
        for (patent_id, subgraph) in subgraphs {
            match subgraph.and_then(|s| self.add_subgraph(s)) {
                Ok(stats) => report.patents.push(stats),
                Err(e) => {
                    warn!(patent_id = %patent_id, error = %e, "Skipping extraction record");
                    report.failures.push(BuildFailure {
                        source: patent_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Load every `*_rfsl.json` file in `dir`; malformed files are skipped.
    pub fn build_from_dir(&mut self, dir: &Path) -> Result<BuildReport> {
        let files = FileReader::list_json_files(dir, RFSL_SUFFIX, &[])?;
        info!(dir = %dir.display(), files = files.len(), "Building knowledge graph");

        let mut extractions = Vec::new();
        let mut failures = Vec::new();

        for path in files {
            match load_extraction(&path) {
                Ok(extraction) => extractions.push(extraction),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping extraction file");
                    failures.push(BuildFailure {
                        source: path.display().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let mut report = self.add_batch(&extractions);
        failures.append(&mut report.failures);
        report.failures = failures;

        let stats = self.graph.stats();
        info!(
            patents = report.patents.len(),
            failed = report.failures.len(),
            nodes = stats.total_nodes,
            edges = stats.total_edges,
            "Knowledge graph built"
        );

        Ok(report)
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn into_graph(self) -> KnowledgeGraph {
        self.graph
    }
}

impl Default for PkgBuilder {
    fn default() -> Self {
        Self::new(BuildOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Relation;
    use extract::{Entity, EntitySet, ExtractionMethod, TextSources};

    fn entity(kind: EntityKind, text: &str, offset: usize) -> Entity {
        let view = if kind == EntityKind::Requirement {
            TextView::AbstractTitle
        } else {
            TextView::FullText
        };

        Entity {
            text: text.to_string(),
            kind,
            category: String::new(),
            char_offset: offset,
            method: ExtractionMethod::LexiconMatch,
            view,
        }
    }

    fn extraction(patent_id: &str, entities: EntitySet) -> ExtractionResult {
        ExtractionResult::new(patent_id.to_string(), entities, TextSources::default())
    }

    #[test]
    fn test_requirement_function_threshold() {
        let near = extraction(
            "P1",
            EntitySet {
                requirements: vec![entity(EntityKind::Requirement, "reduce noise", 0)],
                functions: vec![entity(EntityKind::Function, "reduce the load", 199)],
                ..Default::default()
            },
        );
        let sub = build_patent_subgraph(&near, &BuildOptions::default()).unwrap();
        assert_eq!(
            sub.edges,
            vec![GraphEdge {
                source: "P1_R_0".to_string(),
                target: "P1_F_0".to_string(),
                relation: Relation::Addresses,
            }]
        );

        let far = extraction(
            "P1",
            EntitySet {
                requirements: vec![entity(EntityKind::Requirement, "reduce noise", 0)],
                functions: vec![entity(EntityKind::Function, "reduce the load", 200)],
                ..Default::default()
            },
        );
        let sub = build_patent_subgraph(&far, &BuildOptions::default()).unwrap();
        assert!(sub.edges.is_empty());
    }

    #[test]
    fn test_identical_labels_get_distinct_ids() {
        let record = extraction(
            "P1",
            EntitySet {
                structures: vec![
                    entity(EntityKind::Structure, "Spar Cap", 10),
                    entity(EntityKind::Structure, "spar cap", 300),
                ],
                ..Default::default()
            },
        );

        let sub = build_patent_subgraph(&record, &BuildOptions::default()).unwrap();
        assert_eq!(sub.nodes[0].id, "P1_S_0");
        assert_eq!(sub.nodes[1].id, "P1_S_1");
        assert_eq!(sub.nodes[0].label, "spar cap");
        assert_eq!(sub.nodes[1].occurrence, 1);
    }

    #[test]
    fn test_every_rule_fires_for_each_pair() {
        let record = extraction(
            "P1",
            EntitySet {
                functions: vec![entity(EntityKind::Function, "support the load", 100)],
                structures: vec![
                    entity(EntityKind::Structure, "web", 120),
                    entity(EntityKind::Structure, "spar", 150),
                ],
                locations: vec![entity(EntityKind::Location, "at the root", 160)],
                ..Default::default()
            },
        );

        let sub = build_patent_subgraph(&record, &BuildOptions::default()).unwrap();
        let count = |r: Relation| sub.edges.iter().filter(|e| e.relation == r).count();

        assert_eq!(count(Relation::Uses), 2);
        assert_eq!(count(Relation::LocatedAt), 2);
        assert_eq!(count(Relation::OccursAt), 1);
    }

    #[test]
    fn test_aligned_requirement_offsets() {
        let mut record = extraction(
            "P1",
            EntitySet {
                requirements: vec![entity(EntityKind::Requirement, "reduce noise", 0)],
                functions: vec![entity(EntityKind::Function, "reduce noise", 300)],
                ..Default::default()
            },
        );
        record.text_sources = TextSources {
            title: 299,
            abstract_text: 50,
            claims: 0,
            description: 0,
        };

        let parity = build_patent_subgraph(&record, &BuildOptions::default()).unwrap();
        assert!(parity.edges.is_empty());

        let options = BuildOptions {
            align_requirement_offsets: true,
        };
        let aligned = build_patent_subgraph(&record, &options).unwrap();
        assert_eq!(aligned.nodes[0].char_offset, 300);
        assert_eq!(aligned.nodes[0].view, TextView::FullText);
        assert_eq!(aligned.edges.len(), 1);
    }

    #[test]
    fn test_empty_patent_id_is_rejected() {
        let record = extraction("  ", EntitySet::default());
        assert!(matches!(
            build_patent_subgraph(&record, &BuildOptions::default()),
            Err(BuildError::MissingField("patent_id"))
        ));
    }

    #[test]
    fn test_merge_rejects_duplicates_and_keeps_patents_apart() {
        let make = |id: &str| {
            extraction(
                id,
                EntitySet {
                    functions: vec![entity(EntityKind::Function, "protect the blade", 5)],
                    structures: vec![entity(EntityKind::Structure, "coating", 20)],
                    ..Default::default()
                },
            )
        };

        let mut builder = PkgBuilder::default();
        let report = builder.add_batch(&[make("P1"), make("P2"), make("P1")]);

        assert_eq!(report.patents.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, "P1");

        let graph = builder.into_graph();
        assert_eq!(graph.node_count(), 4);
        for edge in graph.edges() {
            let source = graph.node(&edge.source).unwrap();
            let target = graph.node(&edge.target).unwrap();
            assert_eq!(source.patent_id, target.patent_id);
        }
    }

    #[test]
    fn test_resumed_builder_knows_existing_patents() {
        let make = |id: &str| {
            extraction(
                id,
                EntitySet {
                    structures: vec![entity(EntityKind::Structure, "coating", 0)],
                    ..Default::default()
                },
            )
        };

        let mut first = PkgBuilder::default();
        first.add_extraction(&make("P1")).unwrap();

        let mut resumed = PkgBuilder::from_graph(first.into_graph(), BuildOptions::default());
        assert!(matches!(
            resumed.add_extraction(&make("P1")),
            Err(BuildError::DuplicatePatent(_))
        ));
        resumed.add_extraction(&make("P2")).unwrap();

        assert_eq!(resumed.graph().patent_ids(), vec!["P1", "P2"]);
    }

    #[test]
    fn test_patent_without_entities_is_recorded() {
        let mut builder = PkgBuilder::default();
        let stats = builder
            .add_extraction(&extraction("P0", EntitySet::default()))
            .unwrap();
        assert_eq!((stats.nodes, stats.edges), (0, 0));

        let graph = builder.into_graph();
        assert!(graph.contains_patent("P0"));
        assert_eq!(graph.patent_ids(), vec!["P0"]);
        assert_eq!(graph.stats().num_patents, 1);
        assert!(graph.is_empty());

        // survives persistence and blocks a second merge
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pkg_complete.json");
        graph.save(&path).unwrap();
        let loaded = KnowledgeGraph::load(&path).unwrap();
        assert_eq!(loaded.patent_ids(), vec!["P0"]);

        let mut resumed = PkgBuilder::from_graph(loaded, BuildOptions::default());
        assert!(matches!(
            resumed.add_extraction(&extraction("P0", EntitySet::default())),
            Err(BuildError::DuplicatePatent(_))
        ));
    }

    #[test]
    fn test_build_from_dir_skips_malformed_files() {
        let dir = tempfile::tempdir().unwrap();

        let good = extraction(
            "US1",
            EntitySet {
                structures: vec![entity(EntityKind::Structure, "blade", 0)],
                ..Default::default()
            },
        );
        std::fs::write(
            dir.path().join("US1_rfsl.json"),
            serde_json::to_string(&good).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("US2_rfsl.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("US3_rfsl.json"), r#"{"patent_id": "US3"}"#).unwrap();
        std::fs::write(dir.path().join("notes.json"), "{}").unwrap();

        let mut builder = PkgBuilder::default();
        let report = builder.build_from_dir(dir.path()).unwrap();

        assert_eq!(report.patents.len(), 1);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures.iter().any(|f| f.error.contains("entities")));
        assert_eq!(builder.graph().patent_ids(), vec!["US1".to_string()]);
    }
}
