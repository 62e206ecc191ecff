use anyhow::{bail, Context, Result};
use extract::EntityKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::model::{GraphEdge, GraphNode};
use crate::store::KnowledgeGraph;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Complete typed dump of a graph, the persisted unit of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub version: u32,
    /// Every merged patent, including those without nodes
    #[serde(default)]
    pub patents: Vec<String>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Minimal node/edge lists for visualization tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlainGraph {
    pub nodes: Vec<PlainNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlainNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub patent_id: String,
}

impl KnowledgeGraph {
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            version: SNAPSHOT_VERSION,
            patents: self.patent_ids(),
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().collect(),
        }
    }

    /// Rebuild a graph from a snapshot; edges to unknown nodes are an error.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            bail!(
                "Unsupported graph snapshot version {} (expected {})",
                snapshot.version,
                SNAPSHOT_VERSION
            );
        }

        let mut graph = KnowledgeGraph::new();
        for patent_id in &snapshot.patents {
            graph.add_patent(patent_id);
        }
        for node in snapshot.nodes {
            graph.add_node(node);
        }

        for edge in &snapshot.edges {
            if !graph.add_edge(&edge.source, &edge.target, edge.relation) {
                bail!("Edge {} -> {} references an unknown node", edge.source, edge.target);
            }
        }

        Ok(graph)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_snapshot())
            .context("Failed to serialize graph")?;
        std::fs::write(path, json).context(format!("Failed to write graph: {:?}", path))?;

        info!(
            path = %path.display(),
            nodes = self.node_count(),
            edges = self.edge_count(),
            "Saved knowledge graph"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read graph: {:?}", path))?;
        let snapshot: GraphSnapshot = serde_json::from_str(&content)
            .context(format!("Failed to parse graph: {:?}", path))?;

        Self::from_snapshot(snapshot)
    }

    pub fn export_plain(&self) -> PlainGraph {
        PlainGraph {
            nodes: self
                .nodes()
                .map(|n| PlainNode {
                    id: n.id.clone(),
                    label: n.label.clone(),
                    kind: n.kind,
                    patent_id: n.patent_id.clone(),
                })
                .collect(),
            edges: self.edges().collect(),
        }
    }

    pub fn save_plain(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.export_plain())
            .context("Failed to serialize plain graph")?;
        std::fs::write(path, json).context(format!("Failed to write plain graph: {:?}", path))
    }
}
