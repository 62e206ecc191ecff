use extract::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::model::{GraphEdge, GraphNode, Relation};

/// Position of a node in the node table
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
struct EdgeEntry {
    source: NodeId,
    target: NodeId,
    relation: Relation,
}

/// Typed, directed patent knowledge graph.
///
/// Nodes and edges live in insertion-ordered tables. Nodes are addressed by
/// their string id through `index`, and each node keeps the positions of its
/// outgoing and incoming edges. Every node carries its patent id so
/// per-patent subgraphs are attribute filters.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<EdgeEntry>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    index: HashMap<String, NodeId>,
    patents: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub num_patents: usize,
    pub nodes_by_kind: BTreeMap<EntityKind, usize>,
    pub edges_by_relation: BTreeMap<Relation, usize>,
    pub density: f64,
}

/// Disjoint sets with path halving
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Returns true when two sets were merged
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.parent[rb] = ra;
        true
    }
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. A node whose id is already present is kept unchanged.
    pub fn add_node(&mut self, node: GraphNode) -> NodeId {
        if let Some(&id) = self.index.get(&node.id) {
            return id;
        }

        let id = self.nodes.len();
        self.index.insert(node.id.clone(), id);
        self.patents.insert(node.patent_id.clone());
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Record a patent that may own no nodes.
    pub fn add_patent(&mut self, patent_id: &str) {
        self.patents.insert(patent_id.to_string());
    }

    /// Returns false when either endpoint is unknown.
    pub fn add_edge(&mut self, source: &str, target: &str, relation: Relation) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&s), Some(&t)) => {
                self.push_edge(s, t, relation);
                true
            }
            _ => false,
        }
    }

    fn push_edge(&mut self, source: NodeId, target: NodeId, relation: Relation) {
        let position = self.edges.len();
        self.edges.push(EdgeEntry {
            source,
            target,
            relation,
        });
        self.outgoing[source].push(position);
        self.incoming[target].push(position);
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&n| &self.nodes[n])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = GraphEdge> + '_ {
        self.edges.iter().map(|e| GraphEdge {
            source: self.nodes[e.source].id.clone(),
            target: self.nodes[e.target].id.clone(),
            relation: e.relation,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_patent(&self, patent_id: &str) -> bool {
        self.patents.contains(patent_id)
    }

    /// Patent ids merged into the graph, including those without nodes, sorted
    pub fn patent_ids(&self) -> Vec<String> {
        self.patents.iter().cloned().collect()
    }

    /// Induced subgraph of one patent's nodes, in insertion order.
    pub fn subgraph(&self, patent_id: &str) -> KnowledgeGraph {
        let mut sub = KnowledgeGraph::new();
        let mut mapping: Vec<Option<NodeId>> = vec![None; self.nodes.len()];

        for (old, node) in self.nodes.iter().enumerate() {
            if node.patent_id == patent_id {
                mapping[old] = Some(sub.add_node(node.clone()));
            }
        }

        for edge in &self.edges {
            if let (Some(s), Some(t)) = (mapping[edge.source], mapping[edge.target]) {
                sub.push_edge(s, t, edge.relation);
            }
        }

        sub
    }

    /// In-degree plus out-degree
    pub fn degree(&self, id: &str) -> Option<usize> {
        self.index.get(id).map(|&n| self.degree_of(n))
    }

    fn degree_of(&self, node: NodeId) -> usize {
        self.outgoing[node].len() + self.incoming[node].len()
    }

    /// Degree of every node, in insertion order
    pub fn degrees(&self) -> Vec<usize> {
        (0..self.nodes.len()).map(|n| self.degree_of(n)).collect()
    }

    /// `m / (n(n-1))`; 0 for fewer than two nodes
    pub fn density(&self) -> f64 {
        let n = self.nodes.len();
        if n < 2 {
            return 0.0;
        }

        self.edges.len() as f64 / (n * (n - 1)) as f64
    }

    /// Components of the graph with edge direction ignored
    pub fn weakly_connected_components(&self) -> usize {
        let mut sets = UnionFind::new(self.nodes.len());
        let mut components = self.nodes.len();

        for edge in &self.edges {
            if sets.union(edge.source, edge.target) {
                components -= 1;
            }
        }

        components
    }

    /// `degree / (n - 1)` per node; a lone node has centrality 1.
    pub fn degree_centrality(&self) -> Vec<(String, f64)> {
        let n = self.nodes.len();

        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let centrality = if n <= 1 {
                    1.0
                } else {
                    self.degree_of(i) as f64 / (n - 1) as f64
                };
                (node.id.clone(), centrality)
            })
            .collect()
    }

    /// Nodes adjacent in either direction, sorted by id
    pub fn neighbors(&self, id: &str) -> Vec<&GraphNode> {
        let Some(&n) = self.index.get(id) else {
            return Vec::new();
        };

        let outgoing = self.outgoing[n].iter().map(|&e| self.edges[e].target);
        let incoming = self.incoming[n].iter().map(|&e| self.edges[e].source);

        let mut neighbors: Vec<&GraphNode> = outgoing
            .chain(incoming)
            .map(|m| &self.nodes[m])
            .collect();

        neighbors.sort_by(|a, b| a.id.cmp(&b.id));
        neighbors.dedup_by(|a, b| a.id == b.id);
        neighbors
    }

    /// Node count per kind; every kind is present
    pub fn kind_counts(&self) -> BTreeMap<EntityKind, usize> {
        let mut counts: BTreeMap<EntityKind, usize> =
            EntityKind::ALL.iter().map(|k| (*k, 0)).collect();

        for node in &self.nodes {
            *counts.entry(node.kind).or_insert(0) += 1;
        }

        counts
    }

    /// Edge count per relation; every relation is present
    pub fn relation_counts(&self) -> BTreeMap<Relation, usize> {
        let mut counts: BTreeMap<Relation, usize> =
            Relation::ALL.iter().map(|r| (*r, 0)).collect();

        for edge in &self.edges {
            *counts.entry(edge.relation).or_insert(0) += 1;
        }

        counts
    }

    pub fn labels(&self) -> BTreeSet<String> {
        self.nodes.iter().map(|n| n.label.clone()).collect()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_nodes: self.node_count(),
            total_edges: self.edge_count(),
            num_patents: self.patents.len(),
            nodes_by_kind: self.kind_counts(),
            edges_by_relation: self.relation_counts(),
            density: self.density(),
        }
    }
}
