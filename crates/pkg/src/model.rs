use extract::{EntityKind, TextView};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entity occurrence as a graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// `{patent_id}_{kind tag}_{seq}`
    pub id: String,
    pub label: String,
    pub kind: EntityKind,
    pub patent_id: String,
    #[serde(default)]
    pub category: String,
    pub char_offset: usize,
    pub view: TextView,
    /// Earlier nodes of this patent and kind with the same label
    #[serde(default)]
    pub occurrence: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Addresses,
    Uses,
    LocatedAt,
    OccursAt,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::Addresses,
        Relation::Uses,
        Relation::LocatedAt,
        Relation::OccursAt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Addresses => "addresses",
            Relation::Uses => "uses",
            Relation::LocatedAt => "located_at",
            Relation::OccursAt => "occurs_at",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relation: Relation,
}

/// Link `source` kind nodes to `target` kind nodes closer than `threshold` chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProximityRule {
    pub source: EntityKind,
    pub target: EntityKind,
    pub threshold: usize,
    pub relation: Relation,
}

impl ProximityRule {
    pub fn applies(&self, source_offset: usize, target_offset: usize) -> bool {
        source_offset.abs_diff(target_offset) < self.threshold
    }
}

/// Applied in order; every qualifying pair yields one edge.
pub const PROXIMITY_RULES: [ProximityRule; 4] = [
    ProximityRule {
        source: EntityKind::Requirement,
        target: EntityKind::Function,
        threshold: 200,
        relation: Relation::Addresses,
    },
    ProximityRule {
        source: EntityKind::Function,
        target: EntityKind::Structure,
        threshold: 100,
        relation: Relation::Uses,
    },
    ProximityRule {
        source: EntityKind::Structure,
        target: EntityKind::Location,
        threshold: 50,
        relation: Relation::LocatedAt,
    },
    ProximityRule {
        source: EntityKind::Function,
        target: EntityKind::Location,
        threshold: 80,
        relation: Relation::OccursAt,
    },
];
