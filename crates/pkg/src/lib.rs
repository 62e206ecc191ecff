pub mod builder;
pub mod error;
pub mod model;
pub mod persist;
pub mod store;

pub use builder::{
    build_patent_subgraph, load_extraction, BuildFailure, BuildOptions, BuildReport,
    PatentBuildStats, PatentSubgraph, PkgBuilder, RFSL_SUFFIX,
};
pub use error::BuildError;
pub use model::{GraphEdge, GraphNode, ProximityRule, Relation, PROXIMITY_RULES};
pub use persist::{GraphSnapshot, PlainGraph, PlainNode, SNAPSHOT_VERSION};
pub use store::{GraphStats, KnowledgeGraph};

/// File name of the persisted graph snapshot
pub const GRAPH_FILE: &str = "pkg_complete.json";
/// File name of the plain node/edge export
pub const PLAIN_GRAPH_FILE: &str = "pkg_plain.json";
