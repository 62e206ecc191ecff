use std::path::PathBuf;
use thiserror::Error;

/// Why one extraction record could not become part of the graph.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Extraction record is missing `{0}`")]
    MissingField(&'static str),

    #[error("Patent {0} is already in the graph")]
    DuplicatePatent(String),
}
