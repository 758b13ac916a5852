use thiserror::Error;

/// Top-level error type for the Atlas platform.
#[derive(Error, Debug)]
pub enum AtlasError {
    /// The input does not have the node/relationship shape of a knowledge graph.
    #[error("Malformed knowledge graph: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AtlasError>;
