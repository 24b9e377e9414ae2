//! Error type shared by the graph store, its algorithms and the analyzer.

use thiserror::Error;

/// Errors raised by graph operations.
///
/// Construction problems never surface here: the builder degrades to an empty
/// graph instead. These variants cover store misuse, invalid parameters and
/// failed analysis stages.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(String),

    #[error("Relationship {0} not found")]
    RelationshipNotFound(String),

    #[error("Relationship {relationship_id} references missing node {node_id}")]
    DanglingRelationship {
        relationship_id: String,
        node_id: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual} on node {node_id}")]
    DimensionMismatch {
        node_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid query pattern: {0}")]
    InvalidQuery(String),

    #[error("Stage {stage} panicked: {message}")]
    StagePanicked { stage: String, message: String },
}

/// Result alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
