//! Graph analytics engine.
//!
//! Turns flat tabular datasets into an entity-relationship graph and runs a
//! battery of unsupervised analyses over it, producing a ranked list of
//! human-readable insights.
//!
//! ## Architecture
//!
//! ```text
//! rows + column descriptors ──► GraphBuilder ──► GraphStore
//!                                                    │
//!                     embeddings · centrality · communities · anomalies · metrics
//!                                                    │
//!                                  classification · link prediction
//!                                                    │
//!                                    insights ──► AnalysisReport
//!                                                    │
//!                                 AnalyticsEngine (GraphAnalyzer)
//! ```
//!
//! ## Modules
//!
//! - [`models`]: Data structures (Node, Relationship, GraphMetrics, AnalyticsConfig)
//! - [`builder`]: Column selection and row → graph conversion
//! - [`store`]: `GraphStore` arena and its analysis operations
//! - [`algorithms`]: PageRank, Betweenness, Louvain, Clustering, components, z-scores
//! - [`embeddings`]: Structural embeddings and cosine similarity
//! - [`prediction`]: Heuristic node classification and link prediction
//! - [`insights`]: `Insight` records and per-stage synthesis
//! - [`query`]: Minimal pattern retrieval
//! - [`engine`]: `AnalyticsEngine` trait and the staged `GraphAnalyzer`
//! - [`errors`]: `GraphError`

pub mod algorithms;
pub mod builder;
pub mod embeddings;
pub mod engine;
pub mod errors;
pub mod insights;
pub mod models;
pub mod prediction;
pub mod query;
pub mod store;

// Re-export primary types for convenience
pub use builder::{BuilderConfig, ColumnDescriptor, ColumnType, GraphBuilder, Row};
pub use engine::{
    AnalysisReport, AnalysisStage, AnalyticsEngine, GraphAnalyzer, StageOutcome, StageStatus,
};
pub use errors::{GraphError, GraphResult};
pub use insights::{Insight, InsightKind, InsightType, Severity};
pub use models::{
    AnalyticsConfig, AnomalyResult, Centrality, CommunityResult, GraphMetrics, Node, Relationship,
};
pub use query::{GraphQuery, QueryResult};
pub use store::GraphStore;
