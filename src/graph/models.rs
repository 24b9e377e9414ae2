//! Graph data models.
//!
//! Defines the complete type system of the entity graph:
//!
//! ## Graph elements (owned by the store)
//! - [`Node`]: entity vertex with labels, properties, optional embedding and centrality
//! - [`Relationship`]: directed, weighted co-occurrence edge between two node ids
//! - [`GraphProjection`]: petgraph view with ID ↔ NodeIndex mapping
//!
//! ## Analysis results (value objects, recomputed per run)
//! - [`Centrality`]: per-node PageRank, degree and betweenness
//! - [`CommunityResult`]: disjoint communities plus modularity
//! - [`AnomalyResult`]: flagged nodes/relationships and their scores
//! - [`GraphMetrics`]: density, clustering, path statistics
//!
//! ## Configuration
//! - [`AnalyticsConfig`]: tuning parameters for the analysis algorithms

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::errors::{GraphError, GraphResult};

/// Property map attached to nodes and relationships.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

/// Default relationship type for plain co-occurrence.
pub const DEFAULT_RELATIONSHIP_TYPE: &str = "RELATED_TO";

// ============================================================================
// Graph elements
// ============================================================================

/// Per-node centrality scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centrality {
    /// PageRank score (sums to ~1.0 across the graph)
    pub pagerank: f64,
    /// Number of incident relationships (in + out)
    pub degree: usize,
    /// Normalized betweenness, absent when the graph exceeds the size limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub betweenness: Option<f64>,
}

/// An entity node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: String,
    /// Category tags (e.g. "Person", "Organization")
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub properties: PropertyMap,
    /// Structural embedding, attached by `GraphStore::generate_embeddings`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f64>>,
    /// Centrality record, attached by `GraphStore::compute_centrality`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centrality: Option<Centrality>,
}

impl Node {
    /// Create a node carrying a single label.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let mut labels = BTreeSet::new();
        labels.insert(label.into());
        Self {
            id: id.into(),
            labels,
            properties: PropertyMap::new(),
            embedding: None,
            centrality: None,
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Human-readable name: the `value` property if present, else the id.
    pub fn display_name(&self) -> String {
        match self.properties.get("value") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => self.id.clone(),
        }
    }
}

/// A directed, weighted relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub start_node_id: String,
    pub end_node_id: String,
    /// Type label (e.g. "RELATED_TO")
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub properties: PropertyMap,
    /// Accumulated occurrence count
    pub weight: f64,
}

impl Relationship {
    pub fn new(
        id: impl Into<String>,
        start_node_id: impl Into<String>,
        end_node_id: impl Into<String>,
        rel_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            start_node_id: start_node_id.into(),
            end_node_id: end_node_id.into(),
            rel_type: rel_type.into(),
            properties: PropertyMap::new(),
            weight: 1.0,
        }
    }

    /// True if this relationship joins `a` and `b`, in either direction.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.start_node_id == a && self.end_node_id == b)
            || (self.start_node_id == b && self.end_node_id == a)
    }

    pub fn is_self_loop(&self) -> bool {
        self.start_node_id == self.end_node_id
    }
}

// ============================================================================
// GraphProjection: petgraph wrapper with ID mapping
// ============================================================================

/// Wrapper around `petgraph::DiGraph` with ID ↔ NodeIndex mapping.
///
/// Every relationship is projected in both directions so that directed
/// algorithms (PageRank, betweenness) see the undirected co-occurrence
/// structure. Parallel relationships accumulate into one weighted edge pair.
#[derive(Debug, Clone)]
pub struct GraphProjection {
    /// The underlying directed graph; node weights are node ids
    pub graph: DiGraph<String, f64>,
    /// Mapping from node id to petgraph NodeIndex
    pub id_to_index: HashMap<String, NodeIndex>,
}

impl GraphProjection {
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(nodes, edges * 2),
            id_to_index: HashMap::with_capacity(nodes),
        }
    }

    /// Add a node. Returns the existing index if the id is already present.
    pub fn add_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.id_to_index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.id_to_index.insert(id.to_string(), idx);
        idx
    }

    /// Add `weight` to the edge pair between two nodes, creating it if needed.
    /// Returns `None` if either node is unknown.
    pub fn add_undirected_weight(&mut self, a: &str, b: &str, weight: f64) -> Option<EdgeIndex> {
        let ia = *self.id_to_index.get(a)?;
        let ib = *self.id_to_index.get(b)?;
        let forward = self.bump(ia, ib, weight);
        if ia != ib {
            self.bump(ib, ia, weight);
        }
        Some(forward)
    }

    fn bump(&mut self, from: NodeIndex, to: NodeIndex, weight: f64) -> EdgeIndex {
        match self.graph.find_edge(from, to) {
            Some(e) => {
                self.graph[e] += weight;
                e
            }
            None => self.graph.add_edge(from, to, weight),
        }
    }

    pub fn get_index(&self, id: &str) -> Option<NodeIndex> {
        self.id_to_index.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

// ============================================================================
// Analysis results
// ============================================================================

/// Partition of the graph into disjoint communities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommunityResult {
    /// Communities ordered by size (largest first), each a list of node ids
    pub communities: Vec<Vec<String>>,
    /// Newman modularity of the partition, in [-1, 1]
    pub modularity: f64,
}

impl CommunityResult {
    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// Index of the community containing `node_id`.
    pub fn community_of(&self, node_id: &str) -> Option<usize> {
        self.communities
            .iter()
            .position(|members| members.iter().any(|m| m == node_id))
    }
}

/// Nodes and relationships deviating from the structural norm.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub nodes: Vec<String>,
    pub relationships: Vec<String>,
    /// Anomaly score for every flagged id
    pub scores: BTreeMap<String, f64>,
}

impl AnomalyResult {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }
}

/// Aggregate structural metrics.
///
/// Path statistics cover the largest connected component only: the diameter
/// of a disconnected graph is undefined.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphMetrics {
    /// 2·|E| / (|V|·(|V|−1)) over distinct adjacent pairs, 0 when |V| < 2
    pub density: f64,
    /// Mean local clustering coefficient
    pub clustering_coefficient: f64,
    pub average_path_length: f64,
    pub diameter: usize,
    pub node_count: usize,
    pub relationship_count: usize,
    pub component_count: usize,
    pub largest_component_size: usize,
}

// ============================================================================
// Configuration
// ============================================================================

/// Tuning parameters for the analysis algorithms and insight synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// PageRank damping factor (default: 0.85)
    pub pagerank_damping: f64,
    /// PageRank convergence tolerance (default: 1e-6)
    pub pagerank_tolerance: f64,
    /// PageRank maximum iterations (default: 100)
    pub pagerank_max_iterations: usize,
    /// Betweenness is skipped above this node count (default: 2000)
    pub betweenness_max_nodes: usize,
    /// Louvain resolution parameter (default: 1.0, higher = smaller communities)
    pub louvain_resolution: f64,
    /// Louvain maximum local-moving passes (default: 100)
    pub louvain_max_iterations: usize,
    /// z-score above which a node or relationship is anomalous (default: 2.0)
    pub anomaly_z_threshold: f64,
    /// Minimum population for z-scores to be meaningful (default: 3)
    pub anomaly_min_samples: usize,
    /// Cosine similarity above which two nodes are "similar" (default: 0.8)
    pub similarity_threshold: f64,
    /// Similar pairs surfaced in the embedding insight (default: 10)
    pub max_similar_pairs: usize,
    /// Nodes surfaced in the key-entities insight (default: 5)
    pub key_entity_count: usize,
    /// Link probability a prediction must exceed (default: 0.5)
    pub link_probability_threshold: f64,
    /// Maximum link predictions retained (default: 20)
    pub max_link_predictions: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            pagerank_damping: 0.85,
            pagerank_tolerance: 1e-6,
            pagerank_max_iterations: 100,
            betweenness_max_nodes: 2000,
            louvain_resolution: 1.0,
            louvain_max_iterations: 100,
            anomaly_z_threshold: 2.0,
            anomaly_min_samples: 3,
            similarity_threshold: 0.8,
            max_similar_pairs: 10,
            key_entity_count: 5,
            link_probability_threshold: 0.5,
            max_link_predictions: 20,
        }
    }
}

impl AnalyticsConfig {
    /// Check the PageRank parameters.
    pub fn validate_pagerank(&self) -> GraphResult<()> {
        if !(0.0..1.0).contains(&self.pagerank_damping) {
            return Err(GraphError::InvalidConfig(format!(
                "pagerank_damping must be in [0, 1), got {}",
                self.pagerank_damping
            )));
        }
        if !(self.pagerank_tolerance > 0.0) {
            return Err(GraphError::InvalidConfig(format!(
                "pagerank_tolerance must be positive, got {}",
                self.pagerank_tolerance
            )));
        }
        Ok(())
    }

    /// Check the Louvain parameters.
    pub fn validate_louvain(&self) -> GraphResult<()> {
        if !(self.louvain_resolution > 0.0) || !self.louvain_resolution.is_finite() {
            return Err(GraphError::InvalidConfig(format!(
                "louvain_resolution must be positive, got {}",
                self.louvain_resolution
            )));
        }
        Ok(())
    }

    /// Check the anomaly-detection parameters.
    pub fn validate_anomaly(&self) -> GraphResult<()> {
        if !(self.anomaly_z_threshold > 0.0) {
            return Err(GraphError::InvalidConfig(format!(
                "anomaly_z_threshold must be positive, got {}",
                self.anomaly_z_threshold
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
