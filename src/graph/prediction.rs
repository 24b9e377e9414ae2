//! Heuristic node classification and missing-link prediction.
//!
//! Neither pass is learned: both score nodes from the structure and
//! embeddings already attached to the store, and both return nothing when
//! those inputs are missing.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::embeddings::cosine_similarity;
use super::models::{AnalyticsConfig, Node};
use super::store::GraphStore;

// ============================================================================
// Classification
// ============================================================================

/// Class assigned to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    Hub,
    Person,
    Organization,
    Leaf,
    Entity,
}

impl std::fmt::Display for NodeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hub => write!(f, "hub"),
            Self::Person => write!(f, "person"),
            Self::Organization => write!(f, "organization"),
            Self::Leaf => write!(f, "leaf"),
            Self::Entity => write!(f, "entity"),
        }
    }
}

/// A class prediction for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeClassification {
    pub node_id: String,
    pub class: NodeClass,
    pub confidence: f64,
}

/// Classify a node, if it carries both an embedding and a centrality record.
///
/// Rules, first match wins:
/// - pagerank > 0.1 and degree > 5 → hub (0.9)
/// - label "Person" → person (0.8), label "Organization" → organization (0.8)
/// - degree == 1 → leaf (0.7)
/// - otherwise → entity (0.6)
pub fn classify_node(node: &Node) -> Option<NodeClassification> {
    node.embedding.as_ref()?;
    let centrality = node.centrality.as_ref()?;

    let (class, confidence) = if centrality.pagerank > 0.1 && centrality.degree > 5 {
        (NodeClass::Hub, 0.9)
    } else if node.has_label("Person") {
        (NodeClass::Person, 0.8)
    } else if node.has_label("Organization") {
        (NodeClass::Organization, 0.8)
    } else if centrality.degree == 1 {
        (NodeClass::Leaf, 0.7)
    } else {
        (NodeClass::Entity, 0.6)
    };

    Some(NodeClassification {
        node_id: node.id.clone(),
        class,
        confidence,
    })
}

/// Classify every eligible node. Graphs with fewer than two nodes yield
/// nothing.
pub fn classify_nodes(store: &GraphStore) -> Vec<NodeClassification> {
    if store.node_count() < 2 {
        return vec![];
    }
    let predictions: Vec<NodeClassification> =
        store.nodes().iter().filter_map(classify_node).collect();
    debug!(classified = predictions.len(), "Classified nodes");
    predictions
}

// ============================================================================
// Link prediction
// ============================================================================

/// A predicted relationship between two unconnected nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPrediction {
    pub source: String,
    pub target: String,
    pub probability: f64,
    pub common_neighbors: usize,
    pub similarity: f64,
    pub shared_labels: usize,
}

/// clip(0.2·common + 0.5·cosine + 0.1·shared_labels, 0, 1)
pub fn link_probability(common_neighbors: usize, similarity: f64, shared_labels: usize) -> f64 {
    (0.2 * common_neighbors as f64 + 0.5 * similarity + 0.1 * shared_labels as f64).clamp(0.0, 1.0)
}

/// Score every non-adjacent node pair and keep the likeliest links.
///
/// Pairs joined by a relationship in either direction are never scored.
/// Returns nothing when the store has no embeddings.
pub fn predict_links(store: &GraphStore, config: &AnalyticsConfig) -> Vec<LinkPrediction> {
    let nodes = store.nodes();
    let n = nodes.len();
    if n < 2 || !store.has_embeddings() {
        return vec![];
    }

    let view = store.adjacency();
    let neighbor_sets: Vec<HashSet<usize>> = view
        .adj
        .iter()
        .map(|neighbors| neighbors.iter().map(|&(j, _)| j).collect())
        .collect();

    let threshold = config.link_probability_threshold;
    let mut predictions: Vec<LinkPrediction> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            let neighbor_sets = &neighbor_sets;
            ((i + 1)..n).filter_map(move |j| {
                if neighbor_sets[i].contains(&j) {
                    return None;
                }
                let (a, b) = (&nodes[i], &nodes[j]);
                let similarity = match (&a.embedding, &b.embedding) {
                    (Some(ea), Some(eb)) => cosine_similarity(ea, eb),
                    _ => 0.0,
                };
                let common_neighbors = neighbor_sets[i].intersection(&neighbor_sets[j]).count();
                let shared_labels = a.labels.intersection(&b.labels).count();
                let probability = link_probability(common_neighbors, similarity, shared_labels);

                (probability > threshold).then(|| LinkPrediction {
                    source: a.id.clone(),
                    target: b.id.clone(),
                    probability,
                    common_neighbors,
                    similarity,
                    shared_labels,
                })
            })
        })
        .collect();

    predictions.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    predictions.truncate(config.max_link_predictions);
    debug!(predicted = predictions.len(), "Predicted links");
    predictions
}
