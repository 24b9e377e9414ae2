//! Structural node embeddings.
//!
//! Each node is described by a fixed-length vector built from:
//!
//! 1. Eight structural features (log-scaled where unbounded):
//!    out-degree, in-degree, weighted degree, distinct neighbours,
//!    two-hop reach, mean neighbour degree, local clustering and the node's
//!    share of the maximum neighbour count.
//! 2. A neighbour-label histogram over the graph's sorted label vocabulary,
//!    weighted by relationship weight and normalised to sum to 1.
//!
//! The full vector is L2-normalised so dot products are cosine similarities.
//! Isolated nodes produce an all-zero vector.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use super::algorithms::{local_clustering, Adjacency};

/// Number of structural features preceding the label histogram.
pub const STRUCTURAL_FEATURES: usize = 8;

/// Cosine similarity of two vectors, clamped to [-1, 1].
///
/// Vectors of different length or with zero norm have similarity 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a <= f64::EPSILON || norm_b <= f64::EPSILON {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Compute one embedding per node position.
///
/// `labels[i]` are the labels of node `i`. Returns the vectors and their
/// shared dimensionality.
pub fn structural_embeddings(
    adj: &Adjacency,
    in_degree: &[usize],
    out_degree: &[usize],
    labels: &[&BTreeSet<String>],
) -> (Vec<Vec<f64>>, usize) {
    let vocabulary: Vec<&String> = labels
        .iter()
        .flat_map(|set| set.iter())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let dimensions = STRUCTURAL_FEATURES + vocabulary.len();

    let clustering = local_clustering(adj);
    let max_neighbors = adj.iter().map(|n| n.len()).max().unwrap_or(0);

    let vectors = (0..adj.len())
        .map(|i| {
            let neighbors = &adj[i];
            let mut v = vec![0.0; dimensions];

            let strength: f64 = neighbors.iter().map(|(_, w)| w).sum();
            let mut two_hop: HashSet<usize> = HashSet::new();
            for &(j, _) in neighbors {
                two_hop.extend(adj[j].iter().map(|&(k, _)| k));
            }
            two_hop.remove(&i);
            for &(j, _) in neighbors {
                two_hop.remove(&j);
            }
            let mean_neighbor_degree = if neighbors.is_empty() {
                0.0
            } else {
                neighbors.iter().map(|&(j, _)| adj[j].len() as f64).sum::<f64>()
                    / neighbors.len() as f64
            };

            v[0] = (out_degree[i] as f64).ln_1p();
            v[1] = (in_degree[i] as f64).ln_1p();
            v[2] = strength.ln_1p();
            v[3] = (neighbors.len() as f64).ln_1p();
            v[4] = (two_hop.len() as f64).ln_1p();
            v[5] = mean_neighbor_degree.ln_1p();
            v[6] = clustering[i];
            v[7] = if max_neighbors > 0 {
                neighbors.len() as f64 / max_neighbors as f64
            } else {
                0.0
            };

            if strength > 0.0 {
                for &(j, w) in neighbors {
                    for label in labels[j] {
                        if let Ok(pos) = vocabulary.binary_search(&label) {
                            v[STRUCTURAL_FEATURES + pos] += w / strength;
                        }
                    }
                }
            }

            let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm > 0.0 {
                for x in v.iter_mut() {
                    *x /= norm;
                }
            }
            v
        })
        .collect();

    (vectors, dimensions)
}

/// Two nodes whose embeddings are close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarPair {
    pub source: String,
    pub target: String,
    pub similarity: f64,
}

/// All pairs with cosine similarity above `threshold`, most similar first,
/// truncated to `limit`. Ties keep input order.
pub fn similar_pairs(embedded: &[(&str, &[f64])], threshold: f64, limit: usize) -> Vec<SimilarPair> {
    let n = embedded.len();
    let mut pairs: Vec<SimilarPair> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            ((i + 1)..n).filter_map(move |j| {
                let similarity = cosine_similarity(embedded[i].1, embedded[j].1);
                (similarity > threshold).then(|| SimilarPair {
                    source: embedded[i].0.to_string(),
                    target: embedded[j].0.to_string(),
                    similarity,
                })
            })
        })
        .collect();

    pairs.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    pairs.truncate(limit);
    pairs
}
