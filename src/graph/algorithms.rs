//! Graph analytics algorithms.
//!
//! Implements the structural algorithms behind the store operations:
//! - **PageRank**: weighted power iteration on the symmetric projection
//! - **Betweenness centrality**: via `rustworkx_core::centrality::betweenness_centrality`
//! - **Community detection (Louvain)**: local-moving phase, custom implementation
//! - **Modularity**: Newman's Q for a community assignment
//! - **Clustering coefficient**: local triangle ratio per node
//! - **Connected components**: BFS on the undirected adjacency
//! - **Path statistics**: average shortest path and diameter by BFS
//! - **z-scores**: population standardisation used by anomaly detection
//!
//! Index-based algorithms take an undirected adjacency list where
//! `adj[i]` holds `(neighbor, weight)` pairs sorted by neighbor, without
//! self-loops. Positions match the store's node insertion order.

use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::debug;

use super::models::{AnalyticsConfig, GraphProjection};

/// Undirected weighted adjacency list.
pub type Adjacency = Vec<Vec<(usize, f64)>>;

// ============================================================================
// PageRank (power iteration)
// ============================================================================

/// Compute PageRank scores for all nodes of the projection.
///
/// Outgoing mass is split proportionally to edge weight. Dangling nodes
/// redistribute evenly. Returns scores normalized to sum ≈ 1.0.
pub fn pagerank(graph: &GraphProjection, config: &AnalyticsConfig) -> HashMap<String, f64> {
    let g = &graph.graph;
    let n = g.node_count();
    if n == 0 {
        return HashMap::new();
    }

    let damping = config.pagerank_damping;
    let base = (1.0 - damping) / n as f64;

    let mut scores: Vec<f64> = vec![1.0 / n as f64; n];
    let mut new_scores: Vec<f64> = vec![0.0; n];

    // Weighted out-strength per node
    let out_strength: Vec<f64> = g
        .node_indices()
        .map(|idx| {
            g.edges_directed(idx, Direction::Outgoing)
                .map(|e| *e.weight())
                .sum()
        })
        .collect();

    let mut iterations = 0;
    for _ in 0..config.pagerank_max_iterations {
        iterations += 1;
        let dangling_mass: f64 = g
            .node_indices()
            .filter(|idx| out_strength[idx.index()] <= 0.0)
            .map(|idx| scores[idx.index()])
            .sum();

        for s in new_scores.iter_mut() {
            *s = base + damping * dangling_mass / n as f64;
        }

        for idx in g.node_indices() {
            let i = idx.index();
            if out_strength[i] <= 0.0 {
                continue;
            }
            for edge in g.edges_directed(idx, Direction::Outgoing) {
                new_scores[edge.target().index()] +=
                    damping * scores[i] * edge.weight() / out_strength[i];
            }
        }

        let diff: f64 = scores
            .iter()
            .zip(new_scores.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();

        std::mem::swap(&mut scores, &mut new_scores);

        if diff < config.pagerank_tolerance {
            break;
        }
    }
    debug!(nodes = n, iterations, "PageRank converged");

    let total: f64 = scores.iter().sum();
    if total > 0.0 {
        for s in scores.iter_mut() {
            *s /= total;
        }
    }

    g.node_indices()
        .map(|idx| (g[idx].clone(), scores[idx.index()]))
        .collect()
}

// ============================================================================
// Betweenness Centrality (via rustworkx-core)
// ============================================================================

/// Compute normalized betweenness centrality for all nodes.
pub fn betweenness_centrality(graph: &GraphProjection) -> HashMap<String, f64> {
    let g = &graph.graph;
    if g.node_count() == 0 {
        return HashMap::new();
    }

    let scores = rustworkx_core::centrality::betweenness_centrality(
        g, false, // include_endpoints
        true,  // normalized
        200,   // parallel_threshold (sequential for small graphs)
    );

    g.node_indices()
        .map(|idx| (g[idx].clone(), scores[idx.index()].unwrap_or(0.0)))
        .collect()
}

// ============================================================================
// Community Detection: Louvain (local-moving phase)
// ============================================================================

/// Detect communities using the Louvain local-moving heuristic.
///
/// Returns `(community_of_node, modularity)` with community ids renumbered
/// contiguously in order of first appearance. A node only ever joins a
/// neighbouring community, so disconnected components stay apart and
/// isolated nodes keep a singleton community.
pub fn louvain_communities(adj: &Adjacency, resolution: f64, max_iterations: usize) -> (Vec<u32>, f64) {
    let n = adj.len();
    if n == 0 {
        return (vec![], 0.0);
    }

    let node_strengths: Vec<f64> = adj
        .iter()
        .map(|neighbors| neighbors.iter().map(|(_, w)| w).sum())
        .collect();
    let total_weight: f64 = node_strengths.iter().sum::<f64>() / 2.0;

    let mut community: Vec<u32> = (0..n as u32).collect();
    if total_weight == 0.0 {
        return (community, 0.0);
    }

    let mut comm_total_strength: HashMap<u32, f64> = HashMap::with_capacity(n);
    for (i, &ki) in node_strengths.iter().enumerate() {
        *comm_total_strength.entry(community[i]).or_default() += ki;
    }

    let m2 = 2.0 * total_weight;
    let mut improved = true;
    let mut iterations = 0;

    while improved && iterations < max_iterations {
        improved = false;
        iterations += 1;

        for node_idx in 0..n {
            let current_comm = community[node_idx];

            // BTreeMap keeps the tie-breaking between equal gains deterministic
            let mut comm_weights: BTreeMap<u32, f64> = BTreeMap::new();
            for &(neighbor, w) in &adj[node_idx] {
                *comm_weights.entry(community[neighbor]).or_default() += w;
            }

            let w_in_current = comm_weights.get(&current_comm).copied().unwrap_or(0.0);
            let ki = node_strengths[node_idx];

            let sigma_tot_current = comm_total_strength
                .get(&current_comm)
                .copied()
                .unwrap_or(0.0);
            let remove_cost =
                w_in_current / m2 - resolution * ki * (sigma_tot_current - ki) / (m2 * m2);

            let mut best_comm = current_comm;
            let mut best_gain = 0.0;

            for (&target_comm, &w_to_target) in &comm_weights {
                if target_comm == current_comm {
                    continue;
                }
                let sigma_tot_target = comm_total_strength
                    .get(&target_comm)
                    .copied()
                    .unwrap_or(0.0);
                let insert_cost = w_to_target / m2 - resolution * ki * sigma_tot_target / (m2 * m2);
                let gain = insert_cost - remove_cost;

                if gain > best_gain {
                    best_gain = gain;
                    best_comm = target_comm;
                }
            }

            if best_comm != current_comm {
                *comm_total_strength.entry(current_comm).or_default() -= ki;
                *comm_total_strength.entry(best_comm).or_default() += ki;
                community[node_idx] = best_comm;
                improved = true;
            }
        }
    }
    debug!(nodes = n, iterations, "Louvain local moving finished");

    // Renumber communities contiguously in order of first appearance
    let mut comm_remap: HashMap<u32, u32> = HashMap::new();
    let mut next_id = 0u32;
    for c in community.iter_mut() {
        let id = *comm_remap.entry(*c).or_insert_with(|| {
            let id = next_id;
            next_id += 1;
            id
        });
        *c = id;
    }

    let modularity = compute_modularity(&community, adj, &node_strengths, total_weight);
    (community, modularity)
}

/// Compute Newman's modularity Q for a given community assignment.
pub fn compute_modularity(
    community: &[u32],
    adj: &Adjacency,
    node_strengths: &[f64],
    total_weight: f64,
) -> f64 {
    if total_weight == 0.0 {
        return 0.0;
    }
    let m2 = 2.0 * total_weight;
    let mut q = 0.0;

    // Observed intra-community weight; each undirected edge appears twice
    for (i, neighbors) in adj.iter().enumerate() {
        for &(j, w) in neighbors {
            if community[i] == community[j] {
                q += w;
            }
        }
    }

    // Expected weight: Σ_c (Σ_tot_c)² / 2m
    let mut comm_strength: HashMap<u32, f64> = HashMap::new();
    for (i, &c) in community.iter().enumerate() {
        *comm_strength.entry(c).or_default() += node_strengths[i];
    }
    let expected: f64 = comm_strength.values().map(|s| s * s / m2).sum();

    ((q - expected) / m2).clamp(-1.0, 1.0)
}

// ============================================================================
// Clustering Coefficient
// ============================================================================

/// Local clustering coefficient per node: connected neighbour pairs divided
/// by k·(k−1)/2. Nodes with fewer than two neighbours score 0.
pub fn local_clustering(adj: &Adjacency) -> Vec<f64> {
    let neighbor_sets: Vec<HashSet<usize>> = adj
        .iter()
        .map(|neighbors| neighbors.iter().map(|&(j, _)| j).collect())
        .collect();

    adj.iter()
        .map(|neighbors| {
            let k = neighbors.len();
            if k < 2 {
                return 0.0;
            }
            let mut triangles = 0usize;
            for a in 0..k {
                for b in (a + 1)..k {
                    if neighbor_sets[neighbors[a].0].contains(&neighbors[b].0) {
                        triangles += 1;
                    }
                }
            }
            triangles as f64 / (k * (k - 1) / 2) as f64
        })
        .collect()
}

// ============================================================================
// Connected Components
// ============================================================================

/// Connected components of the undirected adjacency, in order of their
/// lowest node position.
pub fn connected_components(adj: &Adjacency) -> Vec<Vec<usize>> {
    let n = adj.len();
    let mut seen = vec![false; n];
    let mut components = Vec::new();

    for start in 0..n {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut members = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &(neighbor, _) in &adj[current] {
                if !seen[neighbor] {
                    seen[neighbor] = true;
                    members.push(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }
    components
}

// ============================================================================
// Path statistics
// ============================================================================

/// Unweighted hop distances from `source` to every reachable node.
pub fn bfs_distances(adj: &Adjacency, source: usize) -> Vec<Option<usize>> {
    let mut dist = vec![None; adj.len()];
    dist[source] = Some(0);
    let mut queue = VecDeque::from([source]);
    while let Some(current) = queue.pop_front() {
        let d = dist[current].unwrap_or(0);
        for &(neighbor, _) in &adj[current] {
            if dist[neighbor].is_none() {
                dist[neighbor] = Some(d + 1);
                queue.push_back(neighbor);
            }
        }
    }
    dist
}

/// Average shortest-path length and diameter within one connected component.
///
/// Returns `(0.0, 0)` for components with fewer than two nodes.
pub fn path_statistics(adj: &Adjacency, component: &[usize]) -> (f64, usize) {
    if component.len() < 2 {
        return (0.0, 0);
    }
    let mut total = 0usize;
    let mut pairs = 0usize;
    let mut diameter = 0usize;

    for &source in component {
        let dist = bfs_distances(adj, source);
        for &target in component {
            if target == source {
                continue;
            }
            if let Some(d) = dist[target] {
                total += d;
                pairs += 1;
                diameter = diameter.max(d);
            }
        }
    }

    let average = if pairs > 0 {
        total as f64 / pairs as f64
    } else {
        0.0
    };
    (average, diameter)
}

// ============================================================================
// z-scores
// ============================================================================

/// Population z-scores of `values`.
///
/// Returns `None` when there are fewer than `min_samples` values or the
/// values have no spread.
pub fn z_scores(values: &[f64], min_samples: usize) -> Option<Vec<f64>> {
    if values.len() < min_samples.max(2) {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    if std_dev <= f64::EPSILON {
        return None;
    }
    Some(values.iter().map(|v| (v - mean) / std_dev).collect())
}

// ============================================================================
// Tests
// ============================================================================
