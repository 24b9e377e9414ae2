//! In-memory entity graph and its structural operations.
//!
//! `GraphStore` is an arena: nodes and relationships live in insertion-ordered
//! vectors, with id → position maps for O(1) lookup. Relationships refer to
//! their endpoints by id only, so there are no ownership cycles.
//!
//! Analysis operations are idempotent and can be re-run at any time:
//!
//! | operation              | mutates store | result              |
//! |------------------------|---------------|---------------------|
//! | `generate_embeddings`  | yes           | dimensionality      |
//! | `compute_centrality`   | yes           | -                   |
//! | `detect_communities`   | no            | [`CommunityResult`] |
//! | `detect_anomalies`     | no            | [`AnomalyResult`]   |
//! | `compute_metrics`      | no            | [`GraphMetrics`]    |
//! | `query`                | no            | [`QueryResult`]     |
//!
//! Centrality runs on a strict petgraph projection and fails on relationships
//! whose endpoints are missing. The other operations use an undirected
//! adjacency view that skips such relationships.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

use super::algorithms::{
    betweenness_centrality, connected_components, local_clustering, louvain_communities,
    pagerank, path_statistics, z_scores, Adjacency,
};
use super::embeddings::structural_embeddings;
use super::errors::{GraphError, GraphResult};
use super::models::{
    AnalyticsConfig, AnomalyResult, Centrality, CommunityResult, GraphMetrics, GraphProjection,
    Node, Relationship,
};
use super::query::{GraphQuery, QueryResult};

/// Undirected view of the store, indexed by node position.
#[derive(Debug, Clone)]
pub(crate) struct AdjacencyView {
    pub adj: Adjacency,
    pub in_degree: Vec<usize>,
    pub out_degree: Vec<usize>,
    /// Incident relationship count (in + out, self-loops once)
    pub degree: Vec<usize>,
}

/// Serialized form of the store: the two element lists, no indexes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GraphSnapshot {
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
}

/// Owner of the entity graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "GraphSnapshot", into = "GraphSnapshot")]
pub struct GraphStore {
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
    node_index: HashMap<String, usize>,
    relationship_index: HashMap<String, usize>,
}

impl From<GraphSnapshot> for GraphStore {
    /// Rebuild the indexes. Referential integrity is not checked here;
    /// call [`GraphStore::validate`] for that.
    fn from(snapshot: GraphSnapshot) -> Self {
        let mut store = GraphStore::new();
        for node in snapshot.nodes {
            store.add_node(node);
        }
        for rel in snapshot.relationships {
            store.push_relationship(rel);
        }
        store
    }
}

impl From<GraphStore> for GraphSnapshot {
    fn from(store: GraphStore) -> Self {
        Self {
            nodes: store.nodes,
            relationships: store.relationships,
        }
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Elements
    // ========================================================================

    /// Insert a node. If the id already exists, labels are merged and
    /// missing properties are filled in. Returns `true` on first insertion.
    pub fn add_node(&mut self, node: Node) -> bool {
        if let Some(&pos) = self.node_index.get(&node.id) {
            let existing = &mut self.nodes[pos];
            existing.labels.extend(node.labels);
            for (key, value) in node.properties {
                existing.properties.entry(key).or_insert(value);
            }
            return false;
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Insert a relationship after checking that both endpoints exist.
    ///
    /// A relationship whose id is already present adds its weight to the
    /// existing one instead.
    pub fn add_relationship(&mut self, rel: Relationship) -> GraphResult<()> {
        for endpoint in [&rel.start_node_id, &rel.end_node_id] {
            if !self.node_index.contains_key(endpoint) {
                return Err(GraphError::DanglingRelationship {
                    relationship_id: rel.id.clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
        self.push_relationship(rel);
        Ok(())
    }

    fn push_relationship(&mut self, rel: Relationship) {
        if let Some(&pos) = self.relationship_index.get(&rel.id) {
            self.relationships[pos].weight += rel.weight;
            return;
        }
        self.relationship_index
            .insert(rel.id.clone(), self.relationships.len());
        self.relationships.push(rel);
    }

    /// Increment the weight of an existing relationship.
    pub fn strengthen_relationship(&mut self, id: &str, by: f64) -> GraphResult<()> {
        let pos = *self
            .relationship_index
            .get(id)
            .ok_or_else(|| GraphError::RelationshipNotFound(id.to_string()))?;
        self.relationships[pos].weight += by;
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&pos| &self.nodes[pos])
    }

    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationship_index
            .get(id)
            .map(|&pos| &self.relationships[pos])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Relationships in insertion order.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Position of a node in insertion order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    /// Check that every relationship references existing nodes.
    pub fn validate(&self) -> GraphResult<()> {
        for rel in &self.relationships {
            for endpoint in [&rel.start_node_id, &rel.end_node_id] {
                if !self.node_index.contains_key(endpoint) {
                    return Err(GraphError::DanglingRelationship {
                        relationship_id: rel.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// True if any relationship joins `a` and `b`, in either direction.
    pub fn are_connected(&self, a: &str, b: &str) -> bool {
        self.relationships.iter().any(|r| r.connects(a, b))
    }

    /// Ids of nodes adjacent to `id` in either direction, self excluded.
    pub fn neighbor_ids(&self, id: &str) -> BTreeSet<String> {
        self.relationships
            .iter()
            .filter_map(|r| {
                if r.start_node_id == id && r.end_node_id != id {
                    Some(r.end_node_id.clone())
                } else if r.end_node_id == id && r.start_node_id != id {
                    Some(r.start_node_id.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn has_embeddings(&self) -> bool {
        self.nodes.iter().any(|n| n.embedding.is_some())
    }

    pub fn has_centrality(&self) -> bool {
        self.nodes.iter().any(|n| n.centrality.is_some())
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Undirected weighted adjacency. Self-loops are left out of the
    /// neighbour lists; relationships with a missing endpoint are skipped.
    pub(crate) fn adjacency(&self) -> AdjacencyView {
        let n = self.nodes.len();
        let mut maps: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        let mut in_degree = vec![0usize; n];
        let mut out_degree = vec![0usize; n];
        let mut degree = vec![0usize; n];

        for rel in &self.relationships {
            let (Some(&s), Some(&t)) = (
                self.node_index.get(&rel.start_node_id),
                self.node_index.get(&rel.end_node_id),
            ) else {
                warn!(relationship = %rel.id, "Skipping relationship with missing endpoint");
                continue;
            };
            out_degree[s] += 1;
            in_degree[t] += 1;
            degree[s] += 1;
            if s == t {
                continue;
            }
            degree[t] += 1;
            *maps[s].entry(t).or_default() += rel.weight;
            *maps[t].entry(s).or_default() += rel.weight;
        }

        AdjacencyView {
            adj: maps.into_iter().map(|m| m.into_iter().collect()).collect(),
            in_degree,
            out_degree,
            degree,
        }
    }

    /// Symmetric petgraph projection. Fails on dangling relationships.
    pub fn projection(&self) -> GraphResult<GraphProjection> {
        self.validate()?;
        let mut projection = GraphProjection::with_capacity(self.nodes.len(), self.relationships.len());
        for node in &self.nodes {
            projection.add_node(&node.id);
        }
        for rel in &self.relationships {
            if rel.is_self_loop() {
                continue;
            }
            projection.add_undirected_weight(&rel.start_node_id, &rel.end_node_id, rel.weight);
        }
        Ok(projection)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Attach a structural embedding to every node.
    ///
    /// Returns the dimensionality shared by all vectors of this run.
    pub fn generate_embeddings(&mut self) -> GraphResult<usize> {
        let view = self.adjacency();
        let labels: Vec<&BTreeSet<String>> = self.nodes.iter().map(|n| &n.labels).collect();
        let (vectors, dimensions) =
            structural_embeddings(&view.adj, &view.in_degree, &view.out_degree, &labels);

        for (node, vector) in self.nodes.iter_mut().zip(vectors) {
            node.embedding = Some(vector);
        }
        debug!(nodes = self.nodes.len(), dimensions, "Generated embeddings");
        Ok(dimensions)
    }

    /// Attach PageRank, degree and (size permitting) betweenness to every node.
    pub fn compute_centrality(&mut self, config: &AnalyticsConfig) -> GraphResult<()> {
        config.validate_pagerank()?;
        let projection = self.projection()?;
        let degree = self.adjacency().degree;

        let pr = pagerank(&projection, config);
        let bc = if self.nodes.len() <= config.betweenness_max_nodes {
            Some(betweenness_centrality(&projection))
        } else {
            debug!(
                nodes = self.nodes.len(),
                limit = config.betweenness_max_nodes,
                "Skipping betweenness on large graph"
            );
            None
        };

        for (pos, node) in self.nodes.iter_mut().enumerate() {
            node.centrality = Some(Centrality {
                pagerank: pr.get(&node.id).copied().unwrap_or(0.0),
                degree: degree[pos],
                betweenness: bc.as_ref().map(|b| b.get(&node.id).copied().unwrap_or(0.0)),
            });
        }
        debug!(nodes = self.nodes.len(), "Computed centrality");
        Ok(())
    }

    /// Partition the nodes into communities (Louvain local moving).
    pub fn detect_communities(&self, config: &AnalyticsConfig) -> GraphResult<CommunityResult> {
        config.validate_louvain()?;
        if self.nodes.is_empty() {
            return Ok(CommunityResult::default());
        }
        let view = self.adjacency();
        let (assignment, modularity) = louvain_communities(
            &view.adj,
            config.louvain_resolution,
            config.louvain_max_iterations,
        );

        let count = assignment.iter().copied().max().map_or(0, |m| m as usize + 1);
        let mut communities: Vec<Vec<String>> = vec![Vec::new(); count];
        for (pos, &c) in assignment.iter().enumerate() {
            communities[c as usize].push(self.nodes[pos].id.clone());
        }
        // Ids follow first appearance, so a stable sort keeps ties in node order
        communities.sort_by_key(|members| std::cmp::Reverse(members.len()));

        debug!(communities = communities.len(), modularity, "Detected communities");
        Ok(CommunityResult {
            communities,
            modularity,
        })
    }

    /// Flag nodes and relationships that deviate from the structural norm.
    ///
    /// Node score: max(|z(degree)|, z(embedding distance from centroid)).
    /// Relationship score: z(weight). Scores above the configured threshold
    /// are reported.
    pub fn detect_anomalies(&self, config: &AnalyticsConfig) -> GraphResult<AnomalyResult> {
        config.validate_anomaly()?;
        let mut result = AnomalyResult::default();
        if self.nodes.is_empty() {
            return Ok(result);
        }
        let threshold = config.anomaly_z_threshold;
        let view = self.adjacency();

        let mut node_scores = vec![0.0f64; self.nodes.len()];
        let degrees: Vec<f64> = view.degree.iter().map(|&d| d as f64).collect();
        if let Some(z) = z_scores(&degrees, config.anomaly_min_samples) {
            for (score, zi) in node_scores.iter_mut().zip(z) {
                *score = score.max(zi.abs());
            }
        }

        let distances = self.centroid_distances()?;
        if !distances.is_empty() {
            let values: Vec<f64> = distances.iter().map(|(_, d)| *d).collect();
            if let Some(z) = z_scores(&values, config.anomaly_min_samples) {
                for ((pos, _), zi) in distances.iter().zip(z) {
                    node_scores[*pos] = node_scores[*pos].max(zi);
                }
            }
        }

        for (node, score) in self.nodes.iter().zip(node_scores) {
            if score > threshold {
                result.nodes.push(node.id.clone());
                result.scores.insert(node.id.clone(), score);
            }
        }

        let weights: Vec<f64> = self.relationships.iter().map(|r| r.weight).collect();
        if let Some(z) = z_scores(&weights, config.anomaly_min_samples) {
            for (rel, zi) in self.relationships.iter().zip(z) {
                if zi > threshold {
                    result.relationships.push(rel.id.clone());
                    result.scores.insert(rel.id.clone(), zi);
                }
            }
        }

        debug!(
            nodes = result.nodes.len(),
            relationships = result.relationships.len(),
            "Detected anomalies"
        );
        Ok(result)
    }

    /// Euclidean distance of every embedded node from the embedding centroid,
    /// as `(position, distance)`.
    fn centroid_distances(&self) -> GraphResult<Vec<(usize, f64)>> {
        let embedded: Vec<(usize, &Vec<f64>)> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(pos, n)| n.embedding.as_ref().map(|e| (pos, e)))
            .collect();
        let Some((_, first)) = embedded.first() else {
            return Ok(vec![]);
        };
        let dim = first.len();
        for (pos, e) in &embedded {
            if e.len() != dim {
                return Err(GraphError::DimensionMismatch {
                    node_id: self.nodes[*pos].id.clone(),
                    expected: dim,
                    actual: e.len(),
                });
            }
        }

        let mut centroid = vec![0.0; dim];
        for (_, e) in &embedded {
            for (c, x) in centroid.iter_mut().zip(e.iter()) {
                *c += x;
            }
        }
        for c in centroid.iter_mut() {
            *c /= embedded.len() as f64;
        }

        Ok(embedded
            .iter()
            .map(|(pos, e)| {
                let d = e
                    .iter()
                    .zip(&centroid)
                    .map(|(x, c)| (x - c).powi(2))
                    .sum::<f64>()
                    .sqrt();
                (*pos, d)
            })
            .collect())
    }

    /// Aggregate structural metrics.
    ///
    /// Average path length and diameter are computed over the largest
    /// connected component only.
    pub fn compute_metrics(&self) -> GraphMetrics {
        let n = self.nodes.len();
        let mut metrics = GraphMetrics {
            node_count: n,
            relationship_count: self.relationships.len(),
            ..Default::default()
        };
        if n == 0 {
            return metrics;
        }

        let view = self.adjacency();
        let components = connected_components(&view.adj);
        metrics.component_count = components.len();

        let largest = components
            .iter()
            .fold(None::<&Vec<usize>>, |best, c| match best {
                Some(b) if b.len() >= c.len() => Some(b),
                _ => Some(c),
            });
        metrics.largest_component_size = largest.map_or(0, |c| c.len());

        if n < 2 {
            return metrics;
        }

        let adjacent_pairs: usize = view.adj.iter().map(|a| a.len()).sum::<usize>() / 2;
        metrics.density =
            (2.0 * adjacent_pairs as f64 / (n as f64 * (n as f64 - 1.0))).clamp(0.0, 1.0);

        let clustering = local_clustering(&view.adj);
        metrics.clustering_coefficient = clustering.iter().sum::<f64>() / n as f64;

        if let Some(component) = largest {
            let (average, diameter) = path_statistics(&view.adj, component);
            metrics.average_path_length = average;
            metrics.diameter = diameter;
        }

        debug!(
            density = metrics.density,
            clustering = metrics.clustering_coefficient,
            components = metrics.component_count,
            "Computed metrics"
        );
        metrics
    }

    /// Minimal pattern retrieval.
    pub fn query(&self, query: &GraphQuery) -> QueryResult {
        match query {
            GraphQuery::AllNodes => QueryResult::nodes(self.nodes.clone()),
            GraphQuery::AllRelationships => QueryResult::relationships(self.relationships.clone()),
            GraphQuery::NodesWithLabel(label) => QueryResult::nodes(
                self.nodes
                    .iter()
                    .filter(|n| n.has_label(label))
                    .cloned()
                    .collect(),
            ),
            GraphQuery::RelationshipsOfType(rel_type) => QueryResult::relationships(
                self.relationships
                    .iter()
                    .filter(|r| &r.rel_type == rel_type)
                    .cloned()
                    .collect(),
            ),
            GraphQuery::NodeById(id) => {
                QueryResult::nodes(self.node(id).cloned().into_iter().collect())
            }
            GraphQuery::Neighbors(id) => {
                let neighbors = self.neighbor_ids(id);
                let relationships = self
                    .relationships
                    .iter()
                    .filter(|r| &r.start_node_id == id || &r.end_node_id == id)
                    .cloned()
                    .collect();
                QueryResult {
                    nodes: self
                        .nodes
                        .iter()
                        .filter(|n| neighbors.contains(&n.id))
                        .cloned()
                        .collect(),
                    relationships,
                }
            }
            GraphQuery::NodesWhereProperty { key, value } => QueryResult::nodes(
                self.nodes
                    .iter()
                    .filter(|n| n.properties.get(key) == Some(value))
                    .cloned()
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{chain_store, star_store, two_component_store};
    use serde_json::json;

    #[test]
    fn test_add_node_merges_labels() {
        let mut store = GraphStore::new();
        assert!(store.add_node(Node::new("a", "Person")));
        assert!(!store.add_node(Node::new("a", "Customer").with_property("value", json!("A"))));
        let node = store.node("a").unwrap();
        assert!(node.has_label("Person") && node.has_label("Customer"));
        assert_eq!(node.properties["value"], json!("A"));
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_add_relationship_requires_endpoints() {
        let mut store = GraphStore::new();
        store.add_node(Node::new("a", "X"));
        let err = store
            .add_relationship(Relationship::new("r0", "a", "missing", "RELATED_TO"))
            .unwrap_err();
        assert!(matches!(err, GraphError::DanglingRelationship { .. }));
        assert_eq!(store.relationship_count(), 0);
    }

    #[test]
    fn test_strengthen_relationship() {
        let mut store = chain_store(3);
        let id = store.relationships()[0].id.clone();
        store.strengthen_relationship(&id, 2.0).unwrap();
        assert!((store.relationship(&id).unwrap().weight - 3.0).abs() < f64::EPSILON);
        assert!(store.strengthen_relationship("nope", 1.0).is_err());
    }

    #[test]
    fn test_snapshot_roundtrip_rebuilds_indexes() {
        let store = chain_store(4);
        let json = serde_json::to_string(&store).unwrap();
        let restored: GraphStore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.node_count(), 4);
        assert!(restored.node("n2").is_some());
        assert!(restored.validate().is_ok());
    }

    #[test]
    fn test_snapshot_with_dangling_relationship_fails_validation() {
        let raw = json!({
            "nodes": [{ "id": "a", "labels": ["X"] }],
            "relationships": [{
                "id": "r0", "start_node_id": "a", "end_node_id": "ghost",
                "type": "RELATED_TO", "weight": 1.0
            }]
        });
        let store: GraphStore = serde_json::from_value(raw).unwrap();
        assert!(store.validate().is_err());
        assert!(store.projection().is_err());
    }

    #[test]
    fn test_embeddings_same_dimension_everywhere() {
        let mut store = two_component_store();
        let dim = store.generate_embeddings().unwrap();
        assert!(store
            .nodes()
            .iter()
            .all(|n| n.embedding.as_ref().map(|e| e.len()) == Some(dim)));
    }

    #[test]
    fn test_centrality_pagerank_sums_to_one() {
        let mut store = star_store(6);
        store.compute_centrality(&AnalyticsConfig::default()).unwrap();
        let total: f64 = store
            .nodes()
            .iter()
            .map(|n| n.centrality.as_ref().unwrap().pagerank)
            .sum();
        assert!((total - 1.0).abs() < 1e-6);

        let hub = store.node("hub").unwrap().centrality.clone().unwrap();
        assert_eq!(hub.degree, 6);
        assert!(hub.betweenness.unwrap() > 0.0);
    }

    #[test]
    fn test_centrality_rejects_invalid_damping() {
        let mut store = star_store(3);
        let config = AnalyticsConfig {
            pagerank_damping: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            store.compute_centrality(&config),
            Err(GraphError::InvalidConfig(_))
        ));
        assert!(!store.has_centrality());
    }

    #[test]
    fn test_communities_two_components() {
        let store = two_component_store();
        let result = store.detect_communities(&AnalyticsConfig::default()).unwrap();
        assert!(result.len() >= 2);

        // Disjoint and covering
        let mut all: Vec<String> = result.communities.iter().flatten().cloned().collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), store.node_count());
        assert!((-1.0..=1.0).contains(&result.modularity));
    }

    #[test]
    fn test_communities_single_node_trivial() {
        let mut store = GraphStore::new();
        store.add_node(Node::new("only", "X"));
        let result = store.detect_communities(&AnalyticsConfig::default()).unwrap();
        assert_eq!(result.communities, vec![vec!["only".to_string()]]);
        assert_eq!(result.modularity, 0.0);
    }

    #[test]
    fn test_anomalies_flag_hub() {
        let mut store = star_store(10);
        store.generate_embeddings().unwrap();
        let result = store.detect_anomalies(&AnalyticsConfig::default()).unwrap();
        assert_eq!(result.nodes, vec!["hub".to_string()]);
        assert!(result.scores["hub"] > 2.0);
    }

    #[test]
    fn test_anomalies_flag_heavy_relationship() {
        let mut store = star_store(10);
        let id = store.relationships()[3].id.clone();
        store.strengthen_relationship(&id, 40.0).unwrap();
        let result = store.detect_anomalies(&AnalyticsConfig::default()).unwrap();
        assert_eq!(result.relationships, vec![id]);
    }

    #[test]
    fn test_anomalies_dimension_mismatch() {
        let mut store = chain_store(3);
        store.generate_embeddings().unwrap();
        store.nodes[1].embedding = Some(vec![1.0]);
        assert!(matches!(
            store.detect_anomalies(&AnalyticsConfig::default()),
            Err(GraphError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_degenerate_stores_are_neutral() {
        let config = AnalyticsConfig::default();

        let mut empty = GraphStore::new();
        assert_eq!(
            empty.generate_embeddings().unwrap(),
            crate::graph::embeddings::STRUCTURAL_FEATURES
        );
        assert!(empty.compute_centrality(&config).is_ok());
        assert!(empty.detect_communities(&config).unwrap().is_empty());
        assert!(empty.detect_anomalies(&config).unwrap().is_empty());
        assert!(empty.query(&GraphQuery::AllNodes).is_empty());

        let mut single = GraphStore::new();
        single.add_node(Node::new("only", "X"));
        let dim = single.generate_embeddings().unwrap();
        let embedding = single.node("only").unwrap().embedding.clone().unwrap();
        assert_eq!(embedding.len(), dim);
        assert!(embedding.iter().all(|x| *x == 0.0));

        single.compute_centrality(&config).unwrap();
        let centrality = single.node("only").unwrap().centrality.clone().unwrap();
        assert!((centrality.pagerank - 1.0).abs() < 1e-9);
        assert_eq!(centrality.degree, 0);

        assert_eq!(single.detect_anomalies(&config).unwrap(), AnomalyResult::default());
    }

    #[test]
    fn test_metrics_small_graphs() {
        let empty = GraphStore::new().compute_metrics();
        assert_eq!(empty.density, 0.0);
        assert_eq!(empty.clustering_coefficient, 0.0);

        let mut single = GraphStore::new();
        single.add_node(Node::new("a", "X"));
        let m = single.compute_metrics();
        assert_eq!(m.density, 0.0);
        assert_eq!(m.clustering_coefficient, 0.0);
        assert_eq!(m.component_count, 1);
    }

    #[test]
    fn test_metrics_largest_component_paths() {
        // Chain of 4 plus a separate pair: paths measured on the chain only
        let store = two_component_store();
        let m = store.compute_metrics();
        assert_eq!(m.component_count, 2);
        assert_eq!(m.largest_component_size, 4);
        assert_eq!(m.diameter, 3);
        assert!(m.density > 0.0 && m.density <= 1.0);
    }

    #[test]
    fn test_query_patterns() {
        let store = star_store(3);
        assert_eq!(store.query(&GraphQuery::AllNodes).nodes.len(), 4);
        assert_eq!(store.query(&GraphQuery::AllRelationships).relationships.len(), 3);
        assert_eq!(
            store
                .query(&GraphQuery::NodesWithLabel("Leaf".into()))
                .nodes
                .len(),
            3
        );
        let hub = store.query(&GraphQuery::Neighbors("hub".into()));
        assert_eq!(hub.nodes.len(), 3);
        assert_eq!(hub.relationships.len(), 3);
        assert!(store.query(&GraphQuery::NodeById("nope".into())).is_empty());
    }
}
