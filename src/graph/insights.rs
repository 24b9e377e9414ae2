//! Insight records and their synthesis from raw analysis results.
//!
//! An [`Insight`] is an immutable, human-readable finding. Its type is the
//! closed enum [`InsightKind`], serialized as a `"type"` tag next to the
//! common fields, with a small payload per variant.
//!
//! Each `*_insights` function is a pure mapping from one stage's raw result
//! to zero or more insights.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::embeddings::SimilarPair;
use super::errors::GraphError;
use super::models::{AnalyticsConfig, AnomalyResult, CommunityResult, GraphMetrics};
use super::prediction::{LinkPrediction, NodeClass, NodeClassification};
use super::store::GraphStore;

// ============================================================================
// Types
// ============================================================================

/// Bare insight type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Anomaly,
    Community,
    Prediction,
    Pattern,
    Embedding,
}

impl std::fmt::Display for InsightType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anomaly => write!(f, "anomaly"),
            Self::Community => write!(f, "community"),
            Self::Prediction => write!(f, "prediction"),
            Self::Pattern => write!(f, "pattern"),
            Self::Embedding => write!(f, "embedding"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// What a prediction insight predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionKind {
    NodeClassification,
    LinkPrediction,
}

/// Which structural pattern a pattern insight reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    KeyEntities,
    HighClustering,
    SparseGraph,
    AnalysisError,
}

/// Insight type with its per-type payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InsightKind {
    Anomaly {
        anomalous_nodes: usize,
        anomalous_relationships: usize,
        max_score: f64,
    },
    Community {
        community_count: usize,
        modularity: f64,
        largest_community: usize,
    },
    Prediction {
        prediction: PredictionKind,
        count: usize,
    },
    Pattern {
        pattern: PatternKind,
    },
    Embedding {
        similar_pairs: usize,
        max_similarity: f64,
    },
}

impl InsightKind {
    pub fn insight_type(&self) -> InsightType {
        match self {
            Self::Anomaly { .. } => InsightType::Anomaly,
            Self::Community { .. } => InsightType::Community,
            Self::Prediction { .. } => InsightType::Prediction,
            Self::Pattern { .. } => InsightType::Pattern,
            Self::Embedding { .. } => InsightType::Embedding,
        }
    }
}

/// A synthesized finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    #[serde(flatten)]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    /// In [0, 1]
    pub confidence: f64,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    /// Dataset the insight was derived from
    pub dataset_id: String,
    pub timestamp: DateTime<Utc>,
}

impl Insight {
    /// Create an insight; confidence is clamped to [0, 1].
    pub fn new(
        kind: InsightKind,
        title: impl Into<String>,
        description: impl Into<String>,
        confidence: f64,
        severity: Severity,
        dataset_id: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.into(),
            description: description.into(),
            confidence: if confidence.is_nan() {
                0.0
            } else {
                confidence.clamp(0.0, 1.0)
            },
            severity,
            node_ids: None,
            relationship_ids: None,
            metrics: None,
            recommendations: None,
            dataset_id: dataset_id.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_nodes(mut self, ids: Vec<String>) -> Self {
        self.node_ids = Some(ids);
        self
    }

    pub fn with_relationships(mut self, ids: Vec<String>) -> Self {
        self.relationship_ids = Some(ids);
        self
    }

    pub fn with_metrics<I, K>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        self.metrics = Some(metrics.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    pub fn with_recommendations(mut self, recommendations: &[&str]) -> Self {
        self.recommendations = Some(recommendations.iter().map(|r| r.to_string()).collect());
        self
    }

    pub fn insight_type(&self) -> InsightType {
        self.kind.insight_type()
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self.kind,
            InsightKind::Pattern {
                pattern: PatternKind::AnalysisError
            }
        )
    }
}

/// Sort by non-increasing confidence. The sort is stable, so equal
/// confidences keep stage order.
pub fn sort_insights(insights: &mut [Insight]) {
    insights.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}

// ============================================================================
// Synthesis
// ============================================================================

/// Surface the most similar node pairs as one "similarity analysis" insight.
pub fn embedding_insights(
    pairs: &[SimilarPair],
    embedded_nodes: usize,
    dataset_id: &str,
) -> Vec<Insight> {
    if embedded_nodes < 2 || pairs.is_empty() {
        return vec![];
    }
    let max_similarity = pairs.iter().map(|p| p.similarity).fold(f64::MIN, f64::max);

    let mut node_ids: Vec<String> = Vec::new();
    for p in pairs {
        for id in [&p.source, &p.target] {
            if !node_ids.contains(id) {
                node_ids.push(id.clone());
            }
        }
    }
    let examples: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|p| format!("{} ≈ {} ({:.2})", p.source, p.target, p.similarity))
        .collect();

    vec![Insight::new(
        InsightKind::Embedding {
            similar_pairs: pairs.len(),
            max_similarity,
        },
        "Entity Similarity Analysis",
        format!(
            "Found {} pairs of structurally similar entities, e.g. {}",
            pairs.len(),
            examples.join(", ")
        ),
        0.85,
        Severity::Medium,
        dataset_id,
    )
    .with_nodes(node_ids)
    .with_metrics([
        ("similar_pairs", pairs.len() as f64),
        ("max_similarity", max_similarity),
    ])
    .with_recommendations(&[
        "Review similar entities for duplicates or shared behaviour",
        "Consider grouping similar entities in reporting",
    ])]
}

/// Surface the top nodes by PageRank as "key entities".
pub fn key_entity_insights(
    store: &GraphStore,
    config: &AnalyticsConfig,
    dataset_id: &str,
) -> Vec<Insight> {
    if store.node_count() < 2 || store.relationship_count() == 0 {
        return vec![];
    }
    let mut ranked: Vec<(&str, String, f64)> = store
        .nodes()
        .iter()
        .filter_map(|n| {
            n.centrality
                .as_ref()
                .map(|c| (n.id.as_str(), n.display_name(), c.pagerank))
        })
        .collect();
    if ranked.is_empty() {
        return vec![];
    }
    ranked.sort_by(|a, b| b.2.total_cmp(&a.2));
    ranked.truncate(config.key_entity_count);

    let names: Vec<&str> = ranked.iter().map(|(_, name, _)| name.as_str()).collect();
    vec![Insight::new(
        InsightKind::Pattern {
            pattern: PatternKind::KeyEntities,
        },
        "Key Entities Identified",
        format!(
            "The most influential entities by PageRank are: {}",
            names.join(", ")
        ),
        0.9,
        Severity::High,
        dataset_id,
    )
    .with_nodes(ranked.iter().map(|(id, _, _)| id.to_string()).collect())
    .with_metrics(
        ranked
            .iter()
            .map(|(id, _, pr)| (format!("pagerank:{}", id), *pr)),
    )
    .with_recommendations(&[
        "Monitor key entities closely; they connect much of the dataset",
        "Validate data quality for these high-impact records first",
    ])]
}

/// Report a non-trivial community structure.
pub fn community_insights(result: &CommunityResult, dataset_id: &str) -> Vec<Insight> {
    if result.len() <= 1 {
        return vec![];
    }
    let modularity = result.modularity;
    let confidence = (0.4 + 0.6 * modularity).clamp(0.0, 0.95);
    let severity = if modularity > 0.5 {
        Severity::High
    } else {
        Severity::Medium
    };
    let largest = result.communities.iter().map(|c| c.len()).max().unwrap_or(0);

    vec![Insight::new(
        InsightKind::Community {
            community_count: result.len(),
            modularity,
            largest_community: largest,
        },
        "Community Structure Detected",
        format!(
            "The graph splits into {} communities (modularity {:.3}); the largest holds {} entities",
            result.len(),
            modularity,
            largest
        ),
        confidence,
        severity,
        dataset_id,
    )
    .with_metrics([
        ("community_count", result.len() as f64),
        ("modularity", modularity),
        ("largest_community", largest as f64),
    ])
    .with_recommendations(&[
        "Analyse each community separately for segment-specific patterns",
        "Investigate entities bridging communities",
    ])]
}

/// Report anomalous nodes and relationships.
pub fn anomaly_insights(result: &AnomalyResult, dataset_id: &str) -> Vec<Insight> {
    if result.is_empty() {
        return vec![];
    }
    let max_score = result.scores.values().copied().fold(0.0, f64::max);

    vec![Insight::new(
        InsightKind::Anomaly {
            anomalous_nodes: result.nodes.len(),
            anomalous_relationships: result.relationships.len(),
            max_score,
        },
        "Structural Anomalies Detected",
        format!(
            "{} entities and {} relationships deviate strongly from the structural norm",
            result.nodes.len(),
            result.relationships.len()
        ),
        0.8,
        Severity::High,
        dataset_id,
    )
    .with_nodes(result.nodes.clone())
    .with_relationships(result.relationships.clone())
    .with_metrics(result.scores.iter().map(|(id, s)| (id.clone(), *s)))
    .with_recommendations(&[
        "Verify the flagged records for data-entry errors",
        "Check whether the outliers reflect genuine but rare behaviour",
    ])]
}

/// High-clustering and sparse-graph triggers; independent of each other.
pub fn metric_insights(metrics: &GraphMetrics, dataset_id: &str) -> Vec<Insight> {
    if metrics.node_count < 2 {
        return vec![];
    }
    let mut insights = Vec::new();
    let summary = [
        ("density", metrics.density),
        ("clustering_coefficient", metrics.clustering_coefficient),
        ("average_path_length", metrics.average_path_length),
        ("diameter", metrics.diameter as f64),
    ];

    if metrics.clustering_coefficient > 0.6 {
        insights.push(
            Insight::new(
                InsightKind::Pattern {
                    pattern: PatternKind::HighClustering,
                },
                "High Clustering",
                format!(
                    "Entities form tight groups (clustering coefficient {:.2})",
                    metrics.clustering_coefficient
                ),
                0.8,
                Severity::Medium,
                dataset_id,
            )
            .with_metrics(summary)
            .with_recommendations(&["Look for closed groups that always appear together"]),
        );
    }

    if metrics.density < 0.1 {
        insights.push(
            Insight::new(
                InsightKind::Pattern {
                    pattern: PatternKind::SparseGraph,
                },
                "Sparse Graph",
                format!(
                    "Only {:.1}% of possible entity pairs are connected",
                    metrics.density * 100.0
                ),
                0.7,
                Severity::Low,
                dataset_id,
            )
            .with_metrics(summary)
            .with_recommendations(&["Relationships are rare; consider enriching the dataset"]),
        );
    }

    insights
}

/// Aggregate node classification insight.
pub fn classification_insights(
    predictions: &[NodeClassification],
    dataset_id: &str,
) -> Vec<Insight> {
    if predictions.is_empty() {
        return vec![];
    }
    let mut counts: HashMap<NodeClass, usize> = HashMap::new();
    for p in predictions {
        *counts.entry(p.class).or_default() += 1;
    }
    let mut counts: Vec<(NodeClass, usize)> = counts.into_iter().collect();
    counts.sort();

    let average = predictions.iter().map(|p| p.confidence).sum::<f64>() / predictions.len() as f64;
    let confident: Vec<String> = predictions
        .iter()
        .filter(|p| p.confidence > 0.8)
        .map(|p| p.node_id.clone())
        .collect();
    let breakdown: Vec<String> = counts
        .iter()
        .map(|(class, n)| format!("{} {}", n, class))
        .collect();

    let mut metrics: Vec<(String, f64)> = counts
        .iter()
        .map(|(class, n)| (format!("class:{}", class), *n as f64))
        .collect();
    metrics.push(("average_confidence".to_string(), average));

    vec![Insight::new(
        InsightKind::Prediction {
            prediction: PredictionKind::NodeClassification,
            count: predictions.len(),
        },
        "Entity Classification",
        format!(
            "Classified {} entities: {}",
            predictions.len(),
            breakdown.join(", ")
        ),
        average,
        Severity::Low,
        dataset_id,
    )
    .with_nodes(confident)
    .with_metrics(metrics)]
}

/// Aggregate link prediction insight.
pub fn link_insights(predictions: &[LinkPrediction], dataset_id: &str) -> Vec<Insight> {
    if predictions.is_empty() {
        return vec![];
    }
    let mut node_ids: Vec<String> = Vec::new();
    for p in predictions {
        for id in [&p.source, &p.target] {
            if !node_ids.contains(id) {
                node_ids.push(id.clone());
            }
        }
    }
    let examples: Vec<String> = predictions
        .iter()
        .take(3)
        .map(|p| format!("{}: {} ({:.0}%)", p.source, p.target, p.probability * 100.0))
        .collect();

    vec![Insight::new(
        InsightKind::Prediction {
            prediction: PredictionKind::LinkPrediction,
            count: predictions.len(),
        },
        "Potential Missing Relationships",
        format!(
            "{} unconnected entity pairs look likely to be related, e.g. {}",
            predictions.len(),
            examples.join(", ")
        ),
        0.75,
        Severity::Medium,
        dataset_id,
    )
    .with_nodes(node_ids)
    .with_metrics(
        predictions
            .iter()
            .map(|p| (format!("{}|{}", p.source, p.target), p.probability)),
    )
    .with_recommendations(&[
        "Check whether the predicted pairs are missing from the source data",
    ])]
}

/// Synthetic insight standing in for a failed stage.
pub fn error_insight(stage: &str, error: &GraphError, dataset_id: &str) -> Insight {
    Insight::new(
        InsightKind::Pattern {
            pattern: PatternKind::AnalysisError,
        },
        "Analysis Error",
        format!("The {} stage failed: {}", stage, error),
        1.0,
        Severity::High,
        dataset_id,
    )
    .with_recommendations(&["Remaining stages ran; results from this stage are missing"])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str, s: f64) -> SimilarPair {
        SimilarPair {
            source: a.into(),
            target: b.into(),
            similarity: s,
        }
    }

    #[test]
    fn test_insight_serializes_type_tag() {
        let insight = community_insights(
            &CommunityResult {
                communities: vec![vec!["a".into()], vec!["b".into()]],
                modularity: 0.3,
            },
            "ds",
        )
        .remove(0);
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["type"], "community");
        assert_eq!(json["severity"], "medium");
        assert_eq!(json["community_count"], 2);
        assert!(json.get("node_ids").is_none());

        let back: Insight = serde_json::from_value(json).unwrap();
        assert_eq!(back.insight_type(), InsightType::Community);
    }

    #[test]
    fn test_confidence_clamped() {
        let i = Insight::new(
            InsightKind::Pattern {
                pattern: PatternKind::SparseGraph,
            },
            "t",
            "d",
            1.7,
            Severity::Low,
            "ds",
        );
        assert_eq!(i.confidence, 1.0);
    }

    #[test]
    fn test_embedding_insight_rules() {
        assert!(embedding_insights(&[pair("a", "b", 0.9)], 1, "ds").is_empty());
        assert!(embedding_insights(&[], 5, "ds").is_empty());

        let insights = embedding_insights(&[pair("a", "b", 0.95), pair("a", "c", 0.9)], 3, "ds");
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].confidence, 0.85);
        assert_eq!(insights[0].node_ids.as_deref().unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn test_community_confidence_scales_with_modularity() {
        let make = |q: f64| CommunityResult {
            communities: vec![vec!["a".into()], vec!["b".into()]],
            modularity: q,
        };
        let low = community_insights(&make(0.2), "ds").remove(0);
        let high = community_insights(&make(0.7), "ds").remove(0);
        assert!(high.confidence > low.confidence);
        assert!(high.confidence <= 1.0);
        assert_eq!(low.severity, Severity::Medium);
        assert_eq!(high.severity, Severity::High);

        let single = CommunityResult {
            communities: vec![vec!["a".into(), "b".into()]],
            modularity: 0.0,
        };
        assert!(community_insights(&single, "ds").is_empty());
    }

    #[test]
    fn test_anomaly_insight() {
        assert!(anomaly_insights(&AnomalyResult::default(), "ds").is_empty());
        let mut result = AnomalyResult::default();
        result.nodes.push("hub".into());
        result.scores.insert("hub".into(), 3.1);
        let insight = anomaly_insights(&result, "ds").remove(0);
        assert_eq!(insight.confidence, 0.8);
        assert_eq!(insight.severity, Severity::High);
        assert_eq!(insight.insight_type(), InsightType::Anomaly);
    }

    #[test]
    fn test_metric_triggers_independent() {
        let both = GraphMetrics {
            density: 0.05,
            clustering_coefficient: 0.7,
            node_count: 30,
            ..Default::default()
        };
        let insights = metric_insights(&both, "ds");
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].severity, Severity::Medium);
        assert_eq!(insights[1].severity, Severity::Low);

        let neither = GraphMetrics {
            density: 0.5,
            clustering_coefficient: 0.2,
            node_count: 4,
            ..Default::default()
        };
        assert!(metric_insights(&neither, "ds").is_empty());

        let single = GraphMetrics {
            node_count: 1,
            ..Default::default()
        };
        assert!(metric_insights(&single, "ds").is_empty());
    }

    #[test]
    fn test_classification_insight_summary() {
        let predictions = vec![
            NodeClassification {
                node_id: "h".into(),
                class: NodeClass::Hub,
                confidence: 0.9,
            },
            NodeClassification {
                node_id: "l".into(),
                class: NodeClass::Leaf,
                confidence: 0.7,
            },
        ];
        let insight = classification_insights(&predictions, "ds").remove(0);
        assert!((insight.confidence - 0.8).abs() < 1e-12);
        assert_eq!(insight.node_ids.as_deref().unwrap(), ["h"]);
        let metrics = insight.metrics.unwrap();
        assert_eq!(metrics["class:hub"], 1.0);
        assert_eq!(metrics["class:leaf"], 1.0);
    }

    #[test]
    fn test_error_insight_shape() {
        let insight = error_insight(
            "centrality",
            &GraphError::InvalidConfig("bad".into()),
            "ds",
        );
        assert!(insight.is_error());
        assert_eq!(insight.title, "Analysis Error");
        assert_eq!(insight.confidence, 1.0);
        assert_eq!(insight.severity, Severity::High);
    }

    #[test]
    fn test_sort_is_stable_and_descending() {
        let mk = |title: &str, c: f64| {
            Insight::new(
                InsightKind::Pattern {
                    pattern: PatternKind::KeyEntities,
                },
                title,
                "",
                c,
                Severity::Low,
                "ds",
            )
        };
        let mut insights = vec![mk("a", 0.7), mk("b", 0.9), mk("c", 0.7), mk("d", 1.0)];
        sort_insights(&mut insights);
        let titles: Vec<&str> = insights.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["d", "b", "a", "c"]);
    }
}
