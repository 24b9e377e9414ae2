//! Analytics engine: orchestrates the full pipeline.
//!
//! The `AnalyticsEngine` trait is the single entry point for analytics
//! consumers (the CLI, embedding applications). A run walks a fixed list of
//! stages:
//!
//! 1. **Build**: tabular rows → [`GraphStore`] via [`GraphBuilder`]
//! 2. **Embed / Centrality / Community / Anomaly / Metrics**: store operations
//! 3. **Classify / LinkPredict**: heuristics over embeddings and centrality
//! 4. **Synthesize**: rank every insight by confidence
//!
//! Every stage is guarded. An error or a panic inside a stage is logged and
//! replaced by one "Analysis Error" insight; the following stages still run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, info};

use super::builder::{BuilderConfig, ColumnDescriptor, GraphBuilder, Row};
use super::embeddings::similar_pairs;
use super::errors::{GraphError, GraphResult};
use super::insights::{
    anomaly_insights, classification_insights, community_insights, embedding_insights,
    error_insight, key_entity_insights, link_insights, metric_insights, sort_insights, Insight,
};
use super::models::AnalyticsConfig;
use super::prediction::{classify_nodes, predict_links};
use super::store::GraphStore;

// ============================================================================
// Output types
// ============================================================================

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Build,
    Embed,
    Centrality,
    Community,
    Anomaly,
    Metrics,
    Classify,
    LinkPredict,
    Synthesize,
}

impl std::fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Build => write!(f, "build"),
            Self::Embed => write!(f, "embed"),
            Self::Centrality => write!(f, "centrality"),
            Self::Community => write!(f, "community"),
            Self::Anomaly => write!(f, "anomaly"),
            Self::Metrics => write!(f, "metrics"),
            Self::Classify => write!(f, "classify"),
            Self::LinkPredict => write!(f, "link_predict"),
            Self::Synthesize => write!(f, "synthesize"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    /// Inputs were absent or the graph was too small
    Skipped,
    Failed,
}

/// How one stage of a run went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage: AnalysisStage,
    pub status: StageStatus,
    pub duration_ms: u64,
    /// Insights the stage contributed (1 for a failed stage)
    pub insight_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a full analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub dataset_id: String,
    pub node_count: usize,
    pub relationship_count: usize,
    /// Sorted by non-increasing confidence
    pub insights: Vec<Insight>,
    pub stages: Vec<StageOutcome>,
    pub computed_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn outcome(&self, stage: AnalysisStage) -> Option<&StageOutcome> {
        self.stages.iter().find(|o| o.stage == stage)
    }

    pub fn failed_stages(&self) -> Vec<AnalysisStage> {
        self.stages
            .iter()
            .filter(|o| o.status == StageStatus::Failed)
            .map(|o| o.stage)
            .collect()
    }
}

// ============================================================================
// Trait
// ============================================================================

/// Analytics engine trait: single entry point for graph analytics.
///
/// Consumers hold a `Box<dyn AnalyticsEngine>` or `Arc<dyn AnalyticsEngine>`.
/// Runs never fail; stage failures are reported as insights.
pub trait AnalyticsEngine: Send + Sync {
    /// Build a graph from tabular rows and analyse it.
    fn run(&self, rows: &[Row], columns: &[ColumnDescriptor], dataset_id: &str) -> AnalysisReport;

    /// Analyse an already built (or deserialized) store.
    fn run_store(&self, store: GraphStore, dataset_id: &str) -> AnalysisReport;

    /// Ranked insights only.
    fn analyze(&self, rows: &[Row], columns: &[ColumnDescriptor], dataset_id: &str) -> Vec<Insight> {
        self.run(rows, columns, dataset_id).insights
    }
}

// ============================================================================
// Stage guard
// ============================================================================

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `f`, turning a panic into [`GraphError::StagePanicked`].
pub(crate) fn guard<T>(stage: AnalysisStage, f: impl FnOnce() -> GraphResult<T>) -> GraphResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(GraphError::StagePanicked {
            stage: stage.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

/// Accumulates insights and stage outcomes over one run.
struct RunLog<'a> {
    dataset_id: &'a str,
    insights: Vec<Insight>,
    stages: Vec<StageOutcome>,
}

impl<'a> RunLog<'a> {
    fn new(dataset_id: &'a str) -> Self {
        Self {
            dataset_id,
            insights: Vec::new(),
            stages: Vec::new(),
        }
    }

    /// Run one insight-producing stage. `Ok(None)` marks the stage skipped.
    fn stage(
        &mut self,
        stage: AnalysisStage,
        f: impl FnOnce() -> GraphResult<Option<Vec<Insight>>>,
    ) {
        let start = Instant::now();
        let result = guard(stage, f);
        let duration_ms = start.elapsed().as_millis() as u64;

        let (status, insight_count, error) = match result {
            Ok(Some(found)) => {
                let count = found.len();
                self.insights.extend(found);
                (StageStatus::Completed, count, None)
            }
            Ok(None) => (StageStatus::Skipped, 0, None),
            Err(e) => {
                self.fail(stage, &e);
                (StageStatus::Failed, 1, Some(e.to_string()))
            }
        };
        debug!(%stage, ?status, insight_count, duration_ms, "Stage finished");
        self.stages.push(StageOutcome {
            stage,
            status,
            duration_ms,
            insight_count,
            error,
        });
    }

    fn fail(&mut self, stage: AnalysisStage, e: &GraphError) {
        error!(dataset = self.dataset_id, %stage, error = %e, "Analysis stage failed");
        self.insights
            .push(error_insight(&stage.to_string(), e, self.dataset_id));
    }
}

// ============================================================================
// Concrete implementation
// ============================================================================

/// The staged analyzer.
#[derive(Debug, Clone, Default)]
pub struct GraphAnalyzer {
    builder: GraphBuilder,
    config: AnalyticsConfig,
}

impl GraphAnalyzer {
    pub fn new(config: AnalyticsConfig, builder_config: BuilderConfig) -> Self {
        Self {
            builder: GraphBuilder::new(builder_config),
            config,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    fn analyze_store(&self, mut store: GraphStore, mut log: RunLog<'_>) -> AnalysisReport {
        let dataset_id = log.dataset_id;
        let config = &self.config;
        // Below two nodes every analysis is neutral
        let trivial = store.node_count() < 2;

        log.stage(AnalysisStage::Embed, || {
            if trivial {
                return Ok(None);
            }
            store.generate_embeddings()?;
            let embedded: Vec<(&str, &[f64])> = store
                .nodes()
                .iter()
                .filter_map(|n| n.embedding.as_deref().map(|e| (n.id.as_str(), e)))
                .collect();
            let pairs = similar_pairs(
                &embedded,
                config.similarity_threshold,
                config.max_similar_pairs,
            );
            Ok(Some(embedding_insights(&pairs, embedded.len(), dataset_id)))
        });

        log.stage(AnalysisStage::Centrality, || {
            if trivial {
                return Ok(None);
            }
            store.compute_centrality(config)?;
            Ok(Some(key_entity_insights(&store, config, dataset_id)))
        });

        log.stage(AnalysisStage::Community, || {
            if trivial {
                return Ok(None);
            }
            let communities = store.detect_communities(config)?;
            Ok(Some(community_insights(&communities, dataset_id)))
        });

        log.stage(AnalysisStage::Anomaly, || {
            if trivial {
                return Ok(None);
            }
            let anomalies = store.detect_anomalies(config)?;
            Ok(Some(anomaly_insights(&anomalies, dataset_id)))
        });

        log.stage(AnalysisStage::Metrics, || {
            if trivial {
                return Ok(None);
            }
            let metrics = store.compute_metrics();
            Ok(Some(metric_insights(&metrics, dataset_id)))
        });

        log.stage(AnalysisStage::Classify, || {
            if trivial || !store.has_embeddings() || !store.has_centrality() {
                return Ok(None);
            }
            let predictions = classify_nodes(&store);
            Ok(Some(classification_insights(&predictions, dataset_id)))
        });

        log.stage(AnalysisStage::LinkPredict, || {
            if trivial || !store.has_embeddings() {
                return Ok(None);
            }
            let predictions = predict_links(&store, config);
            Ok(Some(link_insights(&predictions, dataset_id)))
        });

        let mut insights = std::mem::take(&mut log.insights);
        let start = Instant::now();
        sort_insights(&mut insights);
        log.stages.push(StageOutcome {
            stage: AnalysisStage::Synthesize,
            status: StageStatus::Completed,
            duration_ms: start.elapsed().as_millis() as u64,
            insight_count: insights.len(),
            error: None,
        });

        info!(
            dataset = dataset_id,
            nodes = store.node_count(),
            relationships = store.relationship_count(),
            insights = insights.len(),
            failed = log
                .stages
                .iter()
                .filter(|o| o.status == StageStatus::Failed)
                .count(),
            "Analysis complete"
        );

        AnalysisReport {
            dataset_id: dataset_id.to_string(),
            node_count: store.node_count(),
            relationship_count: store.relationship_count(),
            insights,
            stages: log.stages,
            computed_at: Utc::now(),
        }
    }
}

impl AnalyticsEngine for GraphAnalyzer {
    fn run(&self, rows: &[Row], columns: &[ColumnDescriptor], dataset_id: &str) -> AnalysisReport {
        let mut log = RunLog::new(dataset_id);
        let start = Instant::now();
        let built = guard(AnalysisStage::Build, || {
            Ok(self.builder.build(rows, columns, dataset_id))
        });
        let duration_ms = start.elapsed().as_millis() as u64;

        let store = match built {
            Ok(store) => {
                log.stages.push(StageOutcome {
                    stage: AnalysisStage::Build,
                    status: StageStatus::Completed,
                    duration_ms,
                    insight_count: 0,
                    error: None,
                });
                store
            }
            Err(e) => {
                log.fail(AnalysisStage::Build, &e);
                log.stages.push(StageOutcome {
                    stage: AnalysisStage::Build,
                    status: StageStatus::Failed,
                    duration_ms,
                    insight_count: 1,
                    error: Some(e.to_string()),
                });
                GraphStore::new()
            }
        };
        self.analyze_store(store, log)
    }

    fn run_store(&self, store: GraphStore, dataset_id: &str) -> AnalysisReport {
        let mut log = RunLog::new(dataset_id);
        log.stages.push(StageOutcome {
            stage: AnalysisStage::Build,
            status: StageStatus::Skipped,
            duration_ms: 0,
            insight_count: 0,
            error: None,
        });
        self.analyze_store(store, log)
    }
}
