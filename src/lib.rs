//! Graph Insights
//!
//! Entity-relationship analytics over flat tabular datasets:
//! - Heuristic entity extraction from rows and column descriptors
//! - Structural embeddings, PageRank / betweenness, Louvain communities
//! - Statistical anomaly detection and whole-graph metrics
//! - Heuristic node classification and missing-link prediction
//! - A ranked list of human-readable insights per dataset

pub mod graph;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use graph::{AnalyticsConfig, BuilderConfig, GraphAnalyzer};

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    /// Algorithm parameters and synthesis thresholds
    pub analytics: AnalyticsConfig,
    /// Entity column selection
    pub builder: BuilderConfig,
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "graph-insights.yaml";

/// Application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub analytics: AnalyticsConfig,
    pub builder: BuilderConfig,
}

/// Parse an optional env var, failing loudly on a malformed value.
fn env_override<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid value for {}: {:?}", name, raw))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "graph-insights.yaml" in CWD. If the
    /// file doesn't exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        // 1. Load YAML config (or defaults if file not found)
        let yaml = Self::load_yaml(yaml_path);
        let mut analytics = yaml.analytics;
        let mut builder = yaml.builder;

        // 2. Env var overrides
        if let Some(damping) = env_override("GRAPH_INSIGHTS_PAGERANK_DAMPING")? {
            analytics.pagerank_damping = damping;
        }
        if let Some(z) = env_override("GRAPH_INSIGHTS_ANOMALY_Z")? {
            analytics.anomaly_z_threshold = z;
        }
        if let Some(resolution) = env_override("GRAPH_INSIGHTS_LOUVAIN_RESOLUTION")? {
            analytics.louvain_resolution = resolution;
        }
        if let Some(max_rows) = env_override("GRAPH_INSIGHTS_MAX_ROWS")? {
            builder.max_rows = Some(max_rows);
        }

        Ok(Self { analytics, builder })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    /// Analyzer wired with this configuration.
    pub fn analyzer(&self) -> GraphAnalyzer {
        GraphAnalyzer::new(self.analytics.clone(), self.builder.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
