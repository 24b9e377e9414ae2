//! Minimal pattern retrieval over a [`GraphStore`](super::store::GraphStore).
//!
//! Not a query language: a handful of fixed shapes, optionally written in a
//! Cypher-flavoured textual form.
//!
//! | text                    | query                              |
//! |-------------------------|------------------------------------|
//! | `(n)`                   | [`GraphQuery::AllNodes`]           |
//! | `(n:Person)`            | [`GraphQuery::NodesWithLabel`]     |
//! | `(n {value: "A"})`      | [`GraphQuery::NodesWhereProperty`] |
//! | `()-[r]->()`            | [`GraphQuery::AllRelationships`]   |
//! | `()-[r:LOCATED_IN]->()` | [`GraphQuery::RelationshipsOfType`]|
//! | `#customer:A`           | [`GraphQuery::NodeById`]           |
//! | `neighbors(#customer:A)`| [`GraphQuery::Neighbors`]          |

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

use super::errors::GraphError;
use super::models::{Node, Relationship};

/// A retrieval pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern", content = "argument", rename_all = "snake_case")]
pub enum GraphQuery {
    AllNodes,
    AllRelationships,
    NodesWithLabel(String),
    RelationshipsOfType(String),
    NodeById(String),
    /// Adjacent nodes and the relationships joining them to the given node
    Neighbors(String),
    NodesWhereProperty {
        key: String,
        value: serde_json::Value,
    },
}

/// Nodes and relationships matched by a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
}

impl QueryResult {
    pub fn nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            relationships: vec![],
        }
    }

    pub fn relationships(relationships: Vec<Relationship>) -> Self {
        Self {
            nodes: vec![],
            relationships,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }
}

type CachedRegex = OnceLock<Result<Regex, regex::Error>>;

const NEIGHBORS_PATTERN: &str = r"^neighbors\(\s*#(?P<id>[^)]+?)\s*\)$";
const RELATIONSHIP_PATTERN: &str =
    r"^\(\s*\w*\s*\)\s*-\[\s*\w*\s*(?::\s*(?P<type>\w+))?\s*\]->\s*\(\s*\w*\s*\)$";
const PROPERTY_PATTERN: &str = r"^\(\s*\w*\s*\{\s*(?P<key>\w+)\s*:\s*(?P<value>.+?)\s*\}\s*\)$";
const NODE_PATTERN: &str = r"^\(\s*\w*\s*(?::\s*(?P<label>\w+))?\s*\)$";

static NEIGHBORS: CachedRegex = OnceLock::new();
static RELATIONSHIP: CachedRegex = OnceLock::new();
static PROPERTY: CachedRegex = OnceLock::new();
static NODE: CachedRegex = OnceLock::new();

/// Compiled on first use, then shared by every parse.
fn cached(cell: &'static CachedRegex, pattern: &str) -> Result<&'static Regex, GraphError> {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map_err(|e| GraphError::InvalidQuery(e.to_string()))
}

impl FromStr for GraphQuery {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(GraphError::InvalidQuery("empty pattern".to_string()));
        }

        if let Some(id) = text.strip_prefix('#') {
            return Ok(GraphQuery::NodeById(id.to_string()));
        }

        let neighbors = cached(&NEIGHBORS, NEIGHBORS_PATTERN)?;
        if let Some(caps) = neighbors.captures(text) {
            return Ok(GraphQuery::Neighbors(caps["id"].to_string()));
        }

        let relationship = cached(&RELATIONSHIP, RELATIONSHIP_PATTERN)?;
        if let Some(caps) = relationship.captures(text) {
            return Ok(match caps.name("type") {
                Some(t) => GraphQuery::RelationshipsOfType(t.as_str().to_string()),
                None => GraphQuery::AllRelationships,
            });
        }

        let property = cached(&PROPERTY, PROPERTY_PATTERN)?;
        if let Some(caps) = property.captures(text) {
            let raw = &caps["value"];
            let value = serde_json::from_str(raw)
                .map_err(|e| GraphError::InvalidQuery(format!("bad property value {}: {}", raw, e)))?;
            return Ok(GraphQuery::NodesWhereProperty {
                key: caps["key"].to_string(),
                value,
            });
        }

        let node = cached(&NODE, NODE_PATTERN)?;
        if let Some(caps) = node.captures(text) {
            return Ok(match caps.name("label") {
                Some(l) => GraphQuery::NodesWithLabel(l.as_str().to_string()),
                None => GraphQuery::AllNodes,
            });
        }

        Err(GraphError::InvalidQuery(text.to_string()))
    }
}
