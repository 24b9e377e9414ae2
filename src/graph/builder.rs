//! Tabular rows → entity graph.
//!
//! The builder picks the entity-bearing columns of a dataset, turns every
//! distinct (label, value) into a node and links values that co-occur in a
//! row. Repeated co-occurrence strengthens the relationship instead of adding
//! a parallel one.
//!
//! Construction never fails: rows or columns that carry no entities simply
//! contribute nothing, and a dataset without entity columns yields an empty
//! store.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use super::models::{Node, Relationship, DEFAULT_RELATIONSHIP_TYPE};
use super::store::GraphStore;

/// One input row: column name → cell value.
pub type Row = HashMap<String, serde_json::Value>;

/// Inferred type of a column, as supplied by the ingestion layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    String,
    Text,
    Categorical,
    Number,
    Integer,
    Boolean,
    Date,
    #[default]
    Unknown,
}

impl ColumnType {
    /// Whether values of this type can name an entity.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::String | Self::Text | Self::Categorical)
    }
}

/// Description of one dataset column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(default, alias = "type")]
    pub column_type: ColumnType,
    /// Semantic role such as "Person" or "Location"; becomes the node label
    #[serde(default)]
    pub semantic_role: Option<String>,
    #[serde(default)]
    pub business_meaning: Option<String>,
    #[serde(default)]
    pub is_identifier: bool,
    #[serde(default)]
    pub is_dimension: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            semantic_role: None,
            business_meaning: None,
            is_identifier: false,
            is_dimension: false,
        }
    }

    /// Mark the column as an identifier (always entity-bearing).
    pub fn identifier(mut self) -> Self {
        self.is_identifier = true;
        self
    }

    /// Mark the column as a dimension (always entity-bearing).
    pub fn dimension(mut self) -> Self {
        self.is_dimension = true;
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.semantic_role = Some(role.into());
        self
    }

    /// Node label for values of this column.
    pub fn label(&self) -> &str {
        match &self.semantic_role {
            Some(role) if !role.trim().is_empty() => role.trim(),
            _ => &self.name,
        }
    }
}

/// Column-selection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Distinct / non-empty ratio above which an unflagged column is
    /// considered too unique to be an entity (default: 0.5)
    pub max_cardinality_ratio: f64,
    /// Average value length above which text is free prose (default: 64)
    pub max_text_length: usize,
    /// Only the first `max_rows` rows are consumed (default: all)
    pub max_rows: Option<usize>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_cardinality_ratio: 0.5,
            max_text_length: 64,
            max_rows: None,
        }
    }
}

/// Relationship type implied by the labels of its endpoints.
pub fn relationship_type(start_label: &str, end_label: &str) -> &'static str {
    let a = start_label.to_ascii_lowercase();
    let b = end_label.to_ascii_lowercase();
    let either = |x: &str| a == x || b == x;
    if either("person") && either("organization") {
        "AFFILIATED_WITH"
    } else if either("location") {
        "LOCATED_IN"
    } else if either("product") {
        "INVOLVES"
    } else {
        DEFAULT_RELATIONSHIP_TYPE
    }
}

/// Entity key of a cell, or `None` for null / blank cells.
///
/// Strings are trimmed; other values use their JSON text. A number and the
/// string spelling it (`1` and `"1"`) therefore name the same entity.
fn cell_key(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        other => Some(other.to_string()),
    }
}

/// Converts tabular data into a [`GraphStore`].
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    config: BuilderConfig,
}

impl GraphBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// Columns whose values become nodes, in descriptor order.
    pub fn select_entity_columns<'a>(
        &self,
        rows: &[Row],
        columns: &'a [ColumnDescriptor],
    ) -> Vec<&'a ColumnDescriptor> {
        columns
            .iter()
            .filter(|column| {
                if column.is_identifier || column.is_dimension {
                    return true;
                }
                let values: Vec<&serde_json::Value> = rows
                    .iter()
                    .filter_map(|row| row.get(&column.name))
                    .filter(|v| cell_key(v).is_some())
                    .collect();
                if values.is_empty() {
                    return false;
                }

                let textual = column.column_type.is_textual()
                    || (column.column_type == ColumnType::Unknown
                        && values.iter().all(|v| v.is_string()));
                if !textual {
                    return false;
                }

                let keys: Vec<String> = values.iter().filter_map(|v| cell_key(v)).collect();
                let distinct: HashSet<&String> = keys.iter().collect();
                let ratio = distinct.len() as f64 / keys.len() as f64;
                let avg_len = keys.iter().map(|k| k.chars().count()).sum::<usize>() as f64
                    / keys.len() as f64;

                ratio <= self.config.max_cardinality_ratio
                    && avg_len <= self.config.max_text_length as f64
            })
            .collect()
    }

    /// Build the entity graph of a dataset.
    pub fn build(&self, rows: &[Row], columns: &[ColumnDescriptor], dataset_id: &str) -> GraphStore {
        let rows = match self.config.max_rows {
            Some(limit) if rows.len() > limit => &rows[..limit],
            _ => rows,
        };

        let entity_columns = self.select_entity_columns(rows, columns);
        debug!(
            dataset = dataset_id,
            columns = ?entity_columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "Selected entity columns"
        );

        let mut nodes: Vec<Node> = Vec::new();
        let mut node_positions: HashMap<String, usize> = HashMap::new();
        let mut relationships: Vec<Relationship> = Vec::new();
        let mut relationship_positions: HashMap<(String, String), usize> = HashMap::new();

        for row in rows {
            // (node id, label) of every entity cell, duplicates removed
            let mut row_entities: Vec<(String, String)> = Vec::new();

            for column in &entity_columns {
                let Some(key) = row.get(&column.name).and_then(cell_key) else {
                    continue;
                };
                let label = column.label().to_string();
                let id = format!("{}:{}", label, key);

                match node_positions.get(&id) {
                    Some(&pos) => {
                        let occurrences = nodes[pos]
                            .properties
                            .get("occurrences")
                            .and_then(|v| v.as_u64())
                            .unwrap_or(0);
                        nodes[pos]
                            .properties
                            .insert("occurrences".into(), serde_json::json!(occurrences + 1));
                    }
                    None => {
                        node_positions.insert(id.clone(), nodes.len());
                        nodes.push(
                            Node::new(id.clone(), label.clone())
                                .with_property("value", serde_json::json!(key))
                                .with_property("column", serde_json::json!(column.name))
                                .with_property("dataset_id", serde_json::json!(dataset_id))
                                .with_property("occurrences", serde_json::json!(1)),
                        );
                    }
                }

                if !row_entities.iter().any(|(existing, _)| existing == &id) {
                    row_entities.push((id, label));
                }
            }

            for i in 0..row_entities.len() {
                for j in (i + 1)..row_entities.len() {
                    let (start, start_label) = &row_entities[i];
                    let (end, end_label) = &row_entities[j];
                    // Unordered pair: the first occurrence fixes the direction
                    let key = if start <= end {
                        (start.clone(), end.clone())
                    } else {
                        (end.clone(), start.clone())
                    };
                    match relationship_positions.get(&key) {
                        Some(&pos) => relationships[pos].weight += 1.0,
                        None => {
                            let mut rel = Relationship::new(
                                format!("rel:{}", relationships.len()),
                                start.clone(),
                                end.clone(),
                                relationship_type(start_label, end_label),
                            );
                            rel.properties
                                .insert("dataset_id".into(), serde_json::json!(dataset_id));
                            relationship_positions.insert(key, relationships.len());
                            relationships.push(rel);
                        }
                    }
                }
            }
        }

        let mut store = GraphStore::new();
        for node in nodes {
            store.add_node(node);
        }
        for rel in relationships {
            if let Err(e) = store.add_relationship(rel) {
                warn!("Dropping relationship: {}", e);
            }
        }

        info!(
            dataset = dataset_id,
            rows = rows.len(),
            nodes = store.node_count(),
            relationships = store.relationship_count(),
            "Built entity graph"
        );
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_customer_order_scenario() {
        let rows = vec![
            row(&[("customer", json!("A")), ("order", json!("1"))]),
            row(&[("customer", json!("A")), ("order", json!("2"))]),
            row(&[("customer", json!("B")), ("order", json!("1"))]),
        ];
        let columns = vec![
            ColumnDescriptor::new("customer", ColumnType::String).identifier(),
            ColumnDescriptor::new("order", ColumnType::String).identifier(),
        ];
        let store = GraphBuilder::default().build(&rows, &columns, "orders");

        let mut values: Vec<String> = store.nodes().iter().map(|n| n.display_name()).collect();
        values.sort();
        assert_eq!(values, vec!["1", "2", "A", "B"]);

        assert_eq!(store.relationship_count(), 3);
        for (a, b) in [("customer:A", "order:1"), ("customer:A", "order:2"), ("customer:B", "order:1")] {
            let rel = store
                .relationships()
                .iter()
                .find(|r| r.start_node_id == a && r.end_node_id == b)
                .unwrap_or_else(|| panic!("missing {} -> {}", a, b));
            assert!((rel.weight - 1.0).abs() < f64::EPSILON);
            assert_eq!(rel.rel_type, DEFAULT_RELATIONSHIP_TYPE);
        }
        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_repeated_pairs_strengthen_weight() {
        let rows = vec![
            row(&[("a", json!("x")), ("b", json!("y"))]),
            row(&[("a", json!("x")), ("b", json!("y"))]),
        ];
        let columns = vec![
            ColumnDescriptor::new("a", ColumnType::String).dimension(),
            ColumnDescriptor::new("b", ColumnType::String).dimension(),
        ];
        let store = GraphBuilder::default().build(&rows, &columns, "d");
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.relationship_count(), 1);
        assert!((store.relationships()[0].weight - 2.0).abs() < f64::EPSILON);
        assert_eq!(store.node("a:x").unwrap().properties["occurrences"], json!(2));
    }

    #[test]
    fn test_reversed_pair_strengthens_one_relationship() {
        let rows = vec![
            row(&[("from", json!("Paris")), ("to", json!("London"))]),
            row(&[("from", json!("London")), ("to", json!("Paris"))]),
        ];
        let columns = vec![
            ColumnDescriptor::new("from", ColumnType::String)
                .dimension()
                .with_role("Location"),
            ColumnDescriptor::new("to", ColumnType::String)
                .dimension()
                .with_role("Location"),
        ];
        let store = GraphBuilder::default().build(&rows, &columns, "trips");

        assert_eq!(store.node_count(), 2);
        assert_eq!(store.relationship_count(), 1);
        let rel = &store.relationships()[0];
        assert_eq!(rel.start_node_id, "Location:Paris");
        assert_eq!(rel.end_node_id, "Location:London");
        assert!((rel.weight - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_number_and_string_spelling_share_a_node() {
        let rows = vec![
            row(&[("customer", json!("A")), ("order", json!(1))]),
            row(&[("customer", json!("B")), ("order", json!("1"))]),
        ];
        let columns = vec![
            ColumnDescriptor::new("customer", ColumnType::String).identifier(),
            ColumnDescriptor::new("order", ColumnType::Unknown).identifier(),
        ];
        let store = GraphBuilder::default().build(&rows, &columns, "orders");

        assert_eq!(store.node_count(), 3);
        assert_eq!(store.node("order:1").unwrap().properties["occurrences"], json!(2));
    }

    #[test]
    fn test_semantic_role_labels_and_types() {
        let rows = vec![row(&[
            ("employee", json!("Ann")),
            ("company", json!("Acme")),
            ("city", json!("Paris")),
        ])];
        let columns = vec![
            ColumnDescriptor::new("employee", ColumnType::String)
                .identifier()
                .with_role("Person"),
            ColumnDescriptor::new("company", ColumnType::String)
                .identifier()
                .with_role("Organization"),
            ColumnDescriptor::new("city", ColumnType::String)
                .dimension()
                .with_role("Location"),
        ];
        let store = GraphBuilder::default().build(&rows, &columns, "hr");

        assert!(store.node("Person:Ann").unwrap().has_label("Person"));
        let types: Vec<&str> = store
            .relationships()
            .iter()
            .map(|r| r.rel_type.as_str())
            .collect();
        assert_eq!(types, vec!["AFFILIATED_WITH", "LOCATED_IN", "LOCATED_IN"]);
    }

    #[test]
    fn test_single_entity_rows_make_nodes_only() {
        let rows = vec![
            row(&[("customer", json!("A")), ("order", json!(null))]),
            row(&[("customer", json!("B"))]),
        ];
        let columns = vec![
            ColumnDescriptor::new("customer", ColumnType::String).identifier(),
            ColumnDescriptor::new("order", ColumnType::String).identifier(),
        ];
        let store = GraphBuilder::default().build(&rows, &columns, "d");
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.relationship_count(), 0);
    }

    #[test]
    fn test_no_entity_columns_gives_empty_store() {
        let rows = vec![
            row(&[("amount", json!(10.5))]),
            row(&[("amount", json!(3.0))]),
        ];
        let columns = vec![ColumnDescriptor::new("amount", ColumnType::Number)];
        let store = GraphBuilder::default().build(&rows, &columns, "d");
        assert!(store.is_empty());
        assert!(GraphBuilder::default().build(&[], &[], "d").is_empty());
    }

    #[test]
    fn test_heuristic_column_selection() {
        let rows: Vec<Row> = (0..10)
            .map(|i| {
                row(&[
                    ("region", json!(if i % 2 == 0 { "north" } else { "south" })),
                    ("invoice", json!(format!("INV-{}", i))),
                    ("amount", json!(i * 10)),
                    ("channel", json!(if i < 5 { "web" } else { "store" })),
                ])
            })
            .collect();
        let columns = vec![
            ColumnDescriptor::new("region", ColumnType::Categorical),
            ColumnDescriptor::new("invoice", ColumnType::String),
            ColumnDescriptor::new("amount", ColumnType::Integer),
            ColumnDescriptor::new("channel", ColumnType::Unknown),
        ];
        let builder = GraphBuilder::default();
        let selected: Vec<&str> = builder
            .select_entity_columns(&rows, &columns)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        // invoice is unique per row, amount is numeric
        assert_eq!(selected, vec!["region", "channel"]);
    }

    #[test]
    fn test_max_rows_caps_input() {
        let rows: Vec<Row> = (0..10)
            .map(|i| row(&[("k", json!(format!("v{}", i)))]))
            .collect();
        let columns = vec![ColumnDescriptor::new("k", ColumnType::String).identifier()];
        let builder = GraphBuilder::new(BuilderConfig {
            max_rows: Some(3),
            ..Default::default()
        });
        assert_eq!(builder.build(&rows, &columns, "d").node_count(), 3);
    }

    #[test]
    fn test_relationship_type_hints() {
        assert_eq!(relationship_type("Organization", "person"), "AFFILIATED_WITH");
        assert_eq!(relationship_type("customer", "Location"), "LOCATED_IN");
        assert_eq!(relationship_type("Product", "order"), "INVOLVES");
        assert_eq!(relationship_type("customer", "order"), "RELATED_TO");
    }
}
