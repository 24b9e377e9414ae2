//! End-to-end tests for graph-insights
//!
//! Drive the public API the way an embedding application would: rows and
//! column descriptors in, a ranked insight list out.

use graph_insights::graph::prediction::predict_links;
use graph_insights::graph::{
    AnalysisStage, AnalyticsConfig, AnalyticsEngine, BuilderConfig, ColumnDescriptor, ColumnType,
    GraphAnalyzer, GraphBuilder, GraphQuery, InsightType, Row, StageStatus,
};
use serde_json::json;

fn row(cells: &[(&str, serde_json::Value)]) -> Row {
    cells
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn identifier(name: &str) -> ColumnDescriptor {
    ColumnDescriptor::new(name, ColumnType::String).identifier()
}

/// Customers A and B; A placed orders 1 and 2, B placed order 1.
fn customer_orders() -> (Vec<Row>, Vec<ColumnDescriptor>) {
    let rows = vec![
        row(&[("customer", json!("A")), ("order", json!(1))]),
        row(&[("customer", json!("A")), ("order", json!(2))]),
        row(&[("customer", json!("B")), ("order", json!(1))]),
    ];
    (rows, vec![identifier("customer"), identifier("order")])
}

/// Three disjoint triangles over the columns c, p and r.
fn triangles() -> (Vec<Row>, Vec<ColumnDescriptor>) {
    let rows = (1..=3)
        .map(|i| {
            row(&[
                ("c", json!(format!("c{}", i))),
                ("p", json!(format!("p{}", i))),
                ("r", json!(format!("r{}", i))),
            ])
        })
        .collect();
    (rows, vec![identifier("c"), identifier("p"), identifier("r")])
}

/// A small retail dataset with a dominant store and a few regions.
fn retail() -> (Vec<Row>, Vec<ColumnDescriptor>) {
    let mut rows = Vec::new();
    for i in 0..24 {
        let customer = format!("cust-{}", i % 8);
        let store = if i % 3 == 0 { "Downtown" } else { "Mall" };
        let region = ["North", "South", "East"][i % 3];
        rows.push(row(&[
            ("customer", json!(customer)),
            ("store", json!(store)),
            ("region", json!(region)),
            ("amount", json!(10 + i)),
        ]));
    }
    let columns = vec![
        identifier("customer").with_role("Person"),
        ColumnDescriptor::new("store", ColumnType::Categorical).with_role("Organization"),
        ColumnDescriptor::new("region", ColumnType::Categorical).with_role("Location"),
        ColumnDescriptor::new("amount", ColumnType::Integer),
    ];
    (rows, columns)
}

// --- Construction ---

#[test]
fn test_customer_order_graph() {
    let (rows, columns) = customer_orders();
    let store = GraphBuilder::default().build(&rows, &columns, "orders");

    let mut ids: Vec<&str> = store.nodes().iter().map(|n| n.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["customer:A", "customer:B", "order:1", "order:2"]);

    assert_eq!(store.relationship_count(), 3);
    for (a, b) in [("customer:A", "order:1"), ("customer:A", "order:2"), ("customer:B", "order:1")] {
        let rel = store
            .relationships()
            .iter()
            .find(|r| r.connects(a, b))
            .unwrap();
        assert_eq!(rel.weight, 1.0);
    }
    assert!(store.validate().is_ok());

    let metrics = store.compute_metrics();
    assert!((metrics.density - 0.5).abs() < 1e-12);
}

#[test]
fn test_repeated_cooccurrence_strengthens() {
    let rows = vec![
        row(&[("customer", json!("A")), ("order", json!(1))]),
        row(&[("customer", json!("A")), ("order", json!(1))]),
    ];
    let columns = vec![identifier("customer"), identifier("order")];
    let store = GraphBuilder::default().build(&rows, &columns, "dup");
    assert_eq!(store.relationship_count(), 1);
    assert_eq!(store.relationships()[0].weight, 2.0);
    assert_eq!(store.node("customer:A").unwrap().properties["occurrences"], json!(2));
}

#[test]
fn test_no_entity_columns_gives_empty_graph() {
    let rows = vec![row(&[("amount", json!(3))]), row(&[("amount", json!(4))])];
    let columns = vec![ColumnDescriptor::new("amount", ColumnType::Number)];
    let report = GraphAnalyzer::default().run(&rows, &columns, "numbers");
    assert_eq!(report.node_count, 0);
    assert!(report.insights.is_empty());
    assert!(report.failed_stages().is_empty());
}

// --- Pipeline ---

#[test]
fn test_single_node_dataset_yields_nothing() {
    let rows = vec![row(&[("customer", json!("A"))])];
    let columns = vec![identifier("customer")];
    let insights = GraphAnalyzer::default().analyze(&rows, &columns, "lonely");
    assert!(insights.is_empty());
}

#[test]
fn test_centrality_failure_is_isolated() {
    let (rows, columns) = triangles();
    let analyzer = GraphAnalyzer::new(
        AnalyticsConfig {
            pagerank_damping: 1.5,
            ..Default::default()
        },
        BuilderConfig::default(),
    );
    let report = analyzer.run(&rows, &columns, "triangles");

    let errors: Vec<_> = report.insights.iter().filter(|i| i.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].title, "Analysis Error");
    assert_eq!(errors[0].confidence, 1.0);
    assert!(errors[0].description.contains("centrality"));

    assert!(report
        .insights
        .iter()
        .any(|i| i.insight_type() == InsightType::Embedding));
    assert!(report
        .insights
        .iter()
        .any(|i| i.title == "High Clustering"));
    assert_eq!(report.failed_stages(), vec![AnalysisStage::Centrality]);
    assert_eq!(
        report.outcome(AnalysisStage::Classify).unwrap().status,
        StageStatus::Skipped
    );
}

#[test]
fn test_insights_sorted_by_confidence() {
    let (rows, columns) = retail();
    let report = GraphAnalyzer::default().run(&rows, &columns, "retail");
    assert!(!report.insights.is_empty());
    assert!(report
        .insights
        .windows(2)
        .all(|w| w[0].confidence >= w[1].confidence));
    for insight in &report.insights {
        assert!((0.0..=1.0).contains(&insight.confidence));
        assert_eq!(insight.dataset_id, "retail");
    }
    assert_eq!(report.stages.len(), 9);
}

#[test]
fn test_report_serializes_with_type_tags() {
    let (rows, columns) = retail();
    let engine: Box<dyn AnalyticsEngine> = Box::new(GraphAnalyzer::default());
    let report = engine.run(&rows, &columns, "retail");
    let json = serde_json::to_value(&report).unwrap();

    let insights = json["insights"].as_array().unwrap();
    assert_eq!(insights.len(), report.insights.len());
    for insight in insights {
        assert!(insight["type"].is_string());
        assert!(insight["id"].is_string());
    }
    assert_eq!(json["stages"][0]["stage"], "build");
}

// --- Analyses on built graphs ---

#[test]
fn test_link_predictions_never_connected() {
    let (rows, columns) = retail();
    let mut store = GraphBuilder::default().build(&rows, &columns, "retail");
    store.generate_embeddings().unwrap();
    let predictions = predict_links(&store, &AnalyticsConfig::default());
    for p in &predictions {
        assert!(!store.are_connected(&p.source, &p.target));
        assert!(p.probability > 0.5 && p.probability <= 1.0);
    }
}

#[test]
fn test_disconnected_components_get_separate_communities() {
    let rows = vec![
        row(&[("a", json!("x1")), ("b", json!("y1"))]),
        row(&[("a", json!("x1")), ("b", json!("y2"))]),
        row(&[("a", json!("x2")), ("b", json!("y3"))]),
    ];
    let columns = vec![identifier("a"), identifier("b")];
    let store = GraphBuilder::default().build(&rows, &columns, "split");
    let result = store.detect_communities(&AnalyticsConfig::default()).unwrap();
    assert!(result.len() >= 2);
    assert_ne!(result.community_of("a:x1"), result.community_of("a:x2"));
}

#[test]
fn test_embedding_dimension_constant() {
    let (rows, columns) = retail();
    let mut store = GraphBuilder::default().build(&rows, &columns, "retail");
    let dim = store.generate_embeddings().unwrap();
    assert!(store
        .nodes()
        .iter()
        .all(|n| n.embedding.as_ref().map(Vec::len) == Some(dim)));
}

#[test]
fn test_semantic_relationship_types() {
    let (rows, columns) = retail();
    let store = GraphBuilder::default().build(&rows, &columns, "retail");
    let located = store.query(&"()-[r:LOCATED_IN]->()".parse::<GraphQuery>().unwrap());
    assert!(!located.relationships.is_empty());
    let affiliated = store.query(&"()-[r:AFFILIATED_WITH]->()".parse::<GraphQuery>().unwrap());
    assert!(!affiliated.relationships.is_empty());

    let people = store.query(&"(n:Person)".parse::<GraphQuery>().unwrap());
    assert_eq!(people.nodes.len(), 8);
}
