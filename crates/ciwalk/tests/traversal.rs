//! Integration tests for the traversal engine.
//!
//! These run complete traversals against the in-memory record store and
//! check depth bounding, direction and filter semantics, cycle handling and
//! degradation on remote failures.

mod common;

use ciwalk::config::TableConfig;
use ciwalk::domain::{Direction, DirectionFilter, Edge, TraversalRequest, TraversalResult};
use ciwalk::error::Error;
use ciwalk::query::in_memory::{InMemoryRecordStore, RecordedCall};
use ciwalk::query::{Record, RecordQuery};
use ciwalk::traversal::{RELATIONSHIP_ROW_LIMIT, Traversal};
use ciwalk::traverse;
use common::{CI_TABLE, GraphBuilder, REL_TABLE, expansion_filter};
use proptest::prelude::*;
use async_trait::async_trait;
use rstest::rstest;
use tokio_util::sync::CancellationToken;

async fn run(store: &InMemoryRecordStore, request: TraversalRequest) -> TraversalResult {
    traverse(store, &TableConfig::default(), &request)
        .await
        .unwrap()
}

fn ids(result: &TraversalResult) -> Vec<&str> {
    result
        .relationships
        .iter()
        .map(|edge| edge.other_id.as_str())
        .collect()
}

/// Filters of the relationship queries issued, in order.
async fn expansions(store: &InMemoryRecordStore) -> Vec<String> {
    store
        .calls()
        .await
        .into_iter()
        .filter_map(|call| match call {
            RecordedCall::Query { table, filter, .. } if table == REL_TABLE => Some(filter),
            _ => None,
        })
        .collect()
}

/// r -> a -> b -> c, plus u -> r
fn chain() -> InMemoryRecordStore {
    GraphBuilder::new()
        .ci("r", "cmdb_ci_appl")
        .ci("a", "cmdb_ci_server")
        .ci("b", "cmdb_ci_database")
        .ci("c", "cmdb_ci_storage")
        .ci("u", "cmdb_ci_service")
        .rel("r", "a", "Depends on::Used by")
        .rel("a", "b", "Depends on::Used by")
        .rel("b", "c", "Runs on::Runs")
        .rel("u", "r", "Depends on::Used by")
        .build()
}

// ========== Basic Traversal ==========

fn shape(result: &TraversalResult) -> Vec<(&str, Direction, u8)> {
    result
        .relationships
        .iter()
        .map(|e| (e.other_id.as_str(), e.direction, e.depth))
        .collect()
}

#[tokio::test]
async fn test_edges_in_depth_first_order() {
    let store = chain();
    let result = run(&store, TraversalRequest::by_id("r")).await;

    assert_eq!(result.root.id, "r");
    assert_eq!(result.root.name, "r-name");
    assert_eq!(result.root.class, "cmdb_ci_appl");

    // Each expanded node also reports the edge back to the node it was
    // reached from; that node is already visited and is not expanded again.
    assert_eq!(
        shape(&result),
        vec![
            ("a", Direction::Downstream, 1),
            ("r", Direction::Upstream, 2),
            ("b", Direction::Downstream, 2),
            ("a", Direction::Upstream, 3),
            ("c", Direction::Downstream, 3),
            ("u", Direction::Upstream, 1),
            ("r", Direction::Downstream, 2),
        ]
    );
    assert_eq!(
        result.relationships[4],
        Edge {
            other_id: "c".into(),
            other_name: "c-name".into(),
            other_class: "cmdb_ci_storage".into(),
            relation_type: "Runs on::Runs".into(),
            direction: Direction::Downstream,
            depth: 3,
        }
    );
    assert_eq!(result.relationships[1].other_class, "cmdb_ci_appl");
    assert_eq!(result.meta.depth, 3);
    assert_eq!(result.meta.direction, DirectionFilter::Both);
    assert_eq!(result.meta.total, 7);
}

#[tokio::test]
async fn test_direction_is_relative_to_expanding_node() {
    // a is upstream of r; from a, its own parent x is upstream again
    let store = GraphBuilder::new()
        .ci("r", "cmdb_ci_appl")
        .rel("a", "r", "Depends on::Used by")
        .rel("x", "a", "Depends on::Used by")
        .build();

    let result = run(&store, TraversalRequest::by_id("r").with_depth(2)).await;
    assert_eq!(
        shape(&result),
        vec![
            ("a", Direction::Upstream, 1),
            ("r", Direction::Downstream, 2),
            ("x", Direction::Upstream, 2),
        ]
    );
}

#[tokio::test]
async fn test_root_by_name() {
    let store = GraphBuilder::new()
        .named_ci("r1", "web01", "cmdb_ci_server")
        .named_ci("r2", "web01", "cmdb_ci_server")
        .rel("r1", "a", "Depends on::Used by")
        .rel("r2", "b", "Depends on::Used by")
        .build();

    let result = run(&store, TraversalRequest::by_name("web01").with_depth(1)).await;
    assert_eq!(result.root.id, "r1");
    assert_eq!(ids(&result), vec!["a"]);
}

// ========== Depth Bounding ==========

#[rstest]
#[case::zero_is_one(0, 1)]
#[case::negative_is_one(-4, 1)]
#[case::nine_is_five(9, 5)]
#[case::max_is_five(i64::MAX, 5)]
#[tokio::test]
async fn test_depth_is_clamped(#[case] requested: i64, #[case] equivalent: i64) {
    let store = GraphBuilder::new()
        .ci("n0", "cmdb_ci")
        .rel("n0", "n1", "Depends on::Used by")
        .rel("n1", "n2", "Depends on::Used by")
        .rel("n2", "n3", "Depends on::Used by")
        .rel("n3", "n4", "Depends on::Used by")
        .rel("n4", "n5", "Depends on::Used by")
        .rel("n5", "n6", "Depends on::Used by")
        .build();

    let clamped = run(&store, TraversalRequest::by_id("n0").with_depth(requested)).await;
    let reference = run(&store, TraversalRequest::by_id("n0").with_depth(equivalent)).await;

    assert_eq!(clamped, reference);
    assert_eq!(i64::from(clamped.meta.depth), equivalent);
    // n0 reports one edge; every further expanded node reports two
    assert_eq!(
        clamped.relationships.len(),
        usize::try_from(2 * equivalent - 1).unwrap()
    );
}

#[tokio::test]
async fn test_depth_one_expands_only_root() {
    let store = chain();
    let result = run(&store, TraversalRequest::by_id("r").with_depth(1)).await;

    assert_eq!(ids(&result), vec!["a", "u"]);
    assert_eq!(expansions(&store).await, vec![expansion_filter("r")]);
}

// ========== Cycles and Self-Loops ==========

#[tokio::test]
async fn test_cycle_terminates_and_expands_each_node_once() {
    let store = GraphBuilder::new()
        .ci("A", "cmdb_ci")
        .ci("B", "cmdb_ci")
        .ci("C", "cmdb_ci")
        .rel("A", "B", "Depends on::Used by")
        .rel("B", "C", "Depends on::Used by")
        .rel("C", "A", "Depends on::Used by")
        .build();

    let result = run(&store, TraversalRequest::by_id("A").with_depth(5)).await;

    assert_eq!(
        expansions(&store).await,
        vec![
            expansion_filter("A"),
            expansion_filter("B"),
            expansion_filter("C")
        ]
    );
    // A sees B downstream and C upstream; B and C each see both neighbours.
    assert_eq!(result.meta.total, 6);
    assert!(result.relationships.iter().all(|e| e.depth <= 3));
}

#[tokio::test]
async fn test_self_loops_are_never_reported() {
    let store = GraphBuilder::new()
        .ci("r", "cmdb_ci")
        .rel("r", "r", "Depends on::Used by")
        .rel("r", "a", "Depends on::Used by")
        .rel("a", "a", "Depends on::Used by")
        .build();

    let result = run(&store, TraversalRequest::by_id("r").with_depth(5)).await;
    assert_eq!(ids(&result), vec!["a", "r"]);

    // Every edge points away from the node it was found from.
    let sources = ["r", "a"];
    for (edge, source) in result.relationships.iter().zip(sources) {
        assert_ne!(edge.other_id, source);
    }
}

#[tokio::test]
async fn test_node_reached_twice_is_expanded_once() {
    // Diamond: r -> a -> d, r -> b -> d
    let store = GraphBuilder::new()
        .ci("r", "cmdb_ci")
        .rel("r", "a", "Depends on::Used by")
        .rel("r", "b", "Depends on::Used by")
        .rel("a", "d", "Depends on::Used by")
        .rel("b", "d", "Depends on::Used by")
        .build();

    let result = run(&store, TraversalRequest::by_id("r").with_depth(5)).await;

    let d_edges = result
        .relationships
        .iter()
        .filter(|e| e.other_id == "d")
        .count();
    assert_eq!(d_edges, 2);

    let filters = expansions(&store).await;
    assert_eq!(
        filters.iter().filter(|f| **f == expansion_filter("d")).count(),
        1
    );
    assert_eq!(filters.len(), 4);
}

// ========== Dedup and Row Cap ==========

#[tokio::test]
async fn test_parallel_rows_collapse_first_type_wins() {
    let store = GraphBuilder::new()
        .ci("r", "cmdb_ci")
        .rel("r", "a", "Depends on::Used by")
        .rel("r", "a", "Runs on::Runs")
        .rel("a", "r", "Connects to::Connected by")
        .build();

    let result = run(&store, TraversalRequest::by_id("r").with_depth(1)).await;
    let found: Vec<(&str, Direction, &str)> = result
        .relationships
        .iter()
        .map(|e| (e.other_id.as_str(), e.direction, e.relation_type.as_str()))
        .collect();

    // Same pair in the other direction is a distinct edge.
    assert_eq!(
        found,
        vec![
            ("a", Direction::Downstream, "Depends on::Used by"),
            ("a", Direction::Upstream, "Connects to::Connected by"),
        ]
    );
}

#[tokio::test]
async fn test_rows_beyond_limit_are_dropped() {
    let mut graph = GraphBuilder::new().ci("hub", "cmdb_ci");
    for i in 0..=RELATIONSHIP_ROW_LIMIT {
        graph = graph.rel("hub", &format!("leaf{i:03}"), "Depends on::Used by");
    }
    let store = graph.build();

    let result = run(&store, TraversalRequest::by_id("hub").with_depth(1)).await;

    assert_eq!(result.meta.total, RELATIONSHIP_ROW_LIMIT);
    assert!(!ids(&result).contains(&"leaf100"));
    assert!(ids(&result).contains(&"leaf099"));
}

// ========== Filters ==========

#[rstest]
#[case::upstream(DirectionFilter::Upstream, vec!["u"])]
#[case::downstream(DirectionFilter::Downstream, vec!["a"])]
#[case::both(DirectionFilter::Both, vec!["a", "u"])]
#[tokio::test]
async fn test_direction_filter(#[case] direction: DirectionFilter, #[case] expected: Vec<&str>) {
    let store = chain();
    let result = run(
        &store,
        TraversalRequest::by_id("r")
            .with_depth(1)
            .with_direction(direction),
    )
    .await;

    assert_eq!(ids(&result), expected);
    assert_eq!(result.meta.direction, direction);
}

#[tokio::test]
async fn test_type_filter_is_case_insensitive_and_prunes() {
    let store = chain();
    let result = run(
        &store,
        TraversalRequest::by_id("r")
            .with_depth(5)
            .with_type_filter("DEPENDS"),
    )
    .await;

    // b -> c is "Runs on" and is not followed
    assert!(!ids(&result).contains(&"c"));
    assert!(ids(&result).contains(&"b"));
    assert!(
        result
            .relationships
            .iter()
            .all(|e| e.relation_type.starts_with("Depends on"))
    );
    assert!(!expansions(&store).await.contains(&expansion_filter("c")));
}

#[tokio::test]
async fn test_class_filter_narrows_report_not_search() {
    let store = GraphBuilder::new()
        .ci("R", "Router")
        .ci("B", "Switch")
        .ci("C", "Server")
        .rel("R", "B", "Connects to::Connected by")
        .rel("B", "C", "Connects to::Connected by")
        .build();

    let result = run(
        &store,
        TraversalRequest::by_id("R")
            .with_depth(2)
            .with_class_filter("server"),
    )
    .await;

    assert_eq!(ids(&result), vec!["C"]);
    assert_eq!(result.relationships[0].depth, 2);
    assert_eq!(result.relationships[0].other_class, "Server");
    assert!(expansions(&store).await.contains(&expansion_filter("B")));
}

// ========== Failure Handling ==========

#[tokio::test]
async fn test_row_fetch_failure_makes_node_a_leaf() {
    let store = GraphBuilder::new()
        .ci("r", "cmdb_ci")
        .rel("r", "a", "Depends on::Used by")
        .rel("r", "b", "Depends on::Used by")
        .rel("a", "a2", "Depends on::Used by")
        .rel("b", "b2", "Depends on::Used by")
        .failing_rows_for("a")
        .build();

    let result = run(&store, TraversalRequest::by_id("r").with_depth(2)).await;
    assert_eq!(ids(&result), vec!["a", "b", "r", "b2"]);
}

#[tokio::test]
async fn test_root_row_fetch_failure_yields_empty_result() {
    let store = GraphBuilder::new()
        .ci("r", "cmdb_ci")
        .rel("r", "a", "Depends on::Used by")
        .failing_rows_for("r")
        .build();

    let result = run(&store, TraversalRequest::by_id("r")).await;
    assert!(result.relationships.is_empty());
    assert_eq!(result.meta.total, 0);
}

#[tokio::test]
async fn test_class_lookup_failure_is_unknown_and_not_retried() {
    // x is reached from r and again from a
    let store = GraphBuilder::new()
        .ci("r", "cmdb_ci")
        .ci("a", "cmdb_ci_server")
        .rel("r", "x", "Depends on::Used by")
        .rel("r", "a", "Depends on::Used by")
        .rel("a", "x", "Depends on::Used by")
        .failing_class_for("x")
        .build();

    let result = run(&store, TraversalRequest::by_id("r").with_depth(2)).await;

    let classes: Vec<&str> = result
        .relationships
        .iter()
        .filter(|e| e.other_id == "x")
        .map(|e| e.other_class.as_str())
        .collect();
    assert_eq!(classes, vec!["unknown", "unknown"]);

    let x_lookups = store
        .calls()
        .await
        .into_iter()
        .filter(|call| matches!(call, RecordedCall::Get { table, id } if table == CI_TABLE && id == "x"))
        .count();
    assert_eq!(x_lookups, 1);
}

#[rstest]
#[case::by_id(TraversalRequest::by_id("ghost"))]
#[case::by_name(TraversalRequest::by_name("ghost"))]
#[tokio::test]
async fn test_unresolvable_root_is_not_found(#[case] request: TraversalRequest) {
    let store = chain();
    let err = traverse(&store, &TableConfig::default(), &request)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert!(expansions(&store).await.is_empty());
}

#[rstest]
#[case::neither(TraversalRequest::default())]
#[case::both(TraversalRequest { root_name: Some("r-name".into()), ..TraversalRequest::by_id("r") })]
#[case::blank(TraversalRequest::by_id("   "))]
#[tokio::test]
async fn test_invalid_root_selection(#[case] request: TraversalRequest) {
    let store = chain();
    let err = traverse(&store, &TableConfig::default(), &request)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert!(store.calls().await.is_empty());
}

// ========== Cancellation ==========

#[tokio::test]
async fn test_cancelled_before_start() {
    let store = chain();
    let tables = TableConfig::default();
    let token = CancellationToken::new();
    token.cancel();

    let result = Traversal::new(&store, &tables)
        .with_cancellation(token)
        .run(&TraversalRequest::by_id("r"))
        .await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(store.calls().await.is_empty());
}

/// Store that fires a cancellation token once a given CI's class is read.
struct CancelOnLookup {
    store: InMemoryRecordStore,
    id: &'static str,
    token: CancellationToken,
}

#[async_trait]
impl RecordQuery for CancelOnLookup {
    async fn query(
        &self,
        table: &str,
        filter: &str,
        fields: &[&str],
        limit: usize,
    ) -> ciwalk::Result<Vec<Record>> {
        self.store.query(table, filter, fields, limit).await
    }

    async fn get(&self, table: &str, id: &str, fields: &[&str]) -> ciwalk::Result<Option<Record>> {
        let record = self.store.get(table, id, fields).await;
        if id == self.id {
            self.token.cancel();
        }
        record
    }
}

#[tokio::test]
async fn test_cancelled_mid_walk_stops_expansion() {
    let token = CancellationToken::new();
    let store = CancelOnLookup {
        store: chain(),
        id: "a",
        token: token.clone(),
    };
    let tables = TableConfig::default();

    let result = Traversal::new(&store, &tables)
        .with_cancellation(token)
        .run(&TraversalRequest::by_id("r"))
        .await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(expansions(&store.store).await, vec![expansion_filter("r")]);
}

#[tokio::test]
async fn test_uncancelled_token_runs_to_completion() {
    let store = chain();
    let tables = TableConfig::default();

    let result = Traversal::new(&store, &tables)
        .with_cancellation(CancellationToken::new())
        .run(&TraversalRequest::by_id("r"))
        .await
        .unwrap();
    assert_eq!(result.meta.total, 7);
}

// ========== Properties ==========

fn edge_keys(result: &TraversalResult) -> Vec<(String, Direction, String)> {
    let mut keys: Vec<_> = result
        .relationships
        .iter()
        .map(|e| (e.other_id.clone(), e.direction, e.relation_type.clone()))
        .collect();
    keys.sort();
    keys
}

fn arb_graph() -> impl Strategy<Value = Vec<(u8, u8, u8)>> {
    prop::collection::vec((0u8..6, 0u8..6, 0u8..3), 0..20)
}

proptest! {
    #[test]
    fn prop_upstream_and_downstream_union_is_both(rows in arb_graph()) {
        let kinds = ["Depends on::Used by", "Runs on::Runs", "Hosted on::Hosts"];
        let mut graph = GraphBuilder::new().ci("n0", "cmdb_ci");
        for (parent, child, kind) in &rows {
            graph = graph.rel(
                &format!("n{parent}"),
                &format!("n{child}"),
                kinds[usize::from(*kind)],
            );
        }
        let store = graph.build();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let (up, down, both) = runtime.block_on(async {
            let request = TraversalRequest::by_id("n0").with_depth(1);
            (
                run(&store, request.clone().with_direction(DirectionFilter::Upstream)).await,
                run(&store, request.clone().with_direction(DirectionFilter::Downstream)).await,
                run(&store, request.with_direction(DirectionFilter::Both)).await,
            )
        });

        let mut union = edge_keys(&up);
        union.extend(edge_keys(&down));
        union.sort();
        prop_assert_eq!(union, edge_keys(&both));
    }
}
