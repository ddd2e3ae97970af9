//! NULL handling of compiled filters
//!
//! Filters are evaluated with SQL three-valued logic against the fixture
//! dataset. Post 11 has NULL status, score and published_at.

mod common;

use aerofilter::expr::{BoolExpr, Operand};
use common::{compile, matching_ids};
use serde_json::json;

fn status() -> Operand {
    Operand::column("posts", "status")
}

// =============================================================================
// Equality
// =============================================================================

#[test]
fn test_eq_null_is_null_check() {
    let expr = compile("post", json!({"op": "eq", "path": "status", "arg": null})).unwrap();
    assert_eq!(expr, BoolExpr::is_null(status()));
    assert_eq!(
        matching_ids("post", json!({"op": "eq", "path": "status", "arg": null})),
        vec![11]
    );
}

#[test]
fn test_eq_value_excludes_null_rows() {
    assert_eq!(
        matching_ids("post", json!({"op": "eq", "path": "status", "arg": "published"})),
        vec![10, 13]
    );
}

#[test]
fn test_not_eq_keeps_null_rows() {
    assert_eq!(
        matching_ids("post", json!({"op": "not_eq", "path": "status", "arg": "published"})),
        vec![11, 12]
    );
    assert_eq!(
        matching_ids("post", json!({"op": "not_eq", "path": "status", "arg": null})),
        vec![10, 12, 13]
    );
}

/// `not` applies no NULL transform: NOT (NULL = v) stays unknown.
#[test]
fn test_negated_eq_differs_from_not_eq() {
    let negated = json!({"op": "not", "arg": {"op": "eq", "path": "status", "arg": "published"}});
    assert_eq!(matching_ids("post", negated), vec![12]);
}

// =============================================================================
// Membership
// =============================================================================

#[test]
fn test_in_with_null_matches_null_rows() {
    assert_eq!(
        matching_ids("post", json!({"op": "in", "path": "status", "arg": ["draft", null]})),
        vec![11, 12]
    );
    assert_eq!(
        matching_ids("post", json!({"op": "in", "path": "status", "arg": ["draft"]})),
        vec![12]
    );
    assert_eq!(
        matching_ids("post", json!({"op": "in", "path": "status", "arg": "draft"})),
        vec![12]
    );
}

#[test]
fn test_in_empty_list_matches_nothing() {
    assert!(matching_ids("post", json!({"op": "in", "path": "status", "arg": []})).is_empty());
    assert_eq!(
        matching_ids("post", json!({"op": "in", "path": "status", "arg": [null]})),
        vec![11]
    );
}

#[test]
fn test_not_in_without_null_keeps_null_rows() {
    assert_eq!(
        matching_ids("post", json!({"op": "not_in", "path": "status", "arg": ["draft"]})),
        vec![10, 11, 13]
    );
}

#[test]
fn test_not_in_with_null_excludes_null_rows() {
    assert_eq!(
        matching_ids("post", json!({"op": "not_in", "path": "status", "arg": ["draft", null]})),
        vec![10, 13]
    );
}

#[test]
fn test_not_in_empty_list_matches_everything() {
    assert_eq!(
        matching_ids("post", json!({"op": "not_in", "path": "status", "arg": []})),
        vec![10, 11, 12, 13]
    );
}

// =============================================================================
// Ordering and patterns
// =============================================================================

#[test]
fn test_ordering_ignores_null_rows() {
    assert_eq!(
        matching_ids("post", json!({"op": "gt", "path": "score", "arg": 1})),
        vec![10, 12, 13]
    );
    assert_eq!(
        matching_ids("post", json!({"op": "le", "path": "score", "arg": 5})),
        vec![10, 12]
    );
    let negated = json!({"op": "not", "arg": {"op": "gt", "path": "score", "arg": 4}});
    assert_eq!(matching_ids("post", negated), vec![12]);
}

#[test]
fn test_pattern_on_nullable_column() {
    assert_eq!(
        matching_ids("post", json!({"op": "like", "path": "status", "arg": "pub"})),
        vec![10, 13]
    );
}

#[test]
fn test_wildcards_in_argument_are_literal() {
    assert_eq!(
        matching_ids("post", json!({"op": "like", "path": "title", "arg": "100%"})),
        vec![10]
    );
    assert_eq!(
        matching_ids("post", json!({"op": "like", "path": "title", "arg": "_"})),
        vec![11]
    );
    assert_eq!(
        matching_ids("post", json!({"op": "ilike", "path": "title", "arg": "RUST"})),
        vec![10]
    );
    assert_eq!(
        matching_ids("post", json!({"op": "starts_with", "path": "title", "arg": "Dr"})),
        vec![12]
    );
    assert_eq!(
        matching_ids("post", json!({"op": "ends_with", "path": "title", "arg": "tricks"})),
        vec![11]
    );
}

#[test]
fn test_timestamp_arguments_are_cast() {
    assert_eq!(
        matching_ids("post", json!({"op": "ge", "path": "published_at", "arg": "2024-01-01"})),
        vec![10, 12]
    );
    assert_eq!(
        matching_ids(
            "post",
            json!({"op": "lt", "path": "published_at", "arg": "2024-01-15 08:30:00"})
        ),
        vec![13]
    );
    assert_eq!(
        matching_ids(
            "post",
            json!({"op": "in", "path": "published_at", "arg": ["2024-01-15T08:30:00Z", null]})
        ),
        vec![11, 12]
    );
}

// =============================================================================
// Junctions and literals
// =============================================================================

#[test]
fn test_empty_junctions_and_literals() {
    assert_eq!(compile("post", json!({"op": "and", "args": []})).unwrap(), BoolExpr::TRUE);
    assert_eq!(compile("post", json!({"op": "or", "args": []})).unwrap(), BoolExpr::FALSE);

    assert_eq!(matching_ids("post", json!({"op": "and", "args": []})), vec![10, 11, 12, 13]);
    assert!(matching_ids("post", json!({"op": "or", "args": []})).is_empty());
    assert!(matching_ids("post", json!({"arg": false})).is_empty());
    assert_eq!(matching_ids("post", json!({"arg": true})).len(), 4);
}

#[test]
fn test_junction_with_unknown_operand() {
    let filter = json!({"op": "or", "args": [
        {"op": "gt", "path": "score", "arg": 100},
        {"op": "eq", "path": "status", "arg": "draft"}
    ]});
    assert_eq!(matching_ids("post", filter), vec![12]);
}
