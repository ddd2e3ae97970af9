//! Quantifiers over arrays and JSON, and JSON containment

mod common;

use aerofilter::expr::render;
use aerofilter::filter::FilterErrorCode;
use common::{compile, matching_ids};
use serde_json::json;

// =============================================================================
// Scalar arrays
// =============================================================================

#[test]
fn test_any_over_scalar_array() {
    let filter = json!({"op": "any", "path": "tags", "arg": {"op": "eq", "path": "", "arg": "rust"}});
    let sql = render(&compile("post", filter.clone()).unwrap());

    assert_eq!(
        sql.sql,
        "EXISTS (SELECT 1 FROM unnest(\"posts\".\"tags\") AS \"s1\"(\"value\") WHERE \"s1\".\"value\" = $1)"
    );
    assert_eq!(sql.params, vec![json!("rust")]);
    assert_eq!(matching_ids("post", filter), vec![10, 13]);
}

#[test]
fn test_element_operators() {
    assert_eq!(
        matching_ids(
            "post",
            json!({"op": "any", "path": "tags", "arg": {"op": "starts_with", "path": "", "arg": "saf"}})
        ),
        vec![10]
    );
    assert_eq!(
        matching_ids(
            "post",
            json!({"op": "any", "path": "tags", "arg": {"op": "not_eq", "path": "", "arg": "rust"}})
        ),
        vec![10, 12]
    );
}

#[test]
fn test_negated_any_includes_empty_arrays() {
    let filter = json!({"op": "not", "arg":
        {"op": "any", "path": "tags", "arg": {"op": "eq", "path": "", "arg": "rust"}}});
    assert_eq!(matching_ids("post", filter), vec![11, 12]);
}

#[test]
fn test_scalar_element_has_no_fields() {
    let err = compile(
        "post",
        json!({"op": "any", "path": "tags", "arg": {"op": "eq", "path": "len", "arg": 1}}),
    )
    .unwrap_err();
    assert_eq!(err.code(), FilterErrorCode::UnknownField);
}

// =============================================================================
// JSON arrays
// =============================================================================

#[test]
fn test_any_over_json_array() {
    let filter = json!({"op": "any", "path": "meta.items",
                        "arg": {"op": "eq", "path": "kind", "arg": "note"}});
    let sql = render(&compile("post", filter.clone()).unwrap());

    assert_eq!(
        sql.sql,
        "EXISTS (SELECT 1 FROM jsonb_array_elements((\"posts\".\"meta\" #> $1)) AS \"s1\"(\"value\") \
         WHERE (\"s1\".\"value\" #> $2) = $3::jsonb)"
    );
    assert_eq!(sql.params, vec![json!(["items"]), json!(["kind"]), json!("note")]);
    assert_eq!(matching_ids("post", filter), vec![10]);
}

#[test]
fn test_nested_json_array_quantifiers() {
    let filter = json!({"op": "any", "path": "meta.items",
                        "arg": {"op": "any", "path": "tags",
                                "arg": {"op": "eq", "path": "", "arg": "b"}}});
    let sql = render(&compile("post", filter.clone()).unwrap()).sql;

    assert!(sql.contains("AS \"s1\"(\"value\")"), "{}", sql);
    assert!(sql.contains("jsonb_array_elements((\"s1\".\"value\" #> $2)) AS \"s2\""), "{}", sql);
    assert_eq!(matching_ids("post", filter), vec![10]);
}

#[test]
fn test_any_over_virtual_array_of_maps() {
    assert_eq!(
        matching_ids(
            "post",
            json!({"op": "any", "path": "blocks", "arg": {"op": "gt", "path": "words", "arg": 100}})
        ),
        vec![10]
    );
    assert_eq!(
        matching_ids(
            "post",
            json!({"op": "any", "path": "blocks", "arg": {"op": "eq", "path": "type", "arg": "text"}})
        ),
        vec![10, 13]
    );
}

// =============================================================================
// Containment
// =============================================================================

#[test]
fn test_contains_on_json_uses_containment() {
    assert_eq!(
        matching_ids("post", json!({"op": "contains", "path": "meta", "arg": {"lang": "en"}})),
        vec![10, 13]
    );
    assert_eq!(
        matching_ids(
            "post",
            json!({"op": "contains", "path": "meta.items", "arg": [{"kind": "todo"}]})
        ),
        vec![11]
    );
    assert_eq!(
        matching_ids("user", json!({"op": "contains", "path": "profile", "arg": {"lang": "fr"}})),
        vec![2]
    );
}

#[test]
fn test_contains_on_text_falls_back_to_like() {
    assert_eq!(
        compile("post", json!({"op": "contains", "path": "title", "arg": "safe"})).unwrap(),
        compile("post", json!({"op": "like", "path": "title", "arg": "safe"})).unwrap()
    );
    assert_eq!(
        matching_ids("post", json!({"op": "contains", "path": "title", "arg": "safe"})),
        vec![10]
    );
}
