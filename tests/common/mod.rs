//! Shared fixtures for the integration tests
//!
//! A small multi-tenant blog: users write posts, posts have comments. Two
//! organisations share the tables so tenant propagation is observable.

#![allow(dead_code)]

use aerofilter::eval::{Dataset, Evaluator};
use aerofilter::expr::{BoolExpr, Operand, Query};
use aerofilter::filter::{CompileContext, FilterCompiler, FilterResult, Predicate};
use aerofilter::schema::{
    AssociationDef, AssociationKind, Cardinality, ContextFree, EntityDef, FieldType, ResolverFn,
    SchemaRegistry,
};
use serde_json::{json, Value};

pub fn registry() -> SchemaRegistry {
    SchemaRegistry::builder()
        .entity(
            EntityDef::new("user")
                .source("users")
                .field("id", FieldType::Int)
                .field("org_id", FieldType::Int)
                .field("name", FieldType::String)
                .field("email", FieldType::String)
                .field("uid", FieldType::Uuid)
                .field("profile", FieldType::Map)
                .tenant_key("org_id")
                .virtual_field(
                    "display_name",
                    FieldType::String,
                    ContextFree(|_: &str| Operand::func("lower", vec![Operand::field("name")])),
                )
                .virtual_field(
                    "greeting",
                    FieldType::String,
                    ResolverFn(|_: &str, ctx: &CompileContext| {
                        let prefix = ctx.get("greeting").cloned().unwrap_or(json!("hello "));
                        Operand::func("concat", vec![Operand::param(prefix), Operand::field("name")])
                    }),
                )
                .has_many("posts", "post", "author_id"),
        )
        .entity(
            EntityDef::new("post")
                .source("posts")
                .field("id", FieldType::Int)
                .field("org_id", FieldType::Int)
                .field("author_id", FieldType::Int)
                .field("title", FieldType::String)
                .field("status", FieldType::String)
                .field("score", FieldType::Int)
                .field("tags", FieldType::array_of(FieldType::String))
                .field("meta", FieldType::Map)
                .field("published_at", FieldType::UtcDatetime)
                .tenant_key("org_id")
                .virtual_field(
                    "blocks",
                    FieldType::array_of(FieldType::Map),
                    ContextFree(|_: &str| {
                        Operand::json_path(Operand::field("meta"), vec!["blocks".into()])
                    }),
                )
                .virtual_field(
                    "settings",
                    FieldType::Map,
                    ContextFree(|_: &str| Operand::field("meta")),
                )
                .declared_virtual_field("rank", FieldType::Int)
                .belongs_to("author", "user", "author_id")
                .has_many("comments", "comment", "post_id")
                .association(
                    "readers",
                    AssociationDef {
                        target: "user".into(),
                        cardinality: Cardinality::ToMany,
                        kind: AssociationKind::ManyToMany,
                        owner_key: "id".into(),
                        related_key: "id".into(),
                    },
                )
                .association(
                    "commenters",
                    AssociationDef {
                        target: "user".into(),
                        cardinality: Cardinality::ToMany,
                        kind: AssociationKind::Through,
                        owner_key: "id".into(),
                        related_key: "id".into(),
                    },
                ),
        )
        .entity(
            EntityDef::new("comment")
                .source("comments")
                .field("id", FieldType::Int)
                .field("org_id", FieldType::Int)
                .field("post_id", FieldType::Int)
                .field("author_id", FieldType::Int)
                .field("body", FieldType::String)
                .field("approved", FieldType::Bool)
                .tenant_key("org_id")
                .belongs_to("author", "user", "author_id"),
        )
        .build()
        .unwrap()
}

pub fn dataset() -> Dataset {
    Dataset::from_json(json!({
        "users": [
            {"id": 1, "org_id": 1, "name": "Ann", "email": "ann@example.com",
             "uid": "6f1c1a52-8d5e-4b4e-9a53-2f0f5f8b1c11", "profile": {"lang": "en", "age": 31}},
            {"id": 2, "org_id": 1, "name": "Bob", "email": null,
             "uid": "0b6f4a3e-1d2c-4e5f-8a9b-0c1d2e3f4a5b", "profile": {"lang": "fr"}},
            {"id": 3, "org_id": 2, "name": "Cid", "email": "cid@example.org",
             "uid": "9a8b7c6d-5e4f-4a3b-2c1d-0e9f8a7b6c5d", "profile": null}
        ],
        "posts": [
            {"id": 10, "org_id": 1, "author_id": 1, "title": "Rust 100% safe", "status": "published",
             "score": 5, "tags": ["rust", "safety"], "published_at": "2024-03-01T12:00:00Z",
             "meta": {"lang": "en", "items": [{"kind": "note", "tags": ["a", "b"]}],
                      "blocks": [{"type": "text", "words": 120}, {"type": "image", "words": 0}]}},
            {"id": 11, "org_id": 1, "author_id": 2, "title": "under_score tricks", "status": null,
             "score": null, "tags": [], "published_at": null,
             "meta": {"lang": "fr", "items": [{"kind": "todo", "tags": []}], "blocks": []}},
            {"id": 12, "org_id": 1, "author_id": 1, "title": "Drafting", "status": "draft",
             "score": 2, "tags": ["draft"], "published_at": "2024-01-15T08:30:00Z",
             "meta": null},
            {"id": 13, "org_id": 2, "author_id": 3, "title": "Other org", "status": "published",
             "score": 9, "tags": ["rust"], "published_at": "2023-12-31T23:59:59Z",
             "meta": {"lang": "en", "items": [], "blocks": [{"type": "text", "words": 5}]}}
        ],
        "comments": [
            {"id": 100, "org_id": 1, "post_id": 10, "author_id": 2, "body": "great", "approved": true},
            {"id": 101, "org_id": 1, "post_id": 10, "author_id": 1, "body": "thanks", "approved": false},
            {"id": 102, "org_id": 2, "post_id": 11, "author_id": 3, "body": "cross-tenant", "approved": true},
            {"id": 103, "org_id": 1, "post_id": 12, "author_id": 2, "body": "spam", "approved": null}
        ]
    }))
    .unwrap()
}

pub fn predicate(value: Value) -> Predicate {
    Predicate::from_json(&value).unwrap()
}

pub fn query_for(registry: &SchemaRegistry, entity: &str) -> Query {
    Query::from_schema(registry.entity(entity).unwrap())
}

/// Compiles `filter` against `entity` and returns the bare expression
pub fn compile(entity: &str, filter: Value) -> FilterResult<BoolExpr> {
    compile_with(entity, filter, &CompileContext::new())
}

pub fn compile_with(entity: &str, filter: Value, ctx: &CompileContext) -> FilterResult<BoolExpr> {
    let registry = registry();
    let compiler = FilterCompiler::new(&registry);
    compiler.compile_expression(&query_for(&registry, entity), &predicate(filter), ctx)
}

/// Ids of the rows of `entity` matching `filter`
pub fn matching_ids(entity: &str, filter: Value) -> Vec<i64> {
    matching_ids_with(entity, filter, &CompileContext::new())
}

pub fn matching_ids_with(entity: &str, filter: Value, ctx: &CompileContext) -> Vec<i64> {
    let registry = registry();
    let compiler = FilterCompiler::new(&registry);
    let query = compiler
        .build_query(query_for(&registry, entity), &predicate(filter), ctx)
        .unwrap();

    let data = dataset();
    Evaluator::new(&data)
        .select(&query)
        .unwrap()
        .iter()
        .map(|row| row["id"].as_i64().unwrap())
        .collect()
}
