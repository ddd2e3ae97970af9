//! Base query handed to the compiler
//!
//! Stands in for the caller's query builder: a root entity, an optional named
//! anchor for correlated sub-queries, and the filters attached so far.

use crate::schema::{EntityId, SchemaDescriptor};

use super::ast::BoolExpr;
use super::sql::{SqlFragment, SqlWriter};

/// A query over one entity's source table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    entity: EntityId,
    source: String,
    binding: Option<String>,
    filters: Vec<BoolExpr>,
}

impl Query {
    /// Start an unfiltered, unanchored query over `schema`
    pub fn from_schema(schema: &SchemaDescriptor) -> Self {
        Self {
            entity: schema.id(),
            source: schema.source().to_string(),
            binding: None,
            filters: Vec::new(),
        }
    }

    /// Sets the named anchor of the root row
    pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }

    /// Attaches a filter; multiple filters are conjoined
    pub fn with_filter(mut self, filter: BoolExpr) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn binding(&self) -> Option<&str> {
        self.binding.as_deref()
    }

    /// Anchor name used for the root row, falling back to the source name
    pub fn root_binding(&self) -> &str {
        self.binding.as_deref().unwrap_or(&self.source)
    }

    pub fn filters(&self) -> &[BoolExpr] {
        &self.filters
    }

    /// The conjunction of every attached filter
    pub fn where_expr(&self) -> BoolExpr {
        BoolExpr::all(self.filters.clone())
    }

    /// `SELECT anchor.* FROM source AS anchor WHERE ...`
    pub fn to_sql(&self) -> SqlFragment {
        let binding = self.root_binding();
        let mut writer = SqlWriter::new();
        writer.push_str("SELECT ");
        writer.push_ident(binding);
        writer.push_str(".* FROM ");
        writer.push_ident(&self.source);
        writer.push_str(" AS ");
        writer.push_ident(binding);
        if !self.filters.is_empty() {
            writer.push_str(" WHERE ");
            writer.write_expr(&self.where_expr());
        }
        writer.finish()
    }
}
