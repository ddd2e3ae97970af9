//! Predicate compiler
//!
//! Walks a predicate tree once, resolving each path in its scope and handing
//! the resolved target to the operator translators. Quantifiers and
//! comparators that cross an association open a correlated EXISTS sub-query
//! whose binding is derived from the nesting depth, so compiling the same
//! predicate twice yields structurally equal expressions.

use serde_json::Value;

use crate::expr::{BoolExpr, CompareOp, Operand, Query, Source};
use crate::observability::{Event, Logger};
use crate::schema::{Association, FieldType, SchemaDescriptor, SchemaRegistry};

use super::ast::{ComparatorOp, FieldPath, JunctionOp, Predicate};
use super::config::CompilerConfig;
use super::context::CompileContext;
use super::errors::{FilterError, FilterResult};
use super::operators::{self, Target};
use super::path::{self, ResolvedTarget, Scope, TargetKind};

/// Compiles predicates against one schema registry
#[derive(Debug, Clone)]
pub struct FilterCompiler<'r> {
    registry: &'r SchemaRegistry,
    config: CompilerConfig,
}

impl<'r> FilterCompiler<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self::with_config(registry, CompilerConfig::default())
    }

    pub fn with_config(registry: &'r SchemaRegistry, config: CompilerConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles `predicate` and attaches it to `query`.
    ///
    /// An unanchored query is anchored on its source name. A query already
    /// anchored under another name is rejected, since sub-queries correlate
    /// against the source name.
    pub fn build_query(
        &self,
        query: Query,
        predicate: &Predicate,
        ctx: &CompileContext,
    ) -> FilterResult<Query> {
        let schema = self.schema_for(&query)?;

        let query = match query.binding() {
            None => query.with_binding(schema.source()),
            Some(existing) if existing == schema.source() => query,
            Some(existing) => {
                return Err(FilterError::ambiguous_binding(existing, schema.source()))
            }
        };

        let expr = self.compile_expression(&query, predicate, ctx)?;

        Logger::trace(
            Event::QueryBound.as_str(),
            &[
                ("entity", schema.name()),
                ("binding", query.root_binding()),
                ("filters", &(query.filters().len() + 1).to_string()),
            ],
        );

        Ok(query.with_filter(expr))
    }

    /// Compiles `predicate` against the root row of `query` without
    /// attaching it.
    pub fn compile_expression(
        &self,
        query: &Query,
        predicate: &Predicate,
        ctx: &CompileContext,
    ) -> FilterResult<BoolExpr> {
        let schema = self.schema_for(query)?;
        let ctx = ctx.rooted(query.root_binding());
        let scope = Scope::Entity {
            schema,
            related: false,
        };

        match self.compile(predicate, &scope, &ctx) {
            Ok(expr) => {
                Logger::trace(
                    Event::FilterCompiled.as_str(),
                    &[("entity", schema.name()), ("binding", query.root_binding())],
                );
                Ok(expr)
            }
            Err(err) => {
                Logger::info(
                    Event::FilterRejected.as_str(),
                    &[("entity", schema.name()), ("code", err.code().code())],
                );
                Err(err)
            }
        }
    }

    fn schema_for(&self, query: &Query) -> FilterResult<&'r SchemaDescriptor> {
        self.registry
            .get(query.entity())
            .filter(|schema| schema.source() == query.source())
            .ok_or_else(|| FilterError::unknown_entity(query.source()))
    }

    fn compile(
        &self,
        predicate: &Predicate,
        scope: &Scope<'r>,
        ctx: &CompileContext,
    ) -> FilterResult<BoolExpr> {
        match predicate {
            Predicate::Literal { value } => Ok(BoolExpr::constant(*value)),
            Predicate::Junction { op, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.compile(arg, scope, ctx))
                    .collect::<FilterResult<Vec<_>>>()?;
                Ok(match op {
                    JunctionOp::And => BoolExpr::all(args),
                    JunctionOp::Or => BoolExpr::any(args),
                })
            }
            Predicate::Negation { arg } => Ok(BoolExpr::negate(self.compile(arg, scope, ctx)?)),
            Predicate::Quantifier { path, arg } => self
                .compile_quantifier(path, arg, scope, ctx)
                .map_err(|e| e.with_fragment(predicate)),
            Predicate::Comparator { op, path, arg } => {
                self.compile_comparator(predicate, *op, path, arg, scope, ctx)
            }
        }
    }

    fn compile_comparator(
        &self,
        predicate: &Predicate,
        op: ComparatorOp,
        path: &FieldPath,
        arg: &Value,
        scope: &Scope<'r>,
        ctx: &CompileContext,
    ) -> FilterResult<BoolExpr> {
        let target = path::resolve(scope, path, ctx).map_err(|e| e.with_fragment(predicate))?;

        if let ResolvedTarget::Association { assoc, path: rest } = target {
            let rewritten = Predicate::any(
                FieldPath::from_segments([assoc.name()]),
                Predicate::comparator(op, rest, arg.clone()),
            );
            return self
                .compile(&rewritten, scope, ctx)
                .map_err(|e| e.replace_fragment(predicate));
        }

        let kind = target.kind();
        let translate = operators::translator(op, kind)
            .ok_or_else(|| FilterError::unsupported_operator(op.as_str(), kind))
            .map_err(|e| e.with_fragment(predicate))?;
        let target = Target::from_resolved(target)
            .ok_or_else(|| FilterError::unsupported_operator(op.as_str(), kind))
            .map_err(|e| e.with_fragment(predicate))?;

        translate(&target, arg, &self.config).map_err(|e| e.with_fragment(predicate))
    }

    /// `any` over an association, an array, or a JSON value.
    ///
    /// Map-typed fields and JSON paths are expanded with
    /// `jsonb_array_elements`; the column's type says nothing about the shape
    /// of the stored value, so a JSON object there fails when the query runs,
    /// not here.
    fn compile_quantifier(
        &self,
        path: &FieldPath,
        arg: &Predicate,
        scope: &Scope<'r>,
        ctx: &CompileContext,
    ) -> FilterResult<BoolExpr> {
        let target = path::resolve(scope, path, ctx)?;
        let kind = target.kind();

        match target {
            ResolvedTarget::Association { assoc, path: rest } => {
                self.association_exists(assoc, &rest, arg, ctx)
            }
            ResolvedTarget::Stored {
                column, field_type, ..
            } => match field_type.element_type() {
                Some(element) => self.element_exists(
                    Source::Unnest { operand: column },
                    element.clone(),
                    arg,
                    ctx,
                ),
                None if field_type.is_map() => self.json_elements_exists(column, arg, ctx),
                None => Err(FilterError::unsupported_operator("any", kind)),
            },
            ResolvedTarget::Json { base, path } => {
                self.json_elements_exists(Operand::json_path(base, path), arg, ctx)
            }
            ResolvedTarget::Virtual {
                expr,
                field_type,
                path,
            } => match field_type {
                FieldType::Array { element_type } if element_type.is_map() => {
                    self.json_elements_exists(expr, arg, ctx)
                }
                FieldType::Map if path.is_empty() => self.json_elements_exists(expr, arg, ctx),
                FieldType::Map => {
                    self.json_elements_exists(Operand::json_path(expr, path), arg, ctx)
                }
                _ => Err(FilterError::unsupported_operator("any", kind)),
            },
            ResolvedTarget::Element { operand, json: true } => {
                self.json_elements_exists(operand, arg, ctx)
            }
            ResolvedTarget::Element { json: false, .. } => {
                Err(FilterError::unsupported_operator("any", kind))
            }
        }
    }

    /// EXISTS over the target entity, correlated by the association keys
    fn association_exists(
        &self,
        assoc: &'r Association,
        rest: &FieldPath,
        arg: &Predicate,
        ctx: &CompileContext,
    ) -> FilterResult<BoolExpr> {
        let target = self
            .registry
            .get(assoc.target())
            .ok_or_else(|| FilterError::unknown_entity(assoc.name()))?;
        let parent = ctx.binding().unwrap_or_default().to_string();
        let binding = ctx.next_binding();
        let sub_ctx = ctx.scoped(&binding, false);
        let scope = Scope::Entity {
            schema: target,
            related: true,
        };

        let inner = if rest.is_empty() {
            self.compile(arg, &scope, &sub_ctx)?
        } else {
            let nested = Predicate::any(rest.clone(), arg.clone());
            self.compile(&nested, &scope, &sub_ctx)?
        };

        let mut terms = vec![BoolExpr::compare(
            Operand::column(&binding, assoc.related_key()),
            CompareOp::Eq,
            Operand::column(parent, assoc.owner_key()),
        )];
        if let Some(tenant_key) = target.tenant_key() {
            if let Some(tenant) = ctx
                .get(&self.config.tenant_context_key)
                .filter(|v| !v.is_null())
            {
                terms.push(BoolExpr::compare(
                    Operand::column(&binding, tenant_key),
                    CompareOp::Eq,
                    Operand::param(tenant.clone()),
                ));
            }
        }
        terms.push(inner);

        Ok(BoolExpr::exists(
            Source::Table {
                name: target.source().to_string(),
            },
            binding,
            BoolExpr::all(terms),
        ))
    }

    fn json_elements_exists(
        &self,
        array: Operand,
        arg: &Predicate,
        ctx: &CompileContext,
    ) -> FilterResult<BoolExpr> {
        self.element_exists(
            Source::JsonArrayElements { operand: array },
            FieldType::Map,
            arg,
            ctx,
        )
    }

    /// EXISTS over the elements of an array; map elements are addressed as JSON
    fn element_exists(
        &self,
        source: Source,
        element_type: FieldType,
        arg: &Predicate,
        ctx: &CompileContext,
    ) -> FilterResult<BoolExpr> {
        let binding = ctx.next_binding();
        let sub_ctx = ctx.scoped(&binding, element_type.is_map());
        let scope = Scope::Element { element_type };

        let inner = self.compile(arg, &scope, &sub_ctx)?;
        Ok(BoolExpr::exists(source, binding, inner))
    }
}
