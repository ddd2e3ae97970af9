//! Path resolution
//!
//! Walks one path against the current scope and classifies what it lands on.
//! Only the leading segment is looked up here; segments after an association
//! are resolved again against the target entity once its sub-query exists,
//! and segments after a map field stay as a JSON path.

use crate::expr::Operand;
use crate::schema::{Association, FieldLookup, FieldType, SchemaDescriptor};

use super::ast::FieldPath;
use super::context::CompileContext;
use super::errors::{FilterError, FilterResult};

/// What a path is resolved against
#[derive(Debug, Clone)]
pub enum Scope<'r> {
    /// Rows of an entity. `related` is set inside an association sub-query,
    /// where the empty path addresses the related row itself.
    Entity {
        schema: &'r SchemaDescriptor,
        related: bool,
    },
    /// Synthetic rows produced by unnesting an array. Elements are JSON when
    /// the context says so.
    Element { element_type: FieldType },
}

/// Kind of a resolved target, used for translator lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Stored,
    Json,
    Virtual,
    Association,
    Element,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Stored => "stored field",
            TargetKind::Json => "JSON path",
            TargetKind::Virtual => "virtual field",
            TargetKind::Association => "association",
            TargetKind::Element => "array element",
        }
    }
}

/// Where a path lands
#[derive(Debug, Clone)]
pub enum ResolvedTarget<'r> {
    /// Stored column; trailing segments on non-map fields are ignored
    Stored {
        column: Operand,
        field: String,
        field_type: FieldType,
    },
    /// Nested keys inside a map column or JSON element
    Json { base: Operand, path: Vec<String> },
    /// Backing expression of a virtual field
    Virtual {
        expr: Operand,
        field_type: FieldType,
        path: Vec<String>,
    },
    /// Association crossing, rest resolved against the target entity
    Association {
        assoc: &'r Association,
        path: FieldPath,
    },
    /// The unnested element itself
    Element { operand: Operand, json: bool },
}

impl ResolvedTarget<'_> {
    pub fn kind(&self) -> TargetKind {
        match self {
            ResolvedTarget::Stored { .. } => TargetKind::Stored,
            ResolvedTarget::Json { .. } => TargetKind::Json,
            ResolvedTarget::Virtual { .. } => TargetKind::Virtual,
            ResolvedTarget::Association { .. } => TargetKind::Association,
            ResolvedTarget::Element { .. } => TargetKind::Element,
        }
    }
}

/// Resolves `path` in `scope`.
///
/// `ctx.binding()` names the current row; entity scopes fall back to the
/// entity's source name when the context is not anchored yet.
pub fn resolve<'r>(
    scope: &Scope<'r>,
    path: &FieldPath,
    ctx: &CompileContext,
) -> FilterResult<ResolvedTarget<'r>> {
    match scope {
        Scope::Entity { schema, related } => resolve_in_entity(*schema, *related, path, ctx),
        Scope::Element { element_type } => resolve_in_element(element_type, path, ctx),
    }
}

fn resolve_in_entity<'r>(
    schema: &'r SchemaDescriptor,
    related: bool,
    path: &FieldPath,
    ctx: &CompileContext,
) -> FilterResult<ResolvedTarget<'r>> {
    let binding = ctx.binding().unwrap_or(schema.source());

    let Some((head, rest)) = path.split_first() else {
        return match (related, schema.primary_key()) {
            (true, Some(pk)) => Ok(stored(schema, binding, pk)),
            _ => Err(FilterError::empty_path()),
        };
    };

    match schema.lookup(head) {
        FieldLookup::Unknown => Err(FilterError::unknown_field(head, schema.name())),
        FieldLookup::Stored(ty) if ty.is_map() && !rest.is_empty() => Ok(ResolvedTarget::Json {
            base: Operand::column(binding, head),
            path: rest.segments().to_vec(),
        }),
        FieldLookup::Stored(_) => Ok(stored(schema, binding, head)),
        FieldLookup::Virtual(vf) => {
            let resolver = vf
                .resolver()
                .ok_or_else(|| FilterError::unresolved_virtual_field(head, schema.name()))?;
            if vf.field_type().is_array_of_maps() && !rest.is_empty() {
                return Err(FilterError::unsupported(format!(
                    "'{}' holds a list of maps; filter its elements with an explicit `any` on '{}'",
                    head, head
                )));
            }
            let expr = resolver.resolve(head, ctx).bind(binding);
            Ok(ResolvedTarget::Virtual {
                expr,
                field_type: vf.field_type().clone(),
                path: rest.segments().to_vec(),
            })
        }
        FieldLookup::Association(assoc) if !assoc.is_direct() => Err(FilterError::disallowed_field(
            head,
            schema.name(),
            "association needs an intermediate join",
        )),
        FieldLookup::Association(assoc) => Ok(ResolvedTarget::Association { assoc, path: rest }),
    }
}

fn stored<'r>(schema: &SchemaDescriptor, binding: &str, field: &str) -> ResolvedTarget<'r> {
    let field_type = schema
        .field_type(field)
        .cloned()
        .unwrap_or(FieldType::String);
    ResolvedTarget::Stored {
        column: Operand::column(binding, field),
        field: field.to_string(),
        field_type,
    }
}

fn resolve_in_element<'r>(
    element_type: &FieldType,
    path: &FieldPath,
    ctx: &CompileContext,
) -> FilterResult<ResolvedTarget<'r>> {
    let operand = Operand::Element {
        binding: ctx.binding().unwrap_or("value").to_string(),
    };
    let json = ctx.in_json_array();

    match path.split_first() {
        None => Ok(ResolvedTarget::Element { operand, json }),
        Some(_) if json => Ok(ResolvedTarget::Json {
            base: operand,
            path: path.segments().to_vec(),
        }),
        Some((head, _)) => Err(FilterError::unknown_field(
            head,
            &format!("{} element", element_type.type_name()),
        )),
    }
}
