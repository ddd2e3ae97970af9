//! Boolean filter expression tree
//!
//! The backend-facing form of a compiled predicate. Expressions are plain
//! values: they own their operands, compare structurally and carry no
//! references back into the schema that produced them.

use serde::Serialize;
use serde_json::Value;

/// Binary comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    /// SQL spelling of the operator
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

/// A scalar-valued term inside a boolean expression
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operand {
    /// Column on a named binding: `binding.column`
    Column { binding: String, column: String },

    /// Column on whatever row is current when the operand is bound.
    ///
    /// Produced by context-free virtual field resolvers; the compiler replaces
    /// it with a [`Operand::Column`] before the expression leaves its scope.
    Field { column: String },

    /// JSON path extraction: `base #> path` or `base #>> path`
    JsonPath {
        base: Box<Operand>,
        path: Vec<String>,
        as_text: bool,
    },

    /// The value row produced by `unnest`/`jsonb_array_elements`
    Element { binding: String },

    /// Bound parameter
    Param { value: Value },

    /// Bound parameter compared as jsonb
    JsonParam { value: Value },

    /// Explicit type annotation: `CAST(operand AS sql_type)`
    Cast {
        operand: Box<Operand>,
        sql_type: String,
    },

    /// Function call: `name(args..)`
    Func { name: String, args: Vec<Operand> },

    /// Raw SQL with `?` placeholders filled from `args` in order
    Fragment { sql: String, args: Vec<Operand> },
}

impl Operand {
    pub fn column(binding: impl Into<String>, column: impl Into<String>) -> Self {
        Operand::Column {
            binding: binding.into(),
            column: column.into(),
        }
    }

    /// Unbound column reference, see [`Operand::Field`]
    pub fn field(column: impl Into<String>) -> Self {
        Operand::Field {
            column: column.into(),
        }
    }

    pub fn param(value: Value) -> Self {
        Operand::Param { value }
    }

    pub fn json_param(value: Value) -> Self {
        Operand::JsonParam { value }
    }

    pub fn func(name: impl Into<String>, args: Vec<Operand>) -> Self {
        Operand::Func {
            name: name.into(),
            args,
        }
    }

    pub fn cast(operand: Operand, sql_type: impl Into<String>) -> Self {
        Operand::Cast {
            operand: Box::new(operand),
            sql_type: sql_type.into(),
        }
    }

    /// JSON extraction keeping the jsonb type
    pub fn json_path(base: Operand, path: Vec<String>) -> Self {
        Operand::JsonPath {
            base: Box::new(base),
            path,
            as_text: false,
        }
    }

    /// Text form of a JSON-valued operand, used by pattern matching.
    pub fn into_json_text(self) -> Self {
        match self {
            Operand::JsonPath { base, path, .. } => Operand::JsonPath {
                base,
                path,
                as_text: true,
            },
            other => Operand::JsonPath {
                base: Box::new(other),
                path: Vec::new(),
                as_text: true,
            },
        }
    }

    /// Replaces every unbound [`Operand::Field`] with a column on `binding`.
    pub fn bind(self, binding: &str) -> Self {
        match self {
            Operand::Field { column } => Operand::column(binding, column),
            Operand::JsonPath {
                base,
                path,
                as_text,
            } => Operand::JsonPath {
                base: Box::new(base.bind(binding)),
                path,
                as_text,
            },
            Operand::Cast { operand, sql_type } => Operand::Cast {
                operand: Box::new(operand.bind(binding)),
                sql_type,
            },
            Operand::Func { name, args } => Operand::Func {
                name,
                args: args.into_iter().map(|a| a.bind(binding)).collect(),
            },
            Operand::Fragment { sql, args } => Operand::Fragment {
                sql,
                args: args.into_iter().map(|a| a.bind(binding)).collect(),
            },
            other => other,
        }
    }
}

/// Row source of an EXISTS sub-query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    /// Rows of another entity's table
    Table { name: String },
    /// `unnest(array)`, one row per array element
    Unnest { operand: Operand },
    /// `jsonb_array_elements(json)`, one row per JSON array element
    JsonArrayElements { operand: Operand },
}

/// Correlated sub-query used by [`BoolExpr::Exists`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubQuery {
    pub source: Source,
    pub binding: String,
    pub filter: BoolExpr,
}

/// Composable boolean filter fragment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoolExpr {
    Const { value: bool },
    And { args: Vec<BoolExpr> },
    Or { args: Vec<BoolExpr> },
    Not { arg: Box<BoolExpr> },
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    IsNull { operand: Operand, negated: bool },
    InList {
        operand: Operand,
        values: Vec<Operand>,
        negated: bool,
    },
    Like {
        operand: Operand,
        pattern: String,
        case_insensitive: bool,
    },
    JsonContains { operand: Operand, value: Value },
    Exists { query: Box<SubQuery> },
}

impl BoolExpr {
    pub const TRUE: BoolExpr = BoolExpr::Const { value: true };
    pub const FALSE: BoolExpr = BoolExpr::Const { value: false };

    pub fn constant(value: bool) -> Self {
        BoolExpr::Const { value }
    }

    /// Conjunction; empty is TRUE, a single term is returned as is.
    pub fn all(mut args: Vec<BoolExpr>) -> Self {
        match args.len() {
            0 => BoolExpr::TRUE,
            1 => args.remove(0),
            _ => BoolExpr::And { args },
        }
    }

    /// Disjunction; empty is FALSE, a single term is returned as is.
    pub fn any(mut args: Vec<BoolExpr>) -> Self {
        match args.len() {
            0 => BoolExpr::FALSE,
            1 => args.remove(0),
            _ => BoolExpr::Or { args },
        }
    }

    pub fn negate(arg: BoolExpr) -> Self {
        BoolExpr::Not { arg: Box::new(arg) }
    }

    pub fn compare(left: Operand, op: CompareOp, right: Operand) -> Self {
        BoolExpr::Compare { left, op, right }
    }

    pub fn is_null(operand: Operand) -> Self {
        BoolExpr::IsNull {
            operand,
            negated: false,
        }
    }

    pub fn is_not_null(operand: Operand) -> Self {
        BoolExpr::IsNull {
            operand,
            negated: true,
        }
    }

    pub fn exists(source: Source, binding: impl Into<String>, filter: BoolExpr) -> Self {
        BoolExpr::Exists {
            query: Box::new(SubQuery {
                source,
                binding: binding.into(),
                filter,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_junctions() {
        assert_eq!(BoolExpr::all(vec![]), BoolExpr::TRUE);
        assert_eq!(BoolExpr::any(vec![]), BoolExpr::FALSE);
    }

    #[test]
    fn test_singleton_junction_unwraps() {
        let term = BoolExpr::is_null(Operand::column("p", "title"));
        assert_eq!(BoolExpr::all(vec![term.clone()]), term);
        assert_eq!(BoolExpr::any(vec![term.clone()]), term);
    }

    #[test]
    fn test_bind_replaces_nested_fields() {
        let op = Operand::func(
            "concat",
            vec![Operand::field("first"), Operand::param(json!(" ")), Operand::field("last")],
        );

        let bound = op.bind("u");
        assert_eq!(
            bound,
            Operand::func(
                "concat",
                vec![
                    Operand::column("u", "first"),
                    Operand::param(json!(" ")),
                    Operand::column("u", "last"),
                ],
            )
        );
    }

    #[test]
    fn test_json_text_keeps_path() {
        let op = Operand::json_path(Operand::column("p", "meta"), vec!["a".into()]);
        match op.into_json_text() {
            Operand::JsonPath { path, as_text, .. } => {
                assert_eq!(path, vec!["a".to_string()]);
                assert!(as_text);
            }
            other => panic!("unexpected operand {:?}", other),
        }
    }
}
