//! Three-valued evaluation of filter expressions
//!
//! Runs a [`Query`] against a [`Dataset`] the way PostgreSQL would: a row is
//! returned only when its filter is TRUE, and UNKNOWN propagates through AND,
//! OR and NOT by Kleene's rules. EXISTS is never UNKNOWN.

use serde_json::Value;

use crate::expr::{BoolExpr, CompareOp, Operand, Query, Source};

use super::dataset::Dataset;
use super::datum::{self, Datum};
use super::errors::{EvalError, EvalResult};

/// SQL truth value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    pub fn from_option(value: Option<bool>) -> Self {
        match value {
            Some(true) => Truth::True,
            Some(false) => Truth::False,
            None => Truth::Unknown,
        }
    }

    pub fn and(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::False, _) | (_, Truth::False) => Truth::False,
            (Truth::True, Truth::True) => Truth::True,
            _ => Truth::Unknown,
        }
    }

    pub fn or(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::True, _) | (_, Truth::True) => Truth::True,
            (Truth::False, Truth::False) => Truth::False,
            _ => Truth::Unknown,
        }
    }

    pub fn not(self) -> Truth {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        }
    }

    pub fn is_true(self) -> bool {
        self == Truth::True
    }
}

/// Row bound to a name while evaluating
#[derive(Debug, Clone)]
enum Bound<'d> {
    Row(&'d Value),
    Element(Datum),
}

type Env<'d> = Vec<(String, Bound<'d>)>;

/// Evaluates queries against one dataset
pub struct Evaluator<'d> {
    dataset: &'d Dataset,
}

impl<'d> Evaluator<'d> {
    pub fn new(dataset: &'d Dataset) -> Self {
        Self { dataset }
    }

    /// Rows of the query's source whose filters are TRUE, in table order
    pub fn select(&self, query: &Query) -> EvalResult<Vec<Value>> {
        let filter = query.where_expr();
        let mut matches = Vec::new();
        for row in self.dataset.table(query.source())? {
            let mut env = vec![(query.root_binding().to_string(), Bound::Row(row))];
            if self.eval(&filter, &mut env)?.is_true() {
                matches.push(row.clone());
            }
        }
        Ok(matches)
    }

    /// Truth value of `expr` with `row` bound as `binding`
    pub fn eval_row(&self, expr: &BoolExpr, binding: &str, row: &'d Value) -> EvalResult<Truth> {
        let mut env = vec![(binding.to_string(), Bound::Row(row))];
        self.eval(expr, &mut env)
    }

    fn eval(&self, expr: &BoolExpr, env: &mut Env<'d>) -> EvalResult<Truth> {
        match expr {
            BoolExpr::Const { value } => Ok(Truth::from_option(Some(*value))),
            BoolExpr::And { args } => {
                let mut acc = Truth::True;
                for arg in args {
                    acc = acc.and(self.eval(arg, env)?);
                }
                Ok(acc)
            }
            BoolExpr::Or { args } => {
                let mut acc = Truth::False;
                for arg in args {
                    acc = acc.or(self.eval(arg, env)?);
                }
                Ok(acc)
            }
            BoolExpr::Not { arg } => Ok(self.eval(arg, env)?.not()),
            BoolExpr::Compare { left, op, right } => {
                let left = self.operand(left, env)?;
                let right = self.operand(right, env)?;
                let result = match op {
                    CompareOp::Eq => datum::equals(&left, &right)?,
                    CompareOp::NotEq => datum::equals(&left, &right)?.map(|eq| !eq),
                    ordering => datum::compare(&left, &right)?.map(|ord| match ordering {
                        CompareOp::Gt => ord.is_gt(),
                        CompareOp::Ge => ord.is_ge(),
                        CompareOp::Lt => ord.is_lt(),
                        _ => ord.is_le(),
                    }),
                };
                Ok(Truth::from_option(result))
            }
            BoolExpr::IsNull { operand, negated } => {
                let is_null = self.operand(operand, env)?.is_null();
                Ok(Truth::from_option(Some(is_null != *negated)))
            }
            BoolExpr::InList {
                operand,
                values,
                negated,
            } => {
                let needle = self.operand(operand, env)?;
                let mut found = Truth::False;
                for value in values {
                    let value = self.operand(value, env)?;
                    found = found.or(Truth::from_option(datum::equals(&needle, &value)?));
                }
                Ok(if *negated { found.not() } else { found })
            }
            BoolExpr::Like {
                operand,
                pattern,
                case_insensitive,
            } => match self.operand(operand, env)? {
                Datum::Null => Ok(Truth::Unknown),
                Datum::Text(text) => Ok(Truth::from_option(Some(datum::like_matches(
                    &text,
                    pattern,
                    *case_insensitive,
                )?))),
                other => Err(EvalError::TypeMismatch(format!(
                    "LIKE needs text, got {:?}",
                    other
                ))),
            },
            BoolExpr::JsonContains { operand, value } => match self.operand(operand, env)? {
                Datum::Null => Ok(Truth::Unknown),
                Datum::Json(doc) => Ok(Truth::from_option(Some(datum::json_contains(&doc, value)))),
                other => Err(EvalError::TypeMismatch(format!(
                    "@> needs jsonb, got {:?}",
                    other
                ))),
            },
            BoolExpr::Exists { query } => {
                for bound in self.rows(&query.source, env)? {
                    env.push((query.binding.clone(), bound));
                    let result = self.eval(&query.filter, env);
                    env.pop();
                    if result?.is_true() {
                        return Ok(Truth::True);
                    }
                }
                Ok(Truth::False)
            }
        }
    }

    /// Rows produced by a sub-query source
    fn rows(&self, source: &Source, env: &Env<'d>) -> EvalResult<Vec<Bound<'d>>> {
        match source {
            Source::Table { name } => Ok(self.dataset.table(name)?.iter().map(Bound::Row).collect()),
            Source::Unnest { operand } => match self.operand(operand, env)? {
                Datum::Null => Ok(Vec::new()),
                Datum::Json(Value::Array(items)) => {
                    Ok(items.iter().map(|v| Bound::Element(Datum::from_value(v))).collect())
                }
                other => Err(EvalError::TypeMismatch(format!(
                    "unnest needs an array, got {:?}",
                    other
                ))),
            },
            Source::JsonArrayElements { operand } => match self.operand(operand, env)? {
                Datum::Null => Ok(Vec::new()),
                Datum::Json(Value::Array(items)) => {
                    Ok(items.iter().map(|v| Bound::Element(Datum::json(v))).collect())
                }
                other => Err(EvalError::TypeMismatch(format!(
                    "jsonb_array_elements needs a JSON array, got {:?}",
                    other
                ))),
            },
        }
    }

    fn lookup<'e>(&self, binding: &str, env: &'e Env<'d>) -> EvalResult<&'e Bound<'d>> {
        env.iter()
            .rev()
            .find(|(name, _)| name == binding)
            .map(|(_, bound)| bound)
            .ok_or_else(|| EvalError::UnknownBinding(binding.to_string()))
    }

    fn operand(&self, operand: &Operand, env: &Env<'d>) -> EvalResult<Datum> {
        match operand {
            Operand::Column { binding, column } => match self.lookup(binding, env)? {
                Bound::Row(row) => Ok(row.get(column).map(Datum::from_value).unwrap_or(Datum::Null)),
                Bound::Element(_) => Err(EvalError::TypeMismatch(format!(
                    "'{}' is an array element, not a row",
                    binding
                ))),
            },
            Operand::Field { column } => Err(EvalError::UnknownBinding(format!(
                "unbound field '{}'",
                column
            ))),
            Operand::Element { binding } => match self.lookup(binding, env)? {
                Bound::Element(datum) => Ok(datum.clone()),
                Bound::Row(row) => Ok(Datum::json(row)),
            },
            Operand::JsonPath {
                base,
                path,
                as_text,
            } => {
                let base = match self.operand(base, env)? {
                    Datum::Null => return Ok(Datum::Null),
                    Datum::Json(v) => v,
                    Datum::Text(s) => serde_json::from_str(&s)?,
                    other => {
                        return Err(EvalError::TypeMismatch(format!(
                            "JSON path on {:?}",
                            other
                        )))
                    }
                };
                let found = json_walk(&base, path);
                let datum = found.map(Datum::json).unwrap_or(Datum::Null);
                Ok(if *as_text {
                    datum.to_text().map(Datum::Text).unwrap_or(Datum::Null)
                } else {
                    datum
                })
            }
            Operand::Param { value } => Ok(Datum::from_value(value)),
            Operand::JsonParam { value } => Ok(Datum::json(value)),
            Operand::Cast { operand, sql_type } => self.operand(operand, env)?.cast(sql_type),
            Operand::Func { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.operand(arg, env))
                    .collect::<EvalResult<Vec<_>>>()?;
                call(name, args)
            }
            Operand::Fragment { sql, .. } => Err(EvalError::Unsupported(format!(
                "raw SQL fragment '{}'",
                sql
            ))),
        }
    }
}

/// `#>` navigation; integer segments index arrays
fn json_walk<'v>(value: &'v Value, path: &[String]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn call(name: &str, args: Vec<Datum>) -> EvalResult<Datum> {
    match name.to_ascii_lowercase().as_str() {
        "lower" | "upper" => {
            let upper = name.eq_ignore_ascii_case("upper");
            Ok(match args.into_iter().next() {
                Some(Datum::Null) | None => Datum::Null,
                Some(datum) => {
                    let text = datum.to_text().unwrap_or_default();
                    Datum::Text(if upper {
                        text.to_uppercase()
                    } else {
                        text.to_lowercase()
                    })
                }
            })
        }
        "concat" => Ok(Datum::Text(
            args.iter().filter_map(Datum::to_text).collect::<String>(),
        )),
        "coalesce" => Ok(args
            .into_iter()
            .find(|d| !d.is_null())
            .unwrap_or(Datum::Null)),
        "length" => Ok(match args.first() {
            Some(Datum::Null) | None => Datum::Null,
            Some(datum) => Datum::Number(datum.to_text().unwrap_or_default().chars().count() as f64),
        }),
        other => Err(EvalError::Unsupported(format!("function '{}'", other))),
    }
}
