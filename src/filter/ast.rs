//! Predicate tree
//!
//! The caller-facing filter language. Predicates arrive as JSON objects:
//!
//! ```text
//! {"op": "eq" | "not_eq" | ... | "contains", "path": "a.b", "arg": <value>}
//! {"op": "and" | "or", "args": [<predicate>, ...]}
//! {"op": "not", "arg": <predicate>}
//! {"op": "any", "path": "a.b", "arg": <predicate>}
//! {"arg": true | false}
//! ```
//!
//! Every form requires exactly its listed keys. Paths are dotted strings or
//! pre-split arrays of segments.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{FilterError, FilterResult};

/// Leaf comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparatorOp {
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    Ilike,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    Contains,
}

impl ComparatorOp {
    pub const ALL: [ComparatorOp; 13] = [
        ComparatorOp::Eq,
        ComparatorOp::NotEq,
        ComparatorOp::Gt,
        ComparatorOp::Ge,
        ComparatorOp::Lt,
        ComparatorOp::Le,
        ComparatorOp::Like,
        ComparatorOp::Ilike,
        ComparatorOp::StartsWith,
        ComparatorOp::EndsWith,
        ComparatorOp::In,
        ComparatorOp::NotIn,
        ComparatorOp::Contains,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparatorOp::Eq => "eq",
            ComparatorOp::NotEq => "not_eq",
            ComparatorOp::Gt => "gt",
            ComparatorOp::Ge => "ge",
            ComparatorOp::Lt => "lt",
            ComparatorOp::Le => "le",
            ComparatorOp::Like => "like",
            ComparatorOp::Ilike => "ilike",
            ComparatorOp::StartsWith => "starts_with",
            ComparatorOp::EndsWith => "ends_with",
            ComparatorOp::In => "in",
            ComparatorOp::NotIn => "not_in",
            ComparatorOp::Contains => "contains",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }
}

impl fmt::Display for ComparatorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JunctionOp {
    And,
    Or,
}

impl JunctionOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            JunctionOp::And => "and",
            JunctionOp::Or => "or",
        }
    }
}

/// Field path relative to the current scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Splits a dotted path; the empty string is the empty path
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::default();
        }
        Self(dotted.split('.').map(str::to_string).collect())
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dotted string when that parses back to the same segments, otherwise
    /// the segment list
    pub fn to_json(&self) -> Value {
        if self.0.iter().any(|seg| seg.is_empty() || seg.contains('.')) {
            Value::Array(self.0.iter().cloned().map(Value::String).collect())
        } else {
            Value::String(self.0.join("."))
        }
    }

    /// Leading segment and the rest of the path
    pub fn split_first(&self) -> Option<(&str, FieldPath)> {
        self.0
            .split_first()
            .map(|(head, rest)| (head.as_str(), FieldPath(rest.to_vec())))
    }

    fn from_json(value: &Value, fragment: &Value) -> FilterResult<Self> {
        match value {
            Value::String(s) => Ok(Self::parse(s)),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        FilterError::invalid_shape("Path segments must be strings", fragment)
                    })
                })
                .collect::<FilterResult<Vec<_>>>()
                .map(Self),
            _ => Err(FilterError::invalid_shape(
                "Path must be a string or an array of strings",
                fragment,
            )),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

/// One node of a filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Predicate {
    Comparator {
        op: ComparatorOp,
        path: FieldPath,
        arg: Value,
    },
    Junction {
        op: JunctionOp,
        args: Vec<Predicate>,
    },
    Negation {
        arg: Box<Predicate>,
    },
    Quantifier {
        path: FieldPath,
        arg: Box<Predicate>,
    },
    Literal {
        value: bool,
    },
}

impl Predicate {
    pub fn comparator(op: ComparatorOp, path: impl Into<FieldPath>, arg: Value) -> Self {
        Predicate::Comparator {
            op,
            path: path.into(),
            arg,
        }
    }

    pub fn and(args: Vec<Predicate>) -> Self {
        Predicate::Junction {
            op: JunctionOp::And,
            args,
        }
    }

    pub fn or(args: Vec<Predicate>) -> Self {
        Predicate::Junction {
            op: JunctionOp::Or,
            args,
        }
    }

    pub fn not(arg: Predicate) -> Self {
        Predicate::Negation { arg: Box::new(arg) }
    }

    pub fn any(path: impl Into<FieldPath>, arg: Predicate) -> Self {
        Predicate::Quantifier {
            path: path.into(),
            arg: Box::new(arg),
        }
    }

    pub fn literal(value: bool) -> Self {
        Predicate::Literal { value }
    }

    /// Parses the JSON form, rejecting anything that is not exactly one of
    /// the predicate shapes.
    pub fn from_json(value: &Value) -> FilterResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| FilterError::invalid_shape("Predicate must be an object", value))?;

        if obj.len() == 1 {
            if let Some(Value::Bool(b)) = obj.get("arg") {
                return Ok(Predicate::Literal { value: *b });
            }
        }

        let op = obj
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| FilterError::invalid_shape("Predicate has no operator", value))?;

        match op {
            "and" | "or" => {
                expect_keys(obj, &["op", "args"], value)?;
                let args = match &obj["args"] {
                    Value::Array(items) => items
                        .iter()
                        .map(Predicate::from_json)
                        .collect::<FilterResult<Vec<_>>>()?,
                    single @ Value::Object(_) => vec![Predicate::from_json(single)?],
                    _ => {
                        return Err(FilterError::invalid_shape(
                            "Junction args must be a predicate or a list of predicates",
                            value,
                        ))
                    }
                };
                let op = if op == "and" {
                    JunctionOp::And
                } else {
                    JunctionOp::Or
                };
                Ok(Predicate::Junction { op, args })
            }
            "not" => {
                expect_keys(obj, &["op", "arg"], value)?;
                let arg = Predicate::from_json(&obj["arg"])?;
                Ok(Predicate::not(arg))
            }
            "any" => {
                expect_keys(obj, &["op", "path", "arg"], value)?;
                let path = FieldPath::from_json(&obj["path"], value)?;
                let arg = Predicate::from_json(&obj["arg"])?;
                Ok(Predicate::any(path, arg))
            }
            name => {
                let op = ComparatorOp::parse(name).ok_or_else(|| {
                    FilterError::invalid_shape(format!("Unknown operator '{}'", name), value)
                })?;
                expect_keys(obj, &["op", "path", "arg"], value)?;
                let path = FieldPath::from_json(&obj["path"], value)?;
                Ok(Predicate::Comparator {
                    op,
                    path,
                    arg: obj["arg"].clone(),
                })
            }
        }
    }

    /// Canonical JSON form
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        match self {
            Predicate::Comparator { op, path, arg } => {
                obj.insert("op".into(), Value::from(op.as_str()));
                obj.insert("path".into(), path.to_json());
                obj.insert("arg".into(), arg.clone());
            }
            Predicate::Junction { op, args } => {
                obj.insert("op".into(), Value::from(op.as_str()));
                obj.insert(
                    "args".into(),
                    Value::Array(args.iter().map(Predicate::to_json).collect()),
                );
            }
            Predicate::Negation { arg } => {
                obj.insert("op".into(), Value::from("not"));
                obj.insert("arg".into(), arg.to_json());
            }
            Predicate::Quantifier { path, arg } => {
                obj.insert("op".into(), Value::from("any"));
                obj.insert("path".into(), path.to_json());
                obj.insert("arg".into(), arg.to_json());
            }
            Predicate::Literal { value } => {
                obj.insert("arg".into(), Value::Bool(*value));
            }
        }
        Value::Object(obj)
    }
}

fn expect_keys(obj: &Map<String, Value>, keys: &[&str], fragment: &Value) -> FilterResult<()> {
    if obj.len() == keys.len() && keys.iter().all(|k| obj.contains_key(*k)) {
        return Ok(());
    }
    Err(FilterError::invalid_shape(
        format!("Expected exactly the keys {}", keys.join(", ")),
        fragment,
    ))
}

impl TryFrom<Value> for Predicate {
    type Error = FilterError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Predicate::from_json(&value)
    }
}

impl From<Predicate> for Value {
    fn from(predicate: Predicate) -> Self {
        predicate.to_json()
    }
}
