//! Scalar values as seen by the evaluator
//!
//! Rows store plain JSON. Operands evaluate to a [`Datum`], which keeps the
//! distinctions SQL cares about: NULL versus a value, jsonb versus a plain
//! scalar, and timestamps produced by casts.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};
use regex::RegexBuilder;
use serde_json::Value;

use crate::expr::LIKE_ESCAPE;

use super::errors::{EvalError, EvalResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    /// jsonb value; JSON null reads as [`Datum::Null`]
    Json(Value),
}

impl Datum {
    /// Plain column value; arrays and objects become jsonb
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Datum::Null,
            Value::Bool(b) => Datum::Bool(*b),
            Value::Number(n) => n.as_f64().map(Datum::Number).unwrap_or(Datum::Null),
            Value::String(s) => Datum::Text(s.clone()),
            other => Datum::Json(other.clone()),
        }
    }

    /// jsonb value
    pub fn json(value: &Value) -> Self {
        match value {
            Value::Null => Datum::Null,
            other => Datum::Json(other.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Text rendering used by `#>>` and string functions
    pub fn to_text(&self) -> Option<String> {
        match self {
            Datum::Null => None,
            Datum::Bool(b) => Some(b.to_string()),
            Datum::Number(n) => Some(n.to_string()),
            Datum::Text(s) => Some(s.clone()),
            Datum::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Datum::Date(d) => Some(d.to_string()),
            Datum::Time(t) => Some(t.to_string()),
            Datum::Json(Value::String(s)) => Some(s.clone()),
            Datum::Json(v) => Some(v.to_string()),
        }
    }

    /// `CAST(self AS sql_type)`
    pub fn cast(self, sql_type: &str) -> EvalResult<Datum> {
        if self.is_null() {
            return Ok(Datum::Null);
        }
        let base = sql_type.split('(').next().unwrap_or(sql_type).trim();
        let round_to_seconds = sql_type.contains("(0)");

        match base {
            "timestamp" | "timestamptz" => {
                let ts = self.as_timestamp()?;
                Ok(Datum::Timestamp(if round_to_seconds {
                    ts.round_subsecs(0)
                } else {
                    ts
                }))
            }
            "date" => match self {
                Datum::Date(d) => Ok(Datum::Date(d)),
                other => Ok(Datum::Date(other.as_timestamp()?.date())),
            },
            "time" => match &self {
                Datum::Time(t) => Ok(Datum::Time(*t)),
                Datum::Text(s) => parse_time(s)
                    .map(Datum::Time)
                    .ok_or_else(|| EvalError::TypeMismatch(format!("'{}' is not a time", s))),
                other => Err(EvalError::TypeMismatch(format!(
                    "cannot cast {:?} to time",
                    other
                ))),
            },
            "text" => Ok(self.to_text().map(Datum::Text).unwrap_or(Datum::Null)),
            "bigint" | "numeric" | "double precision" => match &self {
                Datum::Number(n) => Ok(Datum::Number(*n)),
                Datum::Text(s) => s
                    .trim()
                    .parse()
                    .map(Datum::Number)
                    .map_err(|_| EvalError::TypeMismatch(format!("'{}' is not a number", s))),
                other => Err(EvalError::TypeMismatch(format!(
                    "cannot cast {:?} to {}",
                    other, sql_type
                ))),
            },
            "jsonb" => Ok(match self {
                Datum::Json(v) => Datum::Json(v),
                Datum::Text(s) => Datum::Json(serde_json::from_str(&s)?),
                other => other,
            }),
            other => Err(EvalError::Unsupported(format!("cast to '{}'", other))),
        }
    }

    fn as_timestamp(&self) -> EvalResult<NaiveDateTime> {
        match self {
            Datum::Timestamp(ts) => Ok(*ts),
            Datum::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
            Datum::Text(s) | Datum::Json(Value::String(s)) => parse_timestamp(s)
                .ok_or_else(|| EvalError::TypeMismatch(format!("'{}' is not a timestamp", s))),
            other => Err(EvalError::TypeMismatch(format!(
                "{:?} is not a timestamp",
                other
            ))),
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD[ T]HH:MM:SS[.f]` and bare dates
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M"))
        .ok()
}

/// jsonb equality: numbers compare by value, containers structurally
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| json_eq(v, w)))
        }
        _ => a == b,
    }
}

/// SQL `=`; `None` when either side is NULL
pub fn equals(left: &Datum, right: &Datum) -> EvalResult<Option<bool>> {
    match (left, right) {
        (Datum::Null, _) | (_, Datum::Null) => Ok(None),
        (Datum::Json(a), Datum::Json(b)) => Ok(Some(json_eq(a, b))),
        _ => Ok(compare(left, right)?.map(|ord| ord == Ordering::Equal)),
    }
}

/// SQL ordering; `None` when either side is NULL
pub fn compare(left: &Datum, right: &Datum) -> EvalResult<Option<Ordering>> {
    let ordering = match (left, right) {
        (Datum::Null, _) | (_, Datum::Null) => return Ok(None),
        (Datum::Bool(a), Datum::Bool(b)) => a.cmp(b),
        (Datum::Number(a), Datum::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Datum::Text(a), Datum::Text(b)) => a.cmp(b),
        (Datum::Timestamp(a), Datum::Timestamp(b)) => a.cmp(b),
        (Datum::Date(a), Datum::Date(b)) => a.cmp(b),
        (Datum::Time(a), Datum::Time(b)) => a.cmp(b),
        (Datum::Timestamp(_), Datum::Text(_)) | (Datum::Timestamp(_), Datum::Date(_)) => {
            left.as_timestamp()?.cmp(&right.as_timestamp()?)
        }
        (Datum::Text(_), Datum::Timestamp(_)) | (Datum::Date(_), Datum::Timestamp(_)) => {
            left.as_timestamp()?.cmp(&right.as_timestamp()?)
        }
        (Datum::Date(a), Datum::Text(_)) => a.cmp(&right.as_timestamp()?.date()),
        (Datum::Text(_), Datum::Date(b)) => left.as_timestamp()?.date().cmp(b),
        (Datum::Json(a), Datum::Json(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ if json_eq(a, b) => Ordering::Equal,
            _ => {
                return Err(EvalError::TypeMismatch(format!(
                    "cannot order jsonb {} against {}",
                    a, b
                )))
            }
        },
        _ => {
            return Err(EvalError::TypeMismatch(format!(
                "cannot compare {:?} with {:?}",
                left, right
            )))
        }
    };
    Ok(Some(ordering))
}

/// jsonb `@>`
pub fn json_contains(container: &Value, contained: &Value) -> bool {
    match (container, contained) {
        (Value::Object(a), Value::Object(b)) => b
            .iter()
            .all(|(k, v)| a.get(k).is_some_and(|w| json_contains(w, v))),
        (Value::Array(a), Value::Array(b)) => b
            .iter()
            .all(|v| a.iter().any(|w| json_contains(w, v))),
        (Value::Array(a), scalar) if !scalar.is_object() => {
            a.iter().any(|w| json_eq(w, scalar))
        }
        _ => json_eq(container, contained),
    }
}

/// SQL LIKE with `\` as escape character
pub fn like_matches(text: &str, pattern: &str, case_insensitive: bool) -> EvalResult<bool> {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push('^');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            c if c == LIKE_ESCAPE => match chars.next() {
                Some(escaped) => regex.push_str(&regex::escape(&escaped.to_string())),
                None => regex.push_str(&regex::escape(&c.to_string())),
            },
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            c => regex.push_str(&regex::escape(&c.to_string())),
        }
    }
    regex.push('$');

    let re = RegexBuilder::new(&regex)
        .dot_matches_new_line(true)
        .case_insensitive(case_insensitive)
        .build()?;
    Ok(re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_comparisons_are_unknown() {
        assert_eq!(equals(&Datum::Null, &Datum::Number(1.0)).unwrap(), None);
        assert_eq!(compare(&Datum::Text("a".into()), &Datum::Null).unwrap(), None);
    }

    #[test]
    fn test_json_numbers_compare_by_value() {
        assert_eq!(
            equals(&Datum::json(&json!(1)), &Datum::json(&json!(1.0))).unwrap(),
            Some(true)
        );
        assert_eq!(
            equals(&Datum::json(&json!(1)), &Datum::json(&json!("1"))).unwrap(),
            Some(false)
        );
    }

    #[test]
    fn test_timestamp_cast_and_compare() {
        let cast = Datum::Text("2024-01-01".into()).cast("timestamptz(0)").unwrap();
        let stored = Datum::Text("2024-01-01T10:00:00Z".into());
        assert_eq!(compare(&stored, &cast).unwrap(), Some(Ordering::Greater));

        let rounded = Datum::Text("2024-01-01 00:00:00.7".into())
            .cast("timestamp(0)")
            .unwrap();
        assert_eq!(
            rounded,
            Datum::Timestamp(parse_timestamp("2024-01-01T00:00:01").unwrap())
        );
        assert!(Datum::Text("soon".into()).cast("timestamptz").is_err());
    }

    #[test]
    fn test_json_containment() {
        let doc = json!({"a": 1, "tags": ["x", "y"], "n": {"k": true}});
        assert!(json_contains(&doc, &json!({"a": 1})));
        assert!(json_contains(&doc, &json!({"tags": ["y"]})));
        assert!(json_contains(&doc, &json!({"n": {}})));
        assert!(!json_contains(&doc, &json!({"a": 2})));
        assert!(json_contains(&json!([1, 2]), &json!(1)));
        assert!(!json_contains(&json!("ab"), &json!("a")));
    }

    #[test]
    fn test_like_matching() {
        assert!(like_matches("50% off", "%0\\%%", false).unwrap());
        assert!(!like_matches("500 off", "%0\\%%", false).unwrap());
        assert!(like_matches("a_b", "a\\_b", false).unwrap());
        assert!(!like_matches("axb", "a\\_b", false).unwrap());
        assert!(like_matches("axb", "a_b", false).unwrap());
        assert!(like_matches("Hello", "h%", true).unwrap());
        assert!(!like_matches("Hello", "h%", false).unwrap());
        assert!(like_matches("a\\b", "%\\\\%", false).unwrap());
        assert!(like_matches("line\nbreak", "line%", false).unwrap());
    }
}
