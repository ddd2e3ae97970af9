//! Operator translators
//!
//! One translator per comparator, looked up by `(operator, target kind)`.
//! Translators see the target as a plain operand plus its declared type and
//! never look at the schema again.
//!
//! Null handling differs by operator. `eq`, `not_eq`, `in` and `not_in` treat
//! NULL as a value the caller can ask for; ordering and string operators keep
//! SQL's three-valued semantics.

use serde_json::Value;
use uuid::Uuid;

use crate::expr::{BoolExpr, CompareOp, Operand, LIKE_ESCAPE};
use crate::observability::{Event, Logger};
use crate::schema::FieldType;

use super::ast::ComparatorOp;
use super::config::CompilerConfig;
use super::errors::{FilterError, FilterResult};
use super::path::{ResolvedTarget, TargetKind};

/// Operand-level view of a resolved target
#[derive(Debug, Clone)]
pub(crate) struct Target {
    operand: Operand,
    field_type: Option<FieldType>,
    json: bool,
}

impl Target {
    /// `None` for association targets, which have no operand
    pub(crate) fn from_resolved(target: ResolvedTarget<'_>) -> Option<Self> {
        match target {
            ResolvedTarget::Stored {
                column, field_type, ..
            } => Some(Self {
                json: field_type.is_map(),
                operand: column,
                field_type: Some(field_type),
            }),
            ResolvedTarget::Json { base, path } => Some(Self {
                operand: Operand::json_path(base, path),
                field_type: None,
                json: true,
            }),
            ResolvedTarget::Virtual {
                expr,
                field_type,
                path,
            } if field_type.is_map() && !path.is_empty() => Some(Self {
                operand: Operand::json_path(expr, path),
                field_type: None,
                json: true,
            }),
            ResolvedTarget::Virtual {
                expr, field_type, ..
            } => Some(Self {
                json: field_type.is_map(),
                operand: expr,
                field_type: Some(field_type),
            }),
            ResolvedTarget::Element { operand, json } => Some(Self {
                operand,
                field_type: None,
                json,
            }),
            ResolvedTarget::Association { .. } => None,
        }
    }

    fn operand(&self) -> Operand {
        self.operand.clone()
    }

    fn text_operand(&self) -> Operand {
        if self.json {
            self.operand().into_json_text()
        } else {
            self.operand()
        }
    }
}

pub(crate) type Translator = fn(&Target, &Value, &CompilerConfig) -> FilterResult<BoolExpr>;

/// Translator for `op` on `kind`, `None` when the pair is unsupported
pub(crate) fn translator(op: ComparatorOp, kind: TargetKind) -> Option<Translator> {
    match kind {
        TargetKind::Stored | TargetKind::Json | TargetKind::Virtual | TargetKind::Element => {}
        TargetKind::Association => return None,
    }

    let translate: Translator = match op {
        ComparatorOp::Eq => eq,
        ComparatorOp::NotEq => not_eq,
        ComparatorOp::Gt => gt,
        ComparatorOp::Ge => ge,
        ComparatorOp::Lt => lt,
        ComparatorOp::Le => le,
        ComparatorOp::Like => like,
        ComparatorOp::Ilike => ilike,
        ComparatorOp::StartsWith => starts_with,
        ComparatorOp::EndsWith => ends_with,
        ComparatorOp::In => in_list,
        ComparatorOp::NotIn => not_in_list,
        ComparatorOp::Contains => contains,
    };
    Some(translate)
}

/// Escapes LIKE wildcards and the escape character itself
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Argument operand typed for comparison against `target`
fn value_operand(
    target: &Target,
    value: &Value,
    op: ComparatorOp,
    config: &CompilerConfig,
) -> FilterResult<Operand> {
    if target.json {
        return Ok(Operand::json_param(value.clone()));
    }

    match &target.field_type {
        Some(FieldType::Uuid) => {
            if let Some(s) = value.as_str() {
                Uuid::parse_str(s)
                    .map_err(|_| FilterError::type_mismatch(op.as_str(), "a UUID string", value))?;
            }
            Ok(Operand::param(value.clone()))
        }
        Some(ty) if config.is_precision_type(ty) && !value.is_null() => {
            Ok(Operand::cast(Operand::param(value.clone()), ty.sql_type()))
        }
        _ => Ok(Operand::param(value.clone())),
    }
}

fn eq(target: &Target, arg: &Value, config: &CompilerConfig) -> FilterResult<BoolExpr> {
    if arg.is_null() {
        return Ok(BoolExpr::is_null(target.operand()));
    }
    let value = value_operand(target, arg, ComparatorOp::Eq, config)?;
    Ok(BoolExpr::compare(target.operand(), CompareOp::Eq, value))
}

fn not_eq(target: &Target, arg: &Value, config: &CompilerConfig) -> FilterResult<BoolExpr> {
    if arg.is_null() {
        return Ok(BoolExpr::is_not_null(target.operand()));
    }
    let value = value_operand(target, arg, ComparatorOp::NotEq, config)?;
    Ok(BoolExpr::any(vec![
        BoolExpr::compare(target.operand(), CompareOp::NotEq, value),
        BoolExpr::is_null(target.operand()),
    ]))
}

fn ordering(
    target: &Target,
    arg: &Value,
    config: &CompilerConfig,
    op: ComparatorOp,
    cmp: CompareOp,
) -> FilterResult<BoolExpr> {
    if arg.is_array() || arg.is_object() {
        return Err(FilterError::type_mismatch(op.as_str(), "a scalar", arg));
    }
    let value = value_operand(target, arg, op, config)?;
    Ok(BoolExpr::compare(target.operand(), cmp, value))
}

fn gt(target: &Target, arg: &Value, config: &CompilerConfig) -> FilterResult<BoolExpr> {
    ordering(target, arg, config, ComparatorOp::Gt, CompareOp::Gt)
}

fn ge(target: &Target, arg: &Value, config: &CompilerConfig) -> FilterResult<BoolExpr> {
    ordering(target, arg, config, ComparatorOp::Ge, CompareOp::Ge)
}

fn lt(target: &Target, arg: &Value, config: &CompilerConfig) -> FilterResult<BoolExpr> {
    ordering(target, arg, config, ComparatorOp::Lt, CompareOp::Lt)
}

fn le(target: &Target, arg: &Value, config: &CompilerConfig) -> FilterResult<BoolExpr> {
    ordering(target, arg, config, ComparatorOp::Le, CompareOp::Le)
}

fn pattern(
    target: &Target,
    arg: &Value,
    op: ComparatorOp,
    leading: bool,
    trailing: bool,
    case_insensitive: bool,
) -> FilterResult<BoolExpr> {
    let raw = arg
        .as_str()
        .ok_or_else(|| FilterError::type_mismatch(op.as_str(), "a string", arg))?;

    let mut pattern = String::with_capacity(raw.len() + 2);
    if leading {
        pattern.push('%');
    }
    pattern.push_str(&escape_like(raw));
    if trailing {
        pattern.push('%');
    }

    Ok(BoolExpr::Like {
        operand: target.text_operand(),
        pattern,
        case_insensitive,
    })
}

fn like(target: &Target, arg: &Value, _config: &CompilerConfig) -> FilterResult<BoolExpr> {
    pattern(target, arg, ComparatorOp::Like, true, true, false)
}

fn ilike(target: &Target, arg: &Value, _config: &CompilerConfig) -> FilterResult<BoolExpr> {
    pattern(target, arg, ComparatorOp::Ilike, true, true, true)
}

fn starts_with(target: &Target, arg: &Value, _config: &CompilerConfig) -> FilterResult<BoolExpr> {
    pattern(target, arg, ComparatorOp::StartsWith, false, true, false)
}

fn ends_with(target: &Target, arg: &Value, _config: &CompilerConfig) -> FilterResult<BoolExpr> {
    pattern(target, arg, ComparatorOp::EndsWith, true, false, false)
}

/// Splits a list argument into its non-null values and whether a null was present
fn split_nulls(arg: &Value) -> (Vec<&Value>, bool) {
    let items: Vec<&Value> = match arg {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    let has_null = items.iter().any(|v| v.is_null());
    let values = items.into_iter().filter(|v| !v.is_null()).collect();
    (values, has_null)
}

fn list_operands(
    target: &Target,
    values: &[&Value],
    op: ComparatorOp,
    config: &CompilerConfig,
) -> FilterResult<Vec<Operand>> {
    values
        .iter()
        .map(|v| value_operand(target, v, op, config))
        .collect()
}

fn in_list(target: &Target, arg: &Value, config: &CompilerConfig) -> FilterResult<BoolExpr> {
    let (values, has_null) = split_nulls(arg);
    let values = list_operands(target, &values, ComparatorOp::In, config)?;

    let mut terms = Vec::with_capacity(2);
    if !values.is_empty() {
        terms.push(BoolExpr::InList {
            operand: target.operand(),
            values,
            negated: false,
        });
    }
    if has_null {
        terms.push(BoolExpr::is_null(target.operand()));
    }
    Ok(BoolExpr::any(terms))
}

fn not_in_list(target: &Target, arg: &Value, config: &CompilerConfig) -> FilterResult<BoolExpr> {
    let (values, has_null) = split_nulls(arg);
    let values = list_operands(target, &values, ComparatorOp::NotIn, config)?;

    if values.is_empty() {
        return Ok(if has_null {
            BoolExpr::is_not_null(target.operand())
        } else {
            BoolExpr::TRUE
        });
    }

    let excluded = BoolExpr::InList {
        operand: target.operand(),
        values,
        negated: true,
    };
    Ok(if has_null {
        BoolExpr::all(vec![excluded, BoolExpr::is_not_null(target.operand())])
    } else {
        BoolExpr::any(vec![excluded, BoolExpr::is_null(target.operand())])
    })
}

fn contains(target: &Target, arg: &Value, _config: &CompilerConfig) -> FilterResult<BoolExpr> {
    if target.json {
        return Ok(BoolExpr::JsonContains {
            operand: target.operand(),
            value: arg.clone(),
        });
    }

    let expr = pattern(target, arg, ComparatorOp::Contains, true, true, false)?;
    Logger::warn(
        Event::ContainsFallback.as_str(),
        &[("reason", "target is not JSON, matching as substring")],
    );
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterErrorCode;
    use serde_json::json;

    fn column(ty: FieldType) -> Target {
        Target {
            operand: Operand::column("posts", "f"),
            field_type: Some(ty),
            json: false,
        }
    }

    fn json_target() -> Target {
        Target {
            operand: Operand::json_path(Operand::column("posts", "meta"), vec!["a".into()]),
            field_type: None,
            json: true,
        }
    }

    fn translate(op: ComparatorOp, target: &Target, arg: Value) -> FilterResult<BoolExpr> {
        let translate = translator(op, TargetKind::Stored).unwrap();
        translate(target, &arg, &CompilerConfig::default())
    }

    fn f() -> Operand {
        Operand::column("posts", "f")
    }

    #[test]
    fn test_association_has_no_translators() {
        for op in ComparatorOp::ALL {
            assert!(translator(op, TargetKind::Association).is_none());
            assert!(translator(op, TargetKind::Element).is_some());
        }
    }

    #[test]
    fn test_eq_and_not_eq_null_safety() {
        let t = column(FieldType::Int);
        assert_eq!(
            translate(ComparatorOp::Eq, &t, Value::Null).unwrap(),
            BoolExpr::is_null(f())
        );
        assert_eq!(
            translate(ComparatorOp::NotEq, &t, Value::Null).unwrap(),
            BoolExpr::is_not_null(f())
        );
        assert_eq!(
            translate(ComparatorOp::NotEq, &t, json!(3)).unwrap(),
            BoolExpr::any(vec![
                BoolExpr::compare(f(), CompareOp::NotEq, Operand::param(json!(3))),
                BoolExpr::is_null(f()),
            ])
        );
    }

    #[test]
    fn test_in_splits_nulls() {
        let t = column(FieldType::String);
        assert_eq!(
            translate(ComparatorOp::In, &t, json!(["a", null])).unwrap(),
            BoolExpr::any(vec![
                BoolExpr::InList {
                    operand: f(),
                    values: vec![Operand::param(json!("a"))],
                    negated: false,
                },
                BoolExpr::is_null(f()),
            ])
        );
        assert_eq!(translate(ComparatorOp::In, &t, json!([])).unwrap(), BoolExpr::FALSE);
        assert_eq!(
            translate(ComparatorOp::In, &t, json!("solo")).unwrap(),
            BoolExpr::InList {
                operand: f(),
                values: vec![Operand::param(json!("solo"))],
                negated: false,
            }
        );
    }

    #[test]
    fn test_not_in_null_handling() {
        let t = column(FieldType::String);
        let not_in = BoolExpr::InList {
            operand: f(),
            values: vec![Operand::param(json!("a"))],
            negated: true,
        };
        assert_eq!(
            translate(ComparatorOp::NotIn, &t, json!(["a"])).unwrap(),
            BoolExpr::any(vec![not_in.clone(), BoolExpr::is_null(f())])
        );
        assert_eq!(
            translate(ComparatorOp::NotIn, &t, json!(["a", null])).unwrap(),
            BoolExpr::all(vec![not_in, BoolExpr::is_not_null(f())])
        );
        assert_eq!(translate(ComparatorOp::NotIn, &t, json!([])).unwrap(), BoolExpr::TRUE);
        assert_eq!(
            translate(ComparatorOp::NotIn, &t, json!([null])).unwrap(),
            BoolExpr::is_not_null(f())
        );
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_string_anchors() {
        let t = column(FieldType::String);
        let pat = |op, arg: &str| match translate(op, &t, json!(arg)).unwrap() {
            BoolExpr::Like {
                pattern,
                case_insensitive,
                ..
            } => (pattern, case_insensitive),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(pat(ComparatorOp::Like, "a_b"), ("%a\\_b%".to_string(), false));
        assert_eq!(pat(ComparatorOp::Ilike, "x"), ("%x%".to_string(), true));
        assert_eq!(pat(ComparatorOp::StartsWith, "x"), ("x%".to_string(), false));
        assert_eq!(pat(ComparatorOp::EndsWith, "x"), ("%x".to_string(), false));
        assert_eq!(pat(ComparatorOp::Contains, "x"), ("%x%".to_string(), false));
    }

    #[test]
    fn test_type_mismatches() {
        let t = column(FieldType::String);
        let code = |op, arg| translate(op, &t, arg).unwrap_err().code();
        assert_eq!(code(ComparatorOp::Like, json!(5)), FilterErrorCode::TypeMismatch);
        assert_eq!(code(ComparatorOp::StartsWith, Value::Null), FilterErrorCode::TypeMismatch);
        assert_eq!(code(ComparatorOp::Gt, json!([1])), FilterErrorCode::TypeMismatch);

        let id = column(FieldType::Uuid);
        assert_eq!(
            translate(ComparatorOp::Eq, &id, json!("not-a-uuid")).unwrap_err().code(),
            FilterErrorCode::TypeMismatch
        );
        assert!(translate(ComparatorOp::Eq, &id, json!("6f1c1a52-8d5e-4b4e-9a53-2f0f5f8b1c11")).is_ok());
    }

    #[test]
    fn test_precision_cast() {
        let t = column(FieldType::UtcDatetime);
        let cast = |v: &str| Operand::cast(Operand::param(json!(v)), "timestamptz(0)");
        assert_eq!(
            translate(ComparatorOp::Ge, &t, json!("2024-01-01")).unwrap(),
            BoolExpr::compare(f(), CompareOp::Ge, cast("2024-01-01"))
        );
        assert_eq!(
            translate(ComparatorOp::In, &t, json!(["2024-01-01", "2024-02-01"])).unwrap(),
            BoolExpr::InList {
                operand: f(),
                values: vec![cast("2024-01-01"), cast("2024-02-01")],
                negated: false,
            }
        );
    }

    #[test]
    fn test_json_targets() {
        let t = json_target();
        assert_eq!(
            translate(ComparatorOp::Contains, &t, json!({"k": 1})).unwrap(),
            BoolExpr::JsonContains {
                operand: t.operand(),
                value: json!({"k": 1}),
            }
        );
        assert_eq!(
            translate(ComparatorOp::Eq, &t, json!(2)).unwrap(),
            BoolExpr::compare(t.operand(), CompareOp::Eq, Operand::json_param(json!(2)))
        );
        match translate(ComparatorOp::Like, &t, json!("x")).unwrap() {
            BoolExpr::Like { operand, .. } => assert_eq!(operand, t.operand().into_json_text()),
            other => panic!("unexpected {:?}", other),
        }
    }
}
