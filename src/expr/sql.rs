//! PostgreSQL rendering of filter expressions
//!
//! Values never appear inline: every literal becomes a positional `$n`
//! parameter, collected in order of appearance.

use std::fmt::Write;

use serde_json::Value;

use super::ast::{BoolExpr, Operand, Source};

/// Escape character used in every LIKE pattern the compiler produces
pub const LIKE_ESCAPE: char = '\\';

/// Rendered SQL plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Accumulates SQL text and parameters
#[derive(Debug, Default)]
pub struct SqlWriter {
    buf: String,
    params: Vec<Value>,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw SQL text
    pub fn push_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    /// Append a double-quoted identifier
    pub fn push_ident(&mut self, ident: &str) {
        self.buf.push('"');
        for c in ident.chars() {
            if c == '"' {
                self.buf.push('"');
            }
            self.buf.push(c);
        }
        self.buf.push('"');
    }

    /// Register a parameter and append its placeholder
    pub fn push_param(&mut self, value: Value) {
        self.params.push(value);
        let _ = write!(self.buf, "${}", self.params.len());
    }

    pub fn write_expr(&mut self, expr: &BoolExpr) {
        match expr {
            BoolExpr::Const { value } => self.push_str(if *value { "TRUE" } else { "FALSE" }),
            BoolExpr::And { args } => self.write_junction(args, " AND "),
            BoolExpr::Or { args } => self.write_junction(args, " OR "),
            BoolExpr::Not { arg } => {
                self.push_str("NOT (");
                self.write_expr(arg);
                self.push_str(")");
            }
            BoolExpr::Compare { left, op, right } => {
                self.write_operand(left);
                self.push_str(" ");
                self.push_str(op.as_sql());
                self.push_str(" ");
                self.write_operand(right);
            }
            BoolExpr::IsNull { operand, negated } => {
                self.write_operand(operand);
                self.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            BoolExpr::InList {
                operand,
                values,
                negated,
            } => {
                self.write_operand(operand);
                self.push_str(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.push_str(", ");
                    }
                    self.write_operand(value);
                }
                self.push_str(")");
            }
            BoolExpr::Like {
                operand,
                pattern,
                case_insensitive,
            } => {
                self.write_operand(operand);
                self.push_str(if *case_insensitive { " ILIKE " } else { " LIKE " });
                self.push_param(Value::String(pattern.clone()));
                let _ = write!(self.buf, " ESCAPE '{}'", LIKE_ESCAPE);
            }
            BoolExpr::JsonContains { operand, value } => {
                self.write_operand(operand);
                self.push_str(" @> ");
                self.push_param(value.clone());
                self.push_str("::jsonb");
            }
            BoolExpr::Exists { query } => {
                self.push_str("EXISTS (SELECT 1 FROM ");
                match &query.source {
                    Source::Table { name } => {
                        self.push_ident(name);
                        self.push_str(" AS ");
                        self.push_ident(&query.binding);
                    }
                    Source::Unnest { operand } => {
                        self.push_str("unnest(");
                        self.write_operand(operand);
                        self.push_str(") AS ");
                        self.push_ident(&query.binding);
                        self.push_str("(\"value\")");
                    }
                    Source::JsonArrayElements { operand } => {
                        self.push_str("jsonb_array_elements(");
                        self.write_operand(operand);
                        self.push_str(") AS ");
                        self.push_ident(&query.binding);
                        self.push_str("(\"value\")");
                    }
                }
                self.push_str(" WHERE ");
                self.write_expr(&query.filter);
                self.push_str(")");
            }
        }
    }

    fn write_junction(&mut self, args: &[BoolExpr], sep: &str) {
        self.push_str("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.push_str(sep);
            }
            self.write_expr(arg);
        }
        self.push_str(")");
    }

    pub fn write_operand(&mut self, operand: &Operand) {
        match operand {
            Operand::Column { binding, column } => {
                self.push_ident(binding);
                self.push_str(".");
                self.push_ident(column);
            }
            Operand::Field { column } => self.push_ident(column),
            Operand::JsonPath {
                base,
                path,
                as_text,
            } => {
                self.push_str("(");
                self.write_operand(base);
                self.push_str(if *as_text { " #>> " } else { " #> " });
                self.push_param(Value::Array(
                    path.iter().cloned().map(Value::String).collect(),
                ));
                self.push_str(")");
            }
            Operand::Element { binding } => {
                self.push_ident(binding);
                self.push_str(".\"value\"");
            }
            Operand::Param { value } => self.push_param(value.clone()),
            Operand::JsonParam { value } => {
                self.push_param(value.clone());
                self.push_str("::jsonb");
            }
            Operand::Cast { operand, sql_type } => {
                self.push_str("CAST(");
                self.write_operand(operand);
                self.push_str(" AS ");
                self.push_str(sql_type);
                self.push_str(")");
            }
            Operand::Func { name, args } => {
                self.push_str(name);
                self.push_str("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.push_str(", ");
                    }
                    self.write_operand(arg);
                }
                self.push_str(")");
            }
            Operand::Fragment { sql, args } => {
                let mut args = args.iter();
                for c in sql.chars() {
                    let arg = if c == '?' { args.next() } else { None };
                    match arg {
                        Some(arg) => self.write_operand(arg),
                        None => self.buf.push(c),
                    }
                }
            }
        }
    }

    pub fn finish(self) -> SqlFragment {
        SqlFragment {
            sql: self.buf,
            params: self.params,
        }
    }
}

/// Render a standalone boolean expression
pub fn render(expr: &BoolExpr) -> SqlFragment {
    let mut writer = SqlWriter::new();
    writer.write_expr(expr);
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::CompareOp;
    use serde_json::json;

    #[test]
    fn test_render_null_safe_not_eq() {
        let col = Operand::column("posts", "title");
        let expr = BoolExpr::any(vec![
            BoolExpr::compare(col.clone(), CompareOp::NotEq, Operand::param(json!("a"))),
            BoolExpr::is_null(col),
        ]);

        let out = render(&expr);
        assert_eq!(
            out.sql,
            "(\"posts\".\"title\" <> $1 OR \"posts\".\"title\" IS NULL)"
        );
        assert_eq!(out.params, vec![json!("a")]);
    }

    #[test]
    fn test_render_like_uses_escape_clause() {
        let expr = BoolExpr::Like {
            operand: Operand::column("p", "name"),
            pattern: "%50\\%%".into(),
            case_insensitive: true,
        };

        let out = render(&expr);
        assert_eq!(out.sql, "\"p\".\"name\" ILIKE $1 ESCAPE '\\'");
        assert_eq!(out.params, vec![json!("%50\\%%")]);
    }

    #[test]
    fn test_render_exists_over_table() {
        let expr = BoolExpr::exists(
            Source::Table {
                name: "comments".into(),
            },
            "s1",
            BoolExpr::compare(
                Operand::column("s1", "post_id"),
                CompareOp::Eq,
                Operand::column("posts", "id"),
            ),
        );

        assert_eq!(
            render(&expr).sql,
            "EXISTS (SELECT 1 FROM \"comments\" AS \"s1\" WHERE \"s1\".\"post_id\" = \"posts\".\"id\")"
        );
    }

    #[test]
    fn test_render_unnest_and_json_path() {
        let expr = BoolExpr::exists(
            Source::JsonArrayElements {
                operand: Operand::json_path(Operand::column("p", "meta"), vec!["items".into()]),
            },
            "s1",
            BoolExpr::compare(
                Operand::Element {
                    binding: "s1".into(),
                },
                CompareOp::Eq,
                Operand::json_param(json!(3)),
            ),
        );

        let out = render(&expr);
        assert_eq!(
            out.sql,
            "EXISTS (SELECT 1 FROM jsonb_array_elements((\"p\".\"meta\" #> $1)) AS \"s1\"(\"value\") WHERE \"s1\".\"value\" = $2::jsonb)"
        );
        assert_eq!(out.params, vec![json!(["items"]), json!(3)]);
    }

    #[test]
    fn test_render_fragment_placeholders() {
        let op = Operand::Fragment {
            sql: "coalesce(?, ?)".into(),
            args: vec![Operand::column("u", "nick"), Operand::column("u", "name")],
        };
        let mut writer = SqlWriter::new();
        writer.write_operand(&op);
        assert_eq!(
            writer.finish().sql,
            "coalesce(\"u\".\"nick\", \"u\".\"name\")"
        );
    }

    #[test]
    fn test_ident_quoting() {
        let mut writer = SqlWriter::new();
        writer.push_ident("we\"ird");
        assert_eq!(writer.finish().sql, "\"we\"\"ird\"");
    }
}
