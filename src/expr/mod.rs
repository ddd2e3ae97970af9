//! Filter expression subsystem
//!
//! The target representation of the predicate compiler:
//! - `BoolExpr` / `Operand`: composable boolean filter fragments
//! - `Query`: the base query a filter is attached to
//! - `sql`: PostgreSQL rendering with positional parameters

mod ast;
mod query;
pub mod sql;

pub use ast::{BoolExpr, CompareOp, Operand, Source, SubQuery};
pub use query::Query;
pub use sql::{render, SqlFragment, SqlWriter, LIKE_ESCAPE};
