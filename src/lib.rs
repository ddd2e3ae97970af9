//! aerofilter - JSON predicate trees compiled into SQL boolean filters
//!
//! A caller describes a filter as data: comparisons on dotted field paths,
//! `and`/`or`/`not`, and `any` quantifiers over associations and arrays. The
//! compiler resolves every path against a registry of entity descriptors and
//! produces a [`expr::BoolExpr`] that can be attached to a [`expr::Query`],
//! rendered to PostgreSQL, or evaluated in memory.

pub mod cli;
pub mod eval;
pub mod expr;
pub mod filter;
pub mod observability;
pub mod schema;

pub use expr::{BoolExpr, Query};
pub use filter::{CompileContext, CompilerConfig, FilterCompiler, FilterError, Predicate};
pub use schema::{EntityDef, SchemaRegistry};
