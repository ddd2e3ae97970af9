//! Filter compiler subsystem
//!
//! Turns a JSON predicate tree into a [`BoolExpr`](crate::expr::BoolExpr)
//! over a registered entity.
//!
//! # Design Principles
//!
//! - Pure: compilation reads the registry and the context, nothing else
//! - Strict: unknown shapes, fields and operator pairs are errors, never no-ops
//! - NULL-aware: `eq`, `not_eq`, `in` and `not_in` match NULL only when asked
//! - Deterministic: equal inputs produce structurally equal expressions

mod ast;
mod compiler;
mod config;
mod context;
mod errors;
mod operators;
mod path;

pub use ast::{ComparatorOp, FieldPath, JunctionOp, Predicate};
pub use compiler::FilterCompiler;
pub use config::{CompilerConfig, ConfigError, ConfigResult};
pub use context::CompileContext;
pub use errors::{FilterError, FilterErrorCode, FilterResult};
pub use operators::escape_like;
pub use path::{resolve, ResolvedTarget, Scope, TargetKind};
