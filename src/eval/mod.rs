//! Reference evaluator subsystem
//!
//! Executes compiled queries over in-memory JSON tables with SQL NULL
//! semantics. Used to check compiled filters without a database and by the
//! `query` CLI command.
//!
//! # Design Principles
//!
//! - A row matches only when its filter is TRUE; UNKNOWN filters it out
//! - Sub-queries see every binding of their enclosing scopes
//! - No coercion beyond what PostgreSQL applies to typed literals

mod dataset;
mod datum;
mod errors;
mod evaluator;

pub use dataset::Dataset;
pub use datum::{parse_timestamp, Datum};
pub use errors::{EvalError, EvalResult};
pub use evaluator::{Evaluator, Truth};
