//! Evaluation error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("AERO_EVAL_UNKNOWN_TABLE: no table named '{0}' in the dataset")]
    UnknownTable(String),

    #[error("AERO_EVAL_UNKNOWN_BINDING: '{0}' is not bound in this scope")]
    UnknownBinding(String),

    #[error("AERO_EVAL_TYPE_MISMATCH: {0}")]
    TypeMismatch(String),

    #[error("AERO_EVAL_UNSUPPORTED: {0}")]
    Unsupported(String),

    #[error("AERO_EVAL_PATTERN: {0}")]
    Pattern(#[from] regex::Error),

    #[error("AERO_EVAL_DATASET: {0}")]
    Dataset(String),

    #[error("AERO_EVAL_IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("AERO_EVAL_PARSE: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type EvalResult<T> = Result<T, EvalError>;
