//! Filter compile error types
//!
//! Error codes:
//! - AERO_FILTER_INVALID_SHAPE
//! - AERO_FILTER_UNKNOWN_FIELD
//! - AERO_FILTER_DISALLOWED_FIELD
//! - AERO_FILTER_UNRESOLVED_VIRTUAL_FIELD
//! - AERO_FILTER_UNSUPPORTED_OPERATOR
//! - AERO_FILTER_TYPE_MISMATCH
//! - AERO_FILTER_EMPTY_PATH
//! - AERO_FILTER_AMBIGUOUS_BINDING
//!
//! All of them reject the request; nothing is retried and no partial filter
//! is produced. Errors carry the offending predicate fragment, which names
//! schema fields: use [`FilterError::redacted`] when replying to untrusted
//! callers.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use super::ast::Predicate;
use super::path::TargetKind;

/// Filter compile error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterErrorCode {
    /// Object matches no predicate form
    InvalidPredicateShape,
    /// Path segment names nothing on the current schema
    UnknownField,
    /// Path segment names something that can never be filtered through
    DisallowedField,
    /// Virtual field without a resolver
    UnresolvedVirtualField,
    /// Operator undefined for the resolved target
    UnsupportedOperator,
    /// Argument type incompatible with the operator or field
    TypeMismatch,
    /// Empty path where a field is required
    EmptyPath,
    /// Base query anchored under a different name
    AmbiguousBinding,
}

impl FilterErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            FilterErrorCode::InvalidPredicateShape => "AERO_FILTER_INVALID_SHAPE",
            FilterErrorCode::UnknownField => "AERO_FILTER_UNKNOWN_FIELD",
            FilterErrorCode::DisallowedField => "AERO_FILTER_DISALLOWED_FIELD",
            FilterErrorCode::UnresolvedVirtualField => "AERO_FILTER_UNRESOLVED_VIRTUAL_FIELD",
            FilterErrorCode::UnsupportedOperator => "AERO_FILTER_UNSUPPORTED_OPERATOR",
            FilterErrorCode::TypeMismatch => "AERO_FILTER_TYPE_MISMATCH",
            FilterErrorCode::EmptyPath => "AERO_FILTER_EMPTY_PATH",
            FilterErrorCode::AmbiguousBinding => "AERO_FILTER_AMBIGUOUS_BINDING",
        }
    }

    /// Message that reveals nothing about the schema
    pub fn public_message(&self) -> &'static str {
        match self {
            FilterErrorCode::InvalidPredicateShape => "filter is not a valid predicate",
            FilterErrorCode::UnknownField => "filter references an unknown field",
            FilterErrorCode::DisallowedField => "filter references a field that cannot be filtered",
            FilterErrorCode::UnresolvedVirtualField => "filter references an unavailable field",
            FilterErrorCode::UnsupportedOperator => "filter uses an unsupported operator",
            FilterErrorCode::TypeMismatch => "filter argument has the wrong type",
            FilterErrorCode::EmptyPath => "filter path is empty",
            FilterErrorCode::AmbiguousBinding => "query binding conflict",
        }
    }

    /// True when the caller's input, not the caller's code, is at fault
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            FilterErrorCode::UnresolvedVirtualField | FilterErrorCode::AmbiguousBinding
        )
    }
}

impl fmt::Display for FilterErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Filter compile error with the predicate fragment that caused it
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct FilterError {
    code: FilterErrorCode,
    message: String,
    fragment: Option<Value>,
}

impl FilterError {
    fn new(code: FilterErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            fragment: None,
        }
    }

    pub fn invalid_shape(reason: impl Into<String>, fragment: &Value) -> Self {
        Self {
            code: FilterErrorCode::InvalidPredicateShape,
            message: reason.into(),
            fragment: Some(fragment.clone()),
        }
    }

    pub fn unknown_field(segment: &str, entity: &str) -> Self {
        Self::new(
            FilterErrorCode::UnknownField,
            format!("'{}' is not a field or association of '{}'", segment, entity),
        )
    }

    pub fn unknown_entity(source: &str) -> Self {
        Self::new(
            FilterErrorCode::UnknownField,
            format!("Query source '{}' is not a registered entity", source),
        )
    }

    pub fn disallowed_field(segment: &str, entity: &str, reason: &str) -> Self {
        Self::new(
            FilterErrorCode::DisallowedField,
            format!("'{}.{}' cannot be filtered on: {}", entity, segment, reason),
        )
    }

    pub fn unresolved_virtual_field(field: &str, entity: &str) -> Self {
        Self::new(
            FilterErrorCode::UnresolvedVirtualField,
            format!("Virtual field '{}.{}' has no resolver", entity, field),
        )
    }

    pub fn unsupported_operator(op: &str, kind: TargetKind) -> Self {
        Self::new(
            FilterErrorCode::UnsupportedOperator,
            format!("Operator '{}' is not supported on {} targets", op, kind.as_str()),
        )
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::new(FilterErrorCode::UnsupportedOperator, reason.into())
    }

    pub fn type_mismatch(op: &str, expected: &str, actual: &Value) -> Self {
        Self::new(
            FilterErrorCode::TypeMismatch,
            format!(
                "Operator '{}' expects {}, got {}",
                op,
                expected,
                json_type_name(actual)
            ),
        )
    }

    pub fn empty_path() -> Self {
        Self::new(
            FilterErrorCode::EmptyPath,
            "Path must name at least one field".into(),
        )
    }

    pub fn ambiguous_binding(existing: &str, expected: &str) -> Self {
        Self::new(
            FilterErrorCode::AmbiguousBinding,
            format!(
                "Query is anchored as '{}' but filters bind the root as '{}'",
                existing, expected
            ),
        )
    }

    /// Attaches `predicate` unless a more specific fragment is already set
    pub fn with_fragment(mut self, predicate: &Predicate) -> Self {
        if self.fragment.is_none() {
            self.fragment = Some(predicate.to_json());
        }
        self
    }

    /// Attaches `predicate`, replacing any fragment set deeper down
    pub fn replace_fragment(mut self, predicate: &Predicate) -> Self {
        self.fragment = Some(predicate.to_json());
        self
    }

    /// Returns the error code
    pub fn code(&self) -> FilterErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The predicate fragment that failed to compile
    pub fn fragment(&self) -> Option<&Value> {
        self.fragment.as_ref()
    }

    /// Message and fragment, for logs and trusted callers
    pub fn diagnostic(&self) -> String {
        match &self.fragment {
            Some(fragment) => format!("{} in {}", self, fragment),
            None => self.to_string(),
        }
    }

    /// Code plus a schema-free message, for untrusted callers
    pub fn redacted(&self) -> String {
        format!("{}: {}", self.code, self.code.public_message())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Result type for filter compilation
pub type FilterResult<T> = Result<T, FilterError>;
