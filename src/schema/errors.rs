//! Schema registration error types
//!
//! Error codes:
//! - AERO_SCHEMA_DUPLICATE_ENTITY (REJECT)
//! - AERO_SCHEMA_DUPLICATE_FIELD (REJECT)
//! - AERO_SCHEMA_UNKNOWN_ENTITY (REJECT)
//! - AERO_SCHEMA_UNKNOWN_FIELD (REJECT)
//! - AERO_SCHEMA_UNKNOWN_TARGET (REJECT)
//! - AERO_SCHEMA_MISSING_KEY (REJECT)
//! - AERO_SCHEMA_MALFORMED (FATAL)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Registration request rejected
    Reject,
    /// Schema files on disk are unusable
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Two entities registered under one name
    AeroSchemaDuplicateEntity,
    /// One name used by two of stored field, virtual field, association
    AeroSchemaDuplicateField,
    /// Entity name not registered
    AeroSchemaUnknownEntity,
    /// Field name not declared on the entity
    AeroSchemaUnknownField,
    /// Association points at an unregistered entity
    AeroSchemaUnknownTarget,
    /// Join, tenant or primary key column is not a stored field
    AeroSchemaMissingKey,
    /// Schema file unreadable or not valid JSON
    AeroSchemaMalformed,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::AeroSchemaDuplicateEntity => "AERO_SCHEMA_DUPLICATE_ENTITY",
            SchemaErrorCode::AeroSchemaDuplicateField => "AERO_SCHEMA_DUPLICATE_FIELD",
            SchemaErrorCode::AeroSchemaUnknownEntity => "AERO_SCHEMA_UNKNOWN_ENTITY",
            SchemaErrorCode::AeroSchemaUnknownField => "AERO_SCHEMA_UNKNOWN_FIELD",
            SchemaErrorCode::AeroSchemaUnknownTarget => "AERO_SCHEMA_UNKNOWN_TARGET",
            SchemaErrorCode::AeroSchemaMissingKey => "AERO_SCHEMA_MISSING_KEY",
            SchemaErrorCode::AeroSchemaMalformed => "AERO_SCHEMA_MALFORMED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::AeroSchemaMalformed => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    entity: Option<String>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: String, entity: Option<String>) -> Self {
        Self {
            code,
            message,
            entity,
        }
    }

    pub fn duplicate_entity(entity: impl Into<String>) -> Self {
        let e = entity.into();
        Self::new(
            SchemaErrorCode::AeroSchemaDuplicateEntity,
            format!("Entity '{}' is registered twice", e),
            Some(e),
        )
    }

    pub fn duplicate_field(entity: impl Into<String>, field: &str) -> Self {
        let e = entity.into();
        Self::new(
            SchemaErrorCode::AeroSchemaDuplicateField,
            format!("Entity '{}' declares '{}' more than once", e, field),
            Some(e),
        )
    }

    pub fn unknown_entity(entity: impl Into<String>) -> Self {
        let e = entity.into();
        Self::new(
            SchemaErrorCode::AeroSchemaUnknownEntity,
            format!("Entity '{}' is not registered", e),
            Some(e),
        )
    }

    pub fn unknown_field(entity: impl Into<String>, field: &str) -> Self {
        let e = entity.into();
        Self::new(
            SchemaErrorCode::AeroSchemaUnknownField,
            format!("Entity '{}' has no virtual field '{}'", e, field),
            Some(e),
        )
    }

    pub fn unknown_target(entity: impl Into<String>, association: &str, target: &str) -> Self {
        let e = entity.into();
        Self::new(
            SchemaErrorCode::AeroSchemaUnknownTarget,
            format!(
                "Association '{}.{}' targets unregistered entity '{}'",
                e, association, target
            ),
            Some(e),
        )
    }

    pub fn missing_key(entity: impl Into<String>, key: &str, role: &str) -> Self {
        let e = entity.into();
        Self::new(
            SchemaErrorCode::AeroSchemaMissingKey,
            format!("{} '{}' is not a stored field of '{}'", role, key, e),
            Some(e),
        )
    }

    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::AeroSchemaMalformed,
            format!("{}: {}", path.into(), reason.into()),
            None,
        )
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the entity name if applicable
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
