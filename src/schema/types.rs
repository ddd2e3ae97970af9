//! Field type definitions
//!
//! Supported types:
//! - scalar: string, int, float, decimal, bool, uuid
//! - temporal: date, time, naive/utc datetimes (second or microsecond precision)
//! - map: semi-structured JSON value, addressable by nested key paths
//! - array: homogeneous array with element type

use serde::{Deserialize, Serialize};

/// Declared type of a stored or virtual field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Arbitrary precision decimal
    Decimal,
    /// Boolean
    Bool,
    /// RFC 4122 identifier
    Uuid,
    /// Calendar date
    Date,
    /// Time of day
    Time,
    /// Timestamp without zone, second precision
    NaiveDatetime,
    /// Timestamp without zone, microsecond precision
    NaiveDatetimeUsec,
    /// UTC timestamp, second precision
    UtcDatetime,
    /// UTC timestamp, microsecond precision
    UtcDatetimeUsec,
    /// Semi-structured JSON value
    Map,
    /// Homogeneous array with single element type
    Array {
        /// Element type (boxed to allow recursive types)
        element_type: Box<FieldType>,
    },
}

impl FieldType {
    /// Shorthand for an array type
    pub fn array_of(element_type: FieldType) -> Self {
        FieldType::Array {
            element_type: Box::new(element_type),
        }
    }

    /// Returns the type name used in configuration and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Decimal => "decimal",
            FieldType::Bool => "bool",
            FieldType::Uuid => "uuid",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::NaiveDatetime => "naive_datetime",
            FieldType::NaiveDatetimeUsec => "naive_datetime_usec",
            FieldType::UtcDatetime => "utc_datetime",
            FieldType::UtcDatetimeUsec => "utc_datetime_usec",
            FieldType::Map => "map",
            FieldType::Array { .. } => "array",
        }
    }

    /// PostgreSQL type used when an argument is cast to this type
    pub fn sql_type(&self) -> String {
        match self {
            FieldType::String => "text".into(),
            FieldType::Int => "bigint".into(),
            FieldType::Float => "double precision".into(),
            FieldType::Decimal => "numeric".into(),
            FieldType::Bool => "boolean".into(),
            FieldType::Uuid => "uuid".into(),
            FieldType::Date => "date".into(),
            FieldType::Time => "time".into(),
            FieldType::NaiveDatetime => "timestamp(0)".into(),
            FieldType::NaiveDatetimeUsec => "timestamp".into(),
            FieldType::UtcDatetime => "timestamptz(0)".into(),
            FieldType::UtcDatetimeUsec => "timestamptz".into(),
            FieldType::Map => "jsonb".into(),
            FieldType::Array { element_type } => format!("{}[]", element_type.sql_type()),
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, FieldType::Map)
    }

    /// Element type when this is an array
    pub fn element_type(&self) -> Option<&FieldType> {
        match self {
            FieldType::Array { element_type } => Some(element_type),
            _ => None,
        }
    }

    /// True for arrays whose elements are maps
    pub fn is_array_of_maps(&self) -> bool {
        self.element_type().is_some_and(FieldType::is_map)
    }

    /// True for datetime types that carry a timestamp precision
    pub fn is_datetime(&self) -> bool {
        matches!(
            self,
            FieldType::NaiveDatetime
                | FieldType::NaiveDatetimeUsec
                | FieldType::UtcDatetime
                | FieldType::UtcDatetimeUsec
        )
    }
}
