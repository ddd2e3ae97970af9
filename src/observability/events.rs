//! Observable events
//!
//! Every log line names one of these events.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Schema file read into the registry builder
    SchemaLoaded,
    /// Compiler configuration loaded
    ConfigLoaded,
    /// Predicate compiled into a filter expression
    FilterCompiled,
    /// Predicate rejected with a compile error
    FilterRejected,
    /// `contains` on a non-JSON target fell back to substring matching
    ContainsFallback,
    /// Filter attached to a base query
    QueryBound,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::FilterCompiled => "FILTER_COMPILED",
            Event::FilterRejected => "FILTER_REJECTED",
            Event::ContainsFallback => "FILTER_CONTAINS_FALLBACK",
            Event::QueryBound => "QUERY_BOUND",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
