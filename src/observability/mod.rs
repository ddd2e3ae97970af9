//! Observability subsystem
//!
//! Structured JSON-line logging of schema loading and filter compilation.
//! Logging is read-only: it never changes what the compiler produces.
//!
//! ```ignore
//! use aerofilter::observability::{Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Trace);
//! Logger::trace(Event::FilterCompiled.as_str(), &[("entity", "post")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
