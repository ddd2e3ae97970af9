//! Compiler configuration
//!
//! Loaded from a JSON file. Every key is optional:
//!
//! ```json
//! {
//!   "tenant_context_key": "tenant",
//!   "precision_types": ["utc_datetime", "naive_datetime"],
//!   "log_level": "warn"
//! }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{Event, Logger, Severity};
use crate::schema::FieldType;

/// Configuration errors, all fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("AERO_CONFIG_IO: failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("AERO_CONFIG_PARSE: invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("AERO_CONFIG_INVALID: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Context key holding the tenant identifier
    #[serde(default = "default_tenant_context_key")]
    pub tenant_context_key: String,

    /// Field type names whose arguments are cast before comparison
    #[serde(default = "default_precision_types")]
    pub precision_types: BTreeSet<String>,

    /// Minimum log severity: trace, info, warn or error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_tenant_context_key() -> String {
    "tenant".to_string()
}

fn default_precision_types() -> BTreeSet<String> {
    [
        "utc_datetime",
        "utc_datetime_usec",
        "naive_datetime",
        "naive_datetime_usec",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            tenant_context_key: default_tenant_context_key(),
            precision_types: default_precision_types(),
            log_level: default_log_level(),
        }
    }
}

/// Type names a precision cast may be configured for
const CASTABLE_TYPES: [&str; 6] = [
    "date",
    "time",
    "naive_datetime",
    "naive_datetime_usec",
    "utc_datetime",
    "utc_datetime_usec",
];

impl CompilerConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config: CompilerConfig = serde_json::from_str(&content)?;
        config.validate()?;

        Logger::info(
            Event::ConfigLoaded.as_str(),
            &[
                ("path", &path.display().to_string()),
                ("tenant_context_key", &config.tenant_context_key),
            ],
        );

        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.tenant_context_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "tenant_context_key must not be empty".into(),
            ));
        }

        if let Some(bad) = self
            .precision_types
            .iter()
            .find(|t| !CASTABLE_TYPES.contains(&t.as_str()))
        {
            return Err(ConfigError::Invalid(format!(
                "precision_types: '{}' is not a temporal type",
                bad
            )));
        }

        self.log_level
            .parse::<Severity>()
            .map_err(ConfigError::Invalid)?;

        Ok(())
    }

    /// Parsed log level; WARN if the configured one is invalid
    pub fn severity(&self) -> Severity {
        self.log_level.parse().unwrap_or(Severity::Warn)
    }

    /// Applies the configured log level process-wide
    pub fn apply_logging(&self) {
        Logger::set_min_severity(self.severity());
    }

    pub fn is_precision_type(&self, field_type: &FieldType) -> bool {
        self.precision_types.contains(field_type.type_name())
    }
}
