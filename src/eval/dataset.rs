//! In-memory tables
//!
//! A dataset is a JSON object mapping table names to arrays of row objects:
//!
//! ```json
//! {"users": [{"id": 1, "name": "ann"}], "posts": []}
//! ```
//!
//! Missing keys in a row read as NULL.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use super::errors::{EvalError, EvalResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    tables: BTreeMap<String, Vec<Value>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dataset from its JSON form; every row must be an object
    pub fn from_json(value: Value) -> EvalResult<Self> {
        let Value::Object(tables) = value else {
            return Err(EvalError::Dataset(
                "dataset must be an object of tables".into(),
            ));
        };

        let mut dataset = Self::new();
        for (name, rows) in tables {
            let Value::Array(rows) = rows else {
                return Err(EvalError::Dataset(format!(
                    "table '{}' must be an array of rows",
                    name
                )));
            };
            if rows.iter().any(|row| !row.is_object()) {
                return Err(EvalError::Dataset(format!(
                    "table '{}' contains a row that is not an object",
                    name
                )));
            }
            dataset.tables.insert(name, rows);
        }
        Ok(dataset)
    }

    pub fn load(path: &Path) -> EvalResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(serde_json::from_str(&content)?)
    }

    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Value>) -> Self {
        self.tables.insert(name.into(), rows);
        self
    }

    pub fn insert(&mut self, table: &str, row: Value) {
        self.tables.entry(table.to_string()).or_default().push(row);
    }

    pub fn table(&self, name: &str) -> EvalResult<&[Value]> {
        self.tables
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| EvalError::UnknownTable(name.to_string()))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}
