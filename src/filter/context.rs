//! Compile context threaded through predicate compilation
//!
//! Two kinds of state live here: the caller's key/value bag (tenant id and
//! anything virtual field resolvers want to read) and scope flags that only the
//! compiler sets. Contexts are never mutated in place; entering a sub-query
//! produces an extended copy and the caller's bag is shared, not cloned.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileContext {
    values: Arc<BTreeMap<String, Value>>,
    binding: Option<String>,
    depth: usize,
    in_json_array: bool,
    binding_prefix: String,
}

const BINDING_PREFIX: &str = "s";

impl CompileContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: BTreeMap<String, Value>) -> Self {
        Self {
            values: Arc::new(values),
            ..Self::default()
        }
    }

    /// Context extended with one caller value
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        Arc::make_mut(&mut self.values).insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Binding of the row currently being filtered
    pub fn binding(&self) -> Option<&str> {
        self.binding.as_deref()
    }

    /// Number of sub-queries between the root and the current scope
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// True while compiling against elements of a JSON array
    pub fn in_json_array(&self) -> bool {
        self.in_json_array
    }

    /// Context for the root row of a query anchored as `binding`.
    ///
    /// Sub-query bindings are `<prefix><depth>`; the prefix is lengthened with
    /// `_` until no generated name can equal the root anchor.
    pub(crate) fn rooted(&self, binding: &str) -> Self {
        let mut prefix = BINDING_PREFIX.to_string();
        while is_generated_binding(binding, &prefix) {
            prefix.push('_');
        }

        Self {
            values: Arc::clone(&self.values),
            binding: Some(binding.to_string()),
            depth: 0,
            in_json_array: false,
            binding_prefix: prefix,
        }
    }

    pub(crate) fn scoped(&self, binding: &str, in_json_array: bool) -> Self {
        Self {
            values: Arc::clone(&self.values),
            binding: Some(binding.to_string()),
            depth: self.depth + 1,
            in_json_array,
            binding_prefix: self.binding_prefix.clone(),
        }
    }

    /// Binding name for the next nested sub-query
    pub(crate) fn next_binding(&self) -> String {
        let prefix = if self.binding_prefix.is_empty() {
            BINDING_PREFIX
        } else {
            &self.binding_prefix
        };
        format!("{}{}", prefix, self.depth + 1)
    }
}

fn is_generated_binding(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .map_or(false, |n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}
