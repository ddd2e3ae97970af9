//! Schema loader for entity definitions stored as JSON
//!
//! A schema file holds either a single entity object, an array of entities,
//! or `{"entities": [...]}`. Directories are read in file-name order so the
//! resulting entity ids are stable across runs. Virtual field resolvers cannot
//! be expressed in JSON; bind them through [`SchemaLoader::builder_mut`] before
//! calling [`SchemaLoader::finish`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::observability::{Event, Logger};

use super::descriptor::{EntityDef, SchemaRegistry, SchemaRegistryBuilder};
use super::errors::{SchemaError, SchemaResult};

#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaFile {
    Wrapped { entities: Vec<EntityDef> },
    Many(Vec<EntityDef>),
    One(EntityDef),
}

impl SchemaFile {
    fn into_entities(self) -> Vec<EntityDef> {
        match self {
            SchemaFile::Wrapped { entities } | SchemaFile::Many(entities) => entities,
            SchemaFile::One(entity) => vec![entity],
        }
    }
}

/// Reads entity definitions from disk into a registry builder
#[derive(Debug, Default)]
pub struct SchemaLoader {
    builder: SchemaRegistryBuilder,
    loaded: Vec<PathBuf>,
}

impl SchemaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a schema file, or every `.json` file of a directory
    pub fn load_path(&mut self, path: &Path) -> SchemaResult<()> {
        if path.is_dir() {
            self.load_dir(path)
        } else {
            self.load_file(path)
        }
    }

    /// Loads all `.json` files in `dir`, sorted by file name
    pub fn load_dir(&mut self, dir: &Path) -> SchemaResult<()> {
        let entries = fs::read_dir(dir).map_err(|e| {
            SchemaError::malformed(
                dir.display().to_string(),
                format!("Failed to read schema directory: {}", e),
            )
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed(
                    dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();

            // Skip non-JSON files
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            files.push(path);
        }
        files.sort();

        for file in files {
            self.load_file(&file)?;
        }
        Ok(())
    }

    /// Loads a single schema file
    pub fn load_file(&mut self, path: &Path) -> SchemaResult<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let file: SchemaFile = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        let entities = file.into_entities();
        let count = entities.len().to_string();
        for entity in entities {
            self.builder.add_entity(entity);
        }

        Logger::info(
            Event::SchemaLoaded.as_str(),
            &[("path", &path.display().to_string()), ("entities", &count)],
        );
        self.loaded.push(path.to_path_buf());
        Ok(())
    }

    /// Files loaded so far, in load order
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded
    }

    /// Access to the pending builder, e.g. to bind resolvers
    pub fn builder_mut(&mut self) -> &mut SchemaRegistryBuilder {
        &mut self.builder
    }

    /// Validates and freezes everything loaded
    pub fn finish(self) -> SchemaResult<SchemaRegistry> {
        self.builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaErrorCode;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, value: serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_load_dir_accepts_all_file_shapes() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "a_users.json",
            json!({"name": "user", "fields": {"id": {"type": "int"}}}),
        );
        write(
            tmp.path(),
            "b_posts.json",
            json!([{"name": "post", "fields": {"id": {"type": "int"}}}]),
        );
        write(
            tmp.path(),
            "c_tags.json",
            json!({"entities": [{"name": "tag", "fields": {"id": {"type": "int"}}}]}),
        );
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let mut loader = SchemaLoader::new();
        loader.load_path(tmp.path()).unwrap();
        assert_eq!(loader.loaded_files().len(), 3);

        let registry = loader.finish().unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.entity("user").unwrap().id().index(), 0);
        assert_eq!(registry.entity("tag").unwrap().id().index(), 2);
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let mut loader = SchemaLoader::new();
        let err = loader.load_file(&path).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::AeroSchemaMalformed);
    }

    #[test]
    fn test_missing_file_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let mut loader = SchemaLoader::new();
        let err = loader.load_file(&tmp.path().join("nope.json")).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::AeroSchemaMalformed);
    }
}
