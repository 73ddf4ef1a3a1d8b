//! Entity loader
//!
//! Reads entity definitions (`*.json`, one entity per file) from a
//! directory and keeps the built entities by name. Malformed files and
//! construction errors fail the load; nothing is skipped silently.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::entity::{Entity, EntityDefinition};
use super::errors::{SchemaError, SchemaResult};
use crate::observability::Event;
use crate::types::TypeRegistry;

/// Reads and builds one definition file.
pub fn load_entity(path: &Path, types: &TypeRegistry) -> SchemaResult<Entity> {
    let location = path.display().to_string();
    let content = fs::read_to_string(path)
        .map_err(|e| SchemaError::malformed(&location, format!("Failed to read file: {}", e)))?;
    parse_entity(&content, &location, types)
}

/// Builds an entity from definition JSON text.
pub fn parse_entity(content: &str, location: &str, types: &TypeRegistry) -> SchemaResult<Entity> {
    let definition: EntityDefinition = serde_json::from_str(content)
        .map_err(|e| SchemaError::malformed(location, format!("Invalid JSON: {}", e)))?;
    definition.build(types)
}

/// Directory-backed set of entities
pub struct EntityLoader {
    dir: PathBuf,
    types: Arc<TypeRegistry>,
    entities: BTreeMap<String, Arc<Entity>>,
}

impl EntityLoader {
    pub fn new(dir: impl Into<PathBuf>, types: Arc<TypeRegistry>) -> Self {
        Self {
            dir: dir.into(),
            types,
            entities: BTreeMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads every `.json` file in the directory. A missing directory
    /// loads nothing.
    pub fn load_all(&mut self) -> SchemaResult<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let location = self.dir.display().to_string();
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            SchemaError::malformed(&location, format!("Failed to read directory: {}", e))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed(&location, format!("Failed to read directory entry: {}", e))
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        // Deterministic order so duplicate-name errors are reproducible
        paths.sort();

        for path in &paths {
            let entity = load_entity(path, &self.types)?;
            self.register(entity)?;
        }

        tracing::info!(
            event = %Event::EntitiesLoaded,
            dir = %location,
            count = paths.len(),
            "entity definitions loaded"
        );
        Ok(paths.len())
    }

    /// Adds an entity built elsewhere. Names are unique.
    pub fn register(&mut self, entity: Entity) -> SchemaResult<Arc<Entity>> {
        if self.entities.contains_key(entity.name()) {
            return Err(SchemaError::malformed(
                entity.name(),
                "an entity with this name is already registered",
            ));
        }
        let entity = Arc::new(entity);
        self.entities
            .insert(entity.name().to_string(), Arc::clone(&entity));
        Ok(entity)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Entity>> {
        self.entities.get(name).cloned()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Arc<Entity>> {
        self.entities.values()
    }

    pub fn count(&self) -> usize {
        self.entities.len()
    }
}
