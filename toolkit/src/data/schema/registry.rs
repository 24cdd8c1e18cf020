//! Schema registry
//!
//! Thread-safe table of schemas by entity name. Lookups hand out `Arc`s so a
//! schema stays valid while a statement is being built, even if it is
//! replaced concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::EntitySchema;

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<EntitySchema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under `name`, returning the one it replaced
    pub fn register(
        &self,
        name: impl Into<String>,
        schema: EntitySchema,
    ) -> Option<Arc<EntitySchema>> {
        let name = name.into();
        tracing::debug!(entity = %name, table = %schema.table_name, "Registered schema");
        self.schemas.write().insert(name, Arc::new(schema))
    }

    pub fn get(&self, name: &str) -> Option<Arc<EntitySchema>> {
        self.schemas.read().get(name).cloned()
    }

    /// Registered entity names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}

impl FromIterator<(String, EntitySchema)> for SchemaRegistry {
    fn from_iter<I: IntoIterator<Item = (String, EntitySchema)>>(iter: I) -> Self {
        let registry = Self::new();
        for (name, schema) in iter {
            registry.register(name, schema);
        }
        registry
    }
}
