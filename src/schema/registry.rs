//! Schema registry for cross-schema references
//!
//! URI-reference properties name their target resource type instead of
//! holding the target schema directly. The registry resolves those names
//! lazily at query-build and populate time, which lets two schemas
//! reference each other without construction-order gymnastics.

use super::ResourceSchema;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared map from resource-type name to schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<ResourceSchema>>>>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under its resource-type name. A later
    /// registration under the same name replaces the earlier one.
    pub fn register(&self, schema: Arc<ResourceSchema>) {
        self.inner
            .write()
            .expect("schema registry lock poisoned")
            .insert(schema.resource_type().to_string(), schema);
    }

    /// Look up a schema by resource-type name
    pub fn get(&self, resource_type: &str) -> Option<Arc<ResourceSchema>> {
        self.inner
            .read()
            .expect("schema registry lock poisoned")
            .get(resource_type)
            .cloned()
    }
}
