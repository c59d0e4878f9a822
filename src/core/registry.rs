//! Process-wide schema registry
//!
//! Every schema built through [`SchemaBuilder`](super::SchemaBuilder) lands
//! here so that [`Database::create_all`](super::Database::create_all) can
//! create all tables at once. The registry starts empty at process start and
//! has no unregister operation. Entries are keyed by schema name: declaring a
//! schema again under the same name replaces the earlier entry in place.

use super::schema::Schema;
use parking_lot::RwLock;
use std::sync::{Arc, LazyLock};

static SCHEMAS: LazyLock<RwLock<Vec<Arc<Schema>>>> = LazyLock::new(|| RwLock::new(Vec::new()));

pub(crate) fn register(schema: Arc<Schema>) {
    let mut schemas = SCHEMAS.write();
    match schemas.iter().position(|s| s.name() == schema.name()) {
        Some(index) => schemas[index] = schema,
        None => {
            tracing::debug!("Registered schema {} (table {})", schema.name(), schema.table_name());
            schemas.push(schema);
        }
    }
}

/// Snapshot of all registered schemas, in registration order
pub fn registered() -> Vec<Arc<Schema>> {
    SCHEMAS.read().clone()
}

/// Registered schema with the given name
pub fn lookup(name: &str) -> Option<Arc<Schema>> {
    SCHEMAS.read().iter().find(|s| s.name() == name).cloned()
}
