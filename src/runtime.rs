//! Services every chain execution reads: the connection registry and the schema cache.

use crate::db::ConnectionRegistry;
use crate::service::SchemaCache;

#[derive(Default)]
pub struct Runtime {
    pub connections: ConnectionRegistry,
    pub schema_cache: SchemaCache,
}

impl Runtime {
    pub fn new(connections: ConnectionRegistry) -> Self {
        Runtime {
            connections,
            schema_cache: SchemaCache::new(),
        }
    }
}
