//! Connection identifiers to database handles.

use crate::db::Database;
use crate::error::{AppError, ConfigError};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    by_id: HashMap<String, Arc<dyn Database>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        ConnectionRegistry {
            by_id: HashMap::new(),
        }
    }

    pub fn register(&mut self, id: impl Into<String>, database: Arc<dyn Database>) {
        self.by_id.insert(id.into(), database);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn Database>, AppError> {
        self.by_id
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigError::Validation(format!("unknown connection '{}'", id)).into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Database>)> {
        self.by_id.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
