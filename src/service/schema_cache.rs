//! Columns per (connection, table), introspected once and kept for the process lifetime.
//!
//! Concurrent first lookups may each run the catalog query; the last writer wins.
//! The lock is never held across the query, and every racer stores the same list.

use crate::db::Transaction;
use crate::error::AppError;
use crate::sql::{self, Column, Dialect};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

type CacheKey = (String, String);

#[derive(Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<CacheKey, Arc<Vec<Column>>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        SchemaCache::default()
    }

    pub fn cached(&self, connection: &str, table: &str) -> Option<Arc<Vec<Column>>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&(connection.to_string(), table.to_string())).cloned()
    }

    /// Cached column list, or introspect through `tx` and store it. Each catalog row
    /// carries the column name first and, optionally, its type name second.
    pub async fn columns(
        &self,
        connection: &str,
        table: &str,
        dialect: Dialect,
        tx: &mut dyn Transaction,
    ) -> Result<Arc<Vec<Column>>, AppError> {
        if let Some(columns) = self.cached(connection, table) {
            return Ok(columns);
        }

        let rows = tx.fetch_all(&sql::columns(dialect, table)).await?;
        let columns: Vec<Column> = rows
            .into_iter()
            .filter_map(|row| {
                let mut values = row.into_iter().map(|(_, v)| v);
                let name = values.next()?.as_str()?.to_string();
                let data_type = values.next().and_then(|v| v.as_str().map(str::to_string));
                Some(Column { name, data_type })
            })
            .collect();
        tracing::debug!(connection, table, columns = ?columns, "introspected table columns");

        let columns = Arc::new(columns);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert((connection.to_string(), table.to_string()), Arc::clone(&columns));
        Ok(columns)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
