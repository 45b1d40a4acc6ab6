//! Storage boundary: a database hands out transactions, a transaction runs statements.

mod postgres;
mod registry;

pub use postgres::PgDatabase;
pub use registry::ConnectionRegistry;

use crate::error::AppError;
use crate::sql::{Dialect, Statement};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One result row: column name to value, in result-set order.
pub type Row = Map<String, Value>;

#[async_trait]
pub trait Database: Send + Sync {
    fn dialect(&self) -> Dialect;

    async fn begin(&self) -> Result<Box<dyn Transaction>, AppError>;

    /// Cheap round trip used by readiness checks.
    async fn ping(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait Transaction: Send {
    async fn fetch_all(&mut self, statement: &Statement) -> Result<Vec<Row>, AppError>;

    /// Run a statement that returns no rows; yields the affected-row count.
    async fn execute(&mut self, statement: &Statement) -> Result<u64, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}
