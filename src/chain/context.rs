//! Transactions shared by the steps of one chain execution, one per connection identifier.
//!
//! The first step to acquire a connection opens the transaction; later steps join it
//! and bump the participant count. Each release drops the count and the last one
//! commits, or rolls back when the chain recorded a failure.

use crate::db::{Database, Transaction};
use crate::error::AppError;
use crate::sql::Dialect;
use std::collections::HashMap;

pub struct SharedTransaction {
    tx: Box<dyn Transaction>,
    dialect: Dialect,
    participants: usize,
}

impl SharedTransaction {
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn participants(&self) -> usize {
        self.participants
    }

    pub fn transaction(&mut self) -> &mut dyn Transaction {
        self.tx.as_mut()
    }
}

#[derive(Default)]
pub struct SharedContext {
    resources: HashMap<String, SharedTransaction>,
}

impl SharedContext {
    pub fn new() -> Self {
        SharedContext::default()
    }

    /// Open a transaction on `database` for `connection`, or join the open one.
    pub async fn acquire(&mut self, connection: &str, database: &dyn Database) -> Result<(), AppError> {
        if let Some(shared) = self.resources.get_mut(connection) {
            shared.participants += 1;
            tracing::debug!(connection, participants = shared.participants, "joined shared transaction");
            return Ok(());
        }
        let tx = database.begin().await?;
        self.resources.insert(
            connection.to_string(),
            SharedTransaction {
                tx,
                dialect: database.dialect(),
                participants: 1,
            },
        );
        tracing::debug!(connection, "opened shared transaction");
        Ok(())
    }

    pub fn get_mut(&mut self, connection: &str) -> Result<&mut SharedTransaction, AppError> {
        self.resources.get_mut(connection).ok_or_else(|| {
            AppError::Config(crate::error::ConfigError::Validation(format!(
                "no shared transaction for connection '{}'",
                connection
            )))
        })
    }

    pub fn participants(&self, connection: &str) -> Option<usize> {
        self.resources.get(connection).map(|s| s.participants)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Leave the transaction; the last participant finalizes it.
    pub async fn release(&mut self, connection: &str, failure: Option<&AppError>) -> Result<(), AppError> {
        let Some(shared) = self.resources.get_mut(connection) else {
            tracing::warn!(connection, "release without a shared transaction");
            return Ok(());
        };
        shared.participants -= 1;
        if shared.participants > 0 {
            return Ok(());
        }
        let Some(shared) = self.resources.remove(connection) else {
            return Ok(());
        };
        match failure {
            Some(err) => {
                tracing::warn!(connection, error = %err, "rolling back shared transaction");
                shared.tx.rollback().await
            }
            None => {
                tracing::debug!(connection, "committing shared transaction");
                shared.tx.commit().await
            }
        }
    }
}
