//! Scripted in-memory database: records every begin/statement/commit/rollback and
//! answers statements from a queue of prepared replies.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use stepwise_crud::sql::Statement;
use stepwise_crud::{AppError, Database, Dialect, Row, Transaction};

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Begin,
    Query(Statement),
    Execute(Statement),
    Commit,
    Rollback,
}

pub enum Reply {
    Rows(Vec<Row>),
    Affected(u64),
    Fail(&'static str),
}

#[derive(Default)]
struct Script {
    events: Vec<Event>,
    replies: VecDeque<Reply>,
    fail_begin: bool,
    fail_commit: bool,
}

#[derive(Clone)]
pub struct ScriptedDatabase {
    dialect: Dialect,
    script: Arc<Mutex<Script>>,
}

impl ScriptedDatabase {
    pub fn new() -> Self {
        Self::with_dialect(Dialect::SqlServer)
    }

    pub fn with_dialect(dialect: Dialect) -> Self {
        ScriptedDatabase {
            dialect,
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    pub fn reply(&self, reply: Reply) -> &Self {
        self.script.lock().unwrap().replies.push_back(reply);
        self
    }

    pub fn rows(&self, rows: Value) -> &Self {
        let rows = match rows {
            Value::Array(items) => items.into_iter().map(row).collect(),
            other => panic!("rows must be an array, got {}", other),
        };
        self.reply(Reply::Rows(rows))
    }

    pub fn catalog(&self, columns: &[&str]) -> &Self {
        let rows = columns
            .iter()
            .map(|c| {
                let mut r = Map::new();
                r.insert("COLUMN_NAME".into(), Value::String(c.to_string()));
                r
            })
            .collect();
        self.reply(Reply::Rows(rows))
    }

    /// Catalog rows the way PostgreSQL answers them: name and type name.
    pub fn typed_catalog(&self, columns: &[(&str, &str)]) -> &Self {
        let rows = columns
            .iter()
            .map(|(c, t)| {
                let mut r = Map::new();
                r.insert("column_name".into(), Value::String(c.to_string()));
                r.insert("udt_name".into(), Value::String(t.to_string()));
                r
            })
            .collect();
        self.reply(Reply::Rows(rows))
    }

    pub fn affected(&self, n: u64) -> &Self {
        self.reply(Reply::Affected(n))
    }

    pub fn fail(&self, message: &'static str) -> &Self {
        self.reply(Reply::Fail(message))
    }

    pub fn fail_begin(&self) {
        self.script.lock().unwrap().fail_begin = true;
    }

    pub fn fail_commit(&self) {
        self.script.lock().unwrap().fail_commit = true;
    }

    pub fn events(&self) -> Vec<Event> {
        self.script.lock().unwrap().events.clone()
    }

    /// SQL text of every statement, in order.
    pub fn sql(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Query(s) | Event::Execute(s) => Some(s.sql),
                _ => None,
            })
            .collect()
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Query(s) | Event::Execute(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events().iter().filter(|e| *e == wanted).count()
    }

    fn record(&self, event: Event) {
        self.script.lock().unwrap().events.push(event);
    }

    fn next_reply(&self) -> Option<Reply> {
        self.script.lock().unwrap().replies.pop_front()
    }
}

pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("row must be an object, got {}", other),
    }
}

fn storage_error(message: &str) -> AppError {
    AppError::Storage(sqlx::Error::Protocol(message.to_string()))
}

#[async_trait]
impl Database for ScriptedDatabase {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>, AppError> {
        if self.script.lock().unwrap().fail_begin {
            return Err(storage_error("connection refused"));
        }
        self.record(Event::Begin);
        Ok(Box::new(ScriptedTransaction { db: self.clone() }))
    }

    async fn ping(&self) -> Result<(), AppError> {
        if self.script.lock().unwrap().fail_begin {
            return Err(storage_error("connection refused"));
        }
        Ok(())
    }
}

struct ScriptedTransaction {
    db: ScriptedDatabase,
}

#[async_trait]
impl Transaction for ScriptedTransaction {
    async fn fetch_all(&mut self, statement: &Statement) -> Result<Vec<Row>, AppError> {
        self.db.record(Event::Query(statement.clone()));
        match self.db.next_reply() {
            None => Ok(Vec::new()),
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(message)) => Err(storage_error(message)),
            Some(Reply::Affected(_)) => panic!("query answered with an affected-row count: {}", statement.sql),
        }
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64, AppError> {
        self.db.record(Event::Execute(statement.clone()));
        match self.db.next_reply() {
            None => Ok(0),
            Some(Reply::Affected(n)) => Ok(n),
            Some(Reply::Fail(message)) => Err(storage_error(message)),
            Some(Reply::Rows(_)) => panic!("command answered with rows: {}", statement.sql),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        if self.db.script.lock().unwrap().fail_commit {
            return Err(storage_error("commit failed"));
        }
        self.db.record(Event::Commit);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.db.record(Event::Rollback);
        Ok(())
    }
}
