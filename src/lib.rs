//! Stepwise CRUD: HTTP endpoints backed by chains of processing steps that share one
//! transaction per connection and turn requests into parameterized SQL.

pub mod case;
pub mod chain;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod request;
pub mod response;
pub mod routes;
pub mod runtime;
pub mod service;
pub mod sql;
pub mod state;

pub use chain::{EndPoint, NoopStep, SharedContext, Step};
pub use config::{Application, ApplicationRegistry, LifecycleStage, ServerConfig};
pub use db::{ConnectionRegistry, Database, PgDatabase, Row, Transaction};
pub use error::{AppError, ConfigError};
pub use request::{Intent, RequestModel, Verb};
pub use response::model_response;
pub use routes::{common_routes, common_routes_with_ready, endpoint_routes, endpoint_routes_with_limit};
pub use runtime::Runtime;
pub use service::{SchemaCache, TableStep};
pub use sql::{Dialect, Statement};
pub use state::AppState;
