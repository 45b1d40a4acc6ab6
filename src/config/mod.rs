//! Application assembly and server settings.

mod application;
mod registry;
mod server;
mod validator;

pub use application::{Application, LifecycleStage};
pub use registry::ApplicationRegistry;
pub use server::{ServerConfig, DEFAULT_BIND_ADDR, DEFAULT_DATABASE_URL, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_CONNECTIONS};
pub use validator::{is_valid_version, require_identifier, require_non_empty, validate_application};
