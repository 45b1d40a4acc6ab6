//! Registered applications, looked up by name and endpoint route.

use crate::chain::EndPoint;
use crate::config::{validate_application, Application};
use crate::db::ConnectionRegistry;
use crate::error::{AppError, ConfigError};
use std::collections::HashMap;

#[derive(Default)]
pub struct ApplicationRegistry {
    by_name: HashMap<String, Application>,
}

impl ApplicationRegistry {
    pub fn new() -> Self {
        ApplicationRegistry::default()
    }

    /// Validate and register. Names are unique ignoring case.
    pub fn register(&mut self, app: Application, connections: Option<&ConnectionRegistry>) -> Result<(), ConfigError> {
        validate_application(&app, connections)?;
        let key = app.name.to_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(ConfigError::Validation(format!("application '{}' already registered", app.name)));
        }
        tracing::info!(
            application = %app.name,
            version = %app.version,
            stage = ?app.lifecycle_stage,
            endpoints = app.endpoints.len(),
            "registered application"
        );
        self.by_name.insert(key, app);
        Ok(())
    }

    pub fn application(&self, name: &str) -> Option<&Application> {
        self.by_name.get(&name.to_lowercase())
    }

    pub fn endpoint(&self, application: &str, route: &str) -> Result<&EndPoint, AppError> {
        let app = self
            .application(application)
            .ok_or_else(|| AppError::NotFound(format!("application '{}'", application)))?;
        app.find_endpoint(route)
            .ok_or_else(|| AppError::NotFound(format!("endpoint '{}/{}'", application, route)))
    }

    pub fn applications(&self) -> impl Iterator<Item = &Application> {
        self.by_name.values()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
