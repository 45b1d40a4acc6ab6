//! Assembly-time validation: required properties, version format, route uniqueness.

use crate::config::{Application, LifecycleStage};
use crate::db::ConnectionRegistry;
use crate::error::ConfigError;
use crate::sql::is_valid_field_name;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+(-(alpha|beta|RC)\.?\d+)?$").expect("static regex"))
}

pub fn is_valid_version(version: &str) -> bool {
    version_regex().is_match(version)
}

pub fn require_non_empty(value: &str, owner: &str, property: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{}.{} should not be empty", owner, property)));
    }
    Ok(())
}

/// The value is used as a SQL identifier and must match `^[a-zA-Z_][a-zA-Z0-9_]*$`.
pub fn require_identifier(value: &str, owner: &str, property: &str) -> Result<(), ConfigError> {
    if !is_valid_field_name(value) {
        return Err(ConfigError::Validation(format!(
            "{}.{} '{}' is not a valid identifier",
            owner, property, value
        )));
    }
    Ok(())
}

/// Validate an application and every endpoint and step in it. When `connections` is
/// given, every table step must refer to a registered connection identifier.
pub fn validate_application(app: &Application, connections: Option<&ConnectionRegistry>) -> Result<(), ConfigError> {
    require_non_empty(&app.name, "Application", "name")?;
    require_non_empty(&app.version, "Application", "version")?;
    if !is_valid_version(&app.version) {
        return Err(ConfigError::Validation(format!(
            "Application.version '{}' of '{}' is not a valid version",
            app.version, app.name
        )));
    }
    if app.lifecycle_stage == LifecycleStage::Undefined {
        return Err(ConfigError::Validation(format!(
            "Application.lifecycleStage of '{}' should be defined",
            app.name
        )));
    }
    if app.endpoints.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Application.endpoints of '{}' should not be empty",
            app.name
        )));
    }

    let mut routes = HashSet::new();
    for endpoint in &app.endpoints {
        endpoint.validate()?;
        let route = endpoint.route();
        if !routes.insert(route.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate route '{}' in application '{}'",
                route, app.name
            )));
        }
        if let Some(connections) = connections {
            for step in endpoint.steps() {
                if let crate::chain::Step::Table(table) = step {
                    if !connections.contains(table.connection()) {
                        return Err(ConfigError::Validation(format!(
                            "step '{}' of endpoint '{}' refers to unknown connection '{}'",
                            table.name(),
                            endpoint.name(),
                            table.connection()
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}
