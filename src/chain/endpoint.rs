//! EndPoint: a named, routed sequence of steps run against one request model.

use crate::chain::{SharedContext, Step};
use crate::config::require_non_empty;
use crate::error::{AppError, ConfigError};
use crate::request::RequestModel;
use crate::runtime::Runtime;

/// Phases of one chain execution, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainPhase {
    Initializing,
    Handling,
    Terminating,
    Done,
}

#[derive(Clone, Debug)]
pub struct EndPoint {
    name: String,
    route: Option<String>,
    steps: Vec<Step>,
}

impl EndPoint {
    pub fn new(name: impl Into<String>) -> Self {
        EndPoint {
            name: name.into(),
            route: None,
            steps: Vec::new(),
        }
    }

    /// Explicit route segment; stored lower-cased.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into().to_lowercase());
        self
    }

    pub fn step(mut self, step: impl Into<Step>) -> Self {
        self.steps.push(step.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Route segment: the explicit route, else the lower-cased name.
    pub fn route(&self) -> String {
        self.route.clone().unwrap_or_else(|| self.name.to_lowercase())
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.name, "EndPoint", "name")?;
        if self.steps.is_empty() {
            return Err(ConfigError::Validation(format!("EndPoint.steps of '{}' should not be empty", self.name)));
        }
        for step in &self.steps {
            step.validate()?;
        }
        Ok(())
    }

    /// Run the chain: initialize every step, handle in order until the first failure,
    /// then terminate every initialized step with that failure (or none). The failure,
    /// if any, is returned after termination.
    pub async fn execute(&self, model: &mut RequestModel, runtime: &Runtime) -> Result<(), AppError> {
        let mut context = SharedContext::new();
        let mut failure: Option<AppError> = None;
        let mut initialized = 0;

        tracing::debug!(endpoint = %self.name, phase = ?ChainPhase::Initializing, intent = ?model.intent(), "chain");
        for step in &self.steps {
            if let Err(e) = step.initialize(&mut context, runtime).await {
                tracing::warn!(endpoint = %self.name, step = step.name(), error = %e, "initialization failed");
                failure = Some(e);
                break;
            }
            initialized += 1;
        }

        if failure.is_none() {
            tracing::debug!(endpoint = %self.name, phase = ?ChainPhase::Handling, "chain");
            for step in &self.steps {
                if let Err(e) = step.handle(model, &mut context, runtime).await {
                    tracing::warn!(endpoint = %self.name, step = step.name(), error = %e, "handling failed");
                    failure = Some(e);
                    break;
                }
            }
        }

        tracing::debug!(endpoint = %self.name, phase = ?ChainPhase::Terminating, "chain");
        for step in &self.steps[..initialized] {
            if let Err(e) = step.terminate(&mut context, failure.as_ref()).await {
                tracing::error!(endpoint = %self.name, step = step.name(), error = %e, "termination failed");
                if failure.is_none() {
                    failure = Some(e);
                }
            }
        }

        tracing::debug!(endpoint = %self.name, phase = ?ChainPhase::Done, failed = failure.is_some(), "chain");
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
