//! Processing units of a chain. The set is closed: a no-op unit and the table-bound
//! CRUD executor, dispatched here by variant.

use crate::chain::SharedContext;
use crate::config::require_non_empty;
use crate::error::{AppError, ConfigError};
use crate::request::RequestModel;
use crate::runtime::Runtime;
use crate::service::TableStep;

#[derive(Clone, Debug)]
pub struct NoopStep {
    pub name: String,
}

impl NoopStep {
    pub fn new(name: impl Into<String>) -> Self {
        NoopStep { name: name.into() }
    }
}

#[derive(Clone, Debug)]
pub enum Step {
    Noop(NoopStep),
    Table(TableStep),
}

impl From<NoopStep> for Step {
    fn from(step: NoopStep) -> Self {
        Step::Noop(step)
    }
}

impl From<TableStep> for Step {
    fn from(step: TableStep) -> Self {
        Step::Table(step)
    }
}

impl Step {
    pub fn name(&self) -> &str {
        match self {
            Step::Noop(s) => &s.name,
            Step::Table(s) => s.name(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Step::Noop(s) => require_non_empty(&s.name, "NoopStep", "name"),
            Step::Table(s) => s.validate(),
        }
    }

    pub(crate) async fn initialize(&self, context: &mut SharedContext, runtime: &Runtime) -> Result<(), AppError> {
        match self {
            Step::Noop(_) => Ok(()),
            Step::Table(s) => s.initialize(context, runtime).await,
        }
    }

    pub(crate) async fn handle(
        &self,
        model: &mut RequestModel,
        context: &mut SharedContext,
        runtime: &Runtime,
    ) -> Result<(), AppError> {
        match self {
            Step::Noop(_) => Ok(()),
            Step::Table(s) => s.handle(model, context, runtime).await,
        }
    }

    pub(crate) async fn terminate(&self, context: &mut SharedContext, failure: Option<&AppError>) -> Result<(), AppError> {
        match self {
            Step::Noop(_) => Ok(()),
            Step::Table(s) => s.terminate(context, failure).await,
        }
    }
}
