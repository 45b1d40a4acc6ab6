//! Shared application state for all routes.

use crate::config::ApplicationRegistry;
use crate::runtime::Runtime;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<Runtime>,
    pub applications: Arc<ApplicationRegistry>,
}

impl AppState {
    pub fn new(runtime: Runtime, applications: ApplicationRegistry) -> Self {
        AppState {
            runtime: Arc::new(runtime),
            applications: Arc::new(applications),
        }
    }
}
