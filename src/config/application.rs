//! Application: a named, versioned group of endpoints.

use crate::chain::EndPoint;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleStage {
    #[default]
    Undefined,
    Development,
    Testing,
    Staging,
    Production,
}

#[derive(Clone, Debug)]
pub struct Application {
    pub name: String,
    pub version: String,
    pub lifecycle_stage: LifecycleStage,
    pub endpoints: Vec<EndPoint>,
}

impl Application {
    pub fn new(name: impl Into<String>, version: impl Into<String>, lifecycle_stage: LifecycleStage) -> Self {
        Application {
            name: name.into(),
            version: version.into(),
            lifecycle_stage,
            endpoints: Vec::new(),
        }
    }

    pub fn endpoint(mut self, endpoint: EndPoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Endpoint whose route matches `route`, ignoring case.
    pub fn find_endpoint(&self, route: &str) -> Option<&EndPoint> {
        let route = route.to_lowercase();
        self.endpoints.iter().find(|e| e.route() == route)
    }
}
