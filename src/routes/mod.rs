//! Routers: endpoint dispatch and the common health/readiness/version routes.

mod common;
mod endpoint;

pub use common::{common_routes, common_routes_with_ready};
pub use endpoint::{endpoint_routes, endpoint_routes_with_limit};
