//! Sample application: `SampleApi` with `ToDo` and `TodoWithCategories` endpoints on
//! the `default` connection.
//!
//! Run from repo root: `cargo run -p sample-api`

use std::sync::Arc;
use stepwise_crud::{
    common_routes_with_ready, endpoint_routes_with_limit, AppState, Application, ApplicationRegistry,
    ConnectionRegistry, EndPoint, LifecycleStage, PgDatabase, Runtime, ServerConfig, TableStep,
};
use tokio::net::TcpListener;

const CONNECTION: &str = "default";

fn sample_application() -> Application {
    Application::new("SampleApi", env!("CARGO_PKG_VERSION"), LifecycleStage::Development)
        .endpoint(EndPoint::new("ToDo").step(TableStep::new("todo", CONNECTION)))
        .endpoint(
            EndPoint::new("TodoWithCategories")
                .step(TableStep::new("todo_with_categories", CONNECTION)),
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stepwise_crud=info,sample_api=info")),
        )
        .init();

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    let mut connections = ConnectionRegistry::new();
    connections.register(CONNECTION, Arc::new(PgDatabase::new(pool)));

    let mut applications = ApplicationRegistry::new();
    applications.register(sample_application(), Some(&connections))?;

    let state = AppState::new(Runtime::new(connections), applications);
    let app = common_routes_with_ready(state.clone()).merge(endpoint_routes_with_limit(state, config.max_body_bytes));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("SampleApi listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
