use super::config::OrchestratorConfig;
use super::handlers::*;
use super::protocol::*;
use super::registry::ExpressionRegistry;

use axum::{
    Router,
    extract::Extension,
    routing::get,
    routing::post,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builds the orchestrator HTTP surface on top of `registry`.
pub fn router(registry: Arc<ExpressionRegistry>) -> Router {
    Router::new()
        .route(ENDPOINT_CALCULATE, post(handle_calculate))
        .route(ENDPOINT_EXPRESSIONS, get(handle_get_expressions))
        .route(ENDPOINT_EXPRESSION_BY_ID, get(handle_get_expression))
        .route(
            ENDPOINT_INTERNAL_TASK,
            get(handle_get_task).post(handle_post_task_result),
        )
        .route(ENDPOINT_INTERNAL_STATS, get(handle_stats))
        .layer(Extension(registry))
}

/// Serves the orchestrator until `shutdown` is cancelled.
pub async fn serve(config: OrchestratorConfig, shutdown: CancellationToken) -> anyhow::Result<()> {
    let registry = Arc::new(ExpressionRegistry::new(config.operation_time));
    let app = router(registry);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Orchestrator listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Orchestrator stopped");
    Ok(())
}
