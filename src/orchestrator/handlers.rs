use super::protocol::*;
use super::registry::{ExpressionRegistry, RegistryError};
use super::types::*;

use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json, extract::Path, http::StatusCode};
use std::sync::Arc;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

pub async fn handle_calculate(
    Extension(registry): Extension<Arc<ExpressionRegistry>>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!("Malformed calculate request: {}", e);
            return error_response(StatusCode::BAD_REQUEST, e.body_text());
        }
    };

    match registry.submit(&req.expression).await {
        Ok(id) => (StatusCode::CREATED, Json(CalculateResponse { id })).into_response(),
        Err(e) => {
            tracing::error!("Failed to add expression {:?}: {}", req.expression, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn handle_get_expressions(
    Extension(registry): Extension<Arc<ExpressionRegistry>>,
) -> Json<Vec<Expression>> {
    Json(registry.get_all().await)
}

pub async fn handle_get_expression(
    Extension(registry): Extension<Arc<ExpressionRegistry>>,
    Path(id): Path<String>,
) -> Response {
    let id = ExpressionId(id);

    match registry.get(&id).await {
        Some(expression) => (StatusCode::OK, Json(expression)).into_response(),
        None => {
            tracing::debug!("Expression not found: {}", id);
            error_response(StatusCode::NOT_FOUND, format!("expression {} not found", id))
        }
    }
}

pub async fn handle_get_task(Extension(registry): Extension<Arc<ExpressionRegistry>>) -> Response {
    match registry.next_task().await {
        Some(task) => (StatusCode::OK, Json(task)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "no task available"),
    }
}

pub async fn handle_post_task_result(
    Extension(registry): Extension<Arc<ExpressionRegistry>>,
    payload: Result<Json<TaskResultRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!("Malformed task result: {}", e);
            return error_response(StatusCode::BAD_REQUEST, e.body_text());
        }
    };

    let outcome = match (&req.error, req.result) {
        (Some(error), _) => registry.report_failure(&req.id, error).await,
        (None, Some(result)) => registry.report_result(&req.id, result, req.seq).await,
        (None, None) => {
            tracing::warn!("Task result for {} carries neither result nor error", req.id);
            return error_response(
                StatusCode::BAD_REQUEST,
                "task result requires `result` or `error`",
            );
        }
    };

    match outcome {
        Ok(status) => {
            tracing::debug!("Result for expression {} recorded ({:?})", req.id, status);
            StatusCode::OK.into_response()
        }
        Err(e @ RegistryError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, e.to_string()),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

pub async fn handle_stats(
    Extension(registry): Extension<Arc<ExpressionRegistry>>,
) -> Json<RegistryStats> {
    Json(registry.stats().await)
}
