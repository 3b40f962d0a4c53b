//! Orchestrator Module Tests
//!
//! ## Test Scopes
//! - **Registry**: id assignment, FIFO dispatch, status transitions and completion.
//! - **Handlers**: status codes and bodies, invoked directly and over a live listener.
//! - **Types**: wire format of tasks and expressions.

#[cfg(test)]
mod tests {
    use crate::calculator::CalcError;
    use crate::orchestrator::config::OrchestratorConfig;
    use crate::orchestrator::handlers::*;
    use crate::orchestrator::protocol::*;
    use crate::orchestrator::registry::{ExpressionRegistry, RegistryError};
    use crate::orchestrator::server::router;
    use crate::orchestrator::types::*;

    use axum::http::StatusCode;
    use axum::{Extension, Json};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    fn registry() -> ExpressionRegistry {
        ExpressionRegistry::new(Duration::from_millis(10))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    async fn spawn_server(registry: Arc<ExpressionRegistry>) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(registry)).await.unwrap();
        });
        addr
    }

    // ============================================================
    // REGISTRY: SUBMISSION
    // ============================================================

    #[tokio::test]
    async fn test_submit_assigns_sequential_ids() {
        let registry = registry();

        let first = registry.submit("1+1").await.unwrap();
        let second = registry.submit("2*3").await.unwrap();
        let third = registry.submit("(4-1)/3").await.unwrap();

        assert_eq!(first, ExpressionId("1".to_string()));
        assert_eq!(second, ExpressionId("2".to_string()));
        assert_eq!(third, ExpressionId("3".to_string()));
    }

    #[tokio::test]
    async fn test_failed_submit_registers_nothing() {
        let registry = registry();

        let err = registry.submit("(2+3").await.unwrap_err();
        assert_eq!(err, RegistryError::Compile(CalcError::MismatchedParentheses));
        assert_eq!(err.to_string(), "mismatched parentheses");

        assert!(registry.get_all().await.is_empty());
        assert!(registry.next_task().await.is_none());

        // The id is not burned by the failed attempt
        let id = registry.submit("2+3").await.unwrap();
        assert_eq!(id.0, "1");
    }

    #[tokio::test]
    async fn test_submit_starts_pending() {
        let registry = registry();
        let id = registry.submit("2+2*2").await.unwrap();

        let expression = registry.get(&id).await.unwrap();
        assert_eq!(expression.status, ExpressionStatus::Pending);
        assert_eq!(registry.stats().await.queued_tasks, 2);
    }

    #[tokio::test]
    async fn test_single_literal_is_done_immediately() {
        let registry = registry();
        let id = registry.submit("42").await.unwrap();

        let expression = registry.get(&id).await.unwrap();
        assert_eq!(expression.status, ExpressionStatus::Done);
        assert_eq!(expression.result, 42.0);
        assert!(registry.next_task().await.is_none());
    }

    // ============================================================
    // REGISTRY: DISPATCH AND COMPLETION
    // ============================================================

    #[tokio::test]
    async fn test_next_task_on_empty_queue() {
        let registry = registry();
        assert!(registry.next_task().await.is_none());
    }

    #[tokio::test]
    async fn test_exactly_k_tasks_are_dispatched() {
        let registry = registry();
        registry.submit("(2+(2*2)+(3+4))*2").await.unwrap();

        let mut dispatched = Vec::new();
        while let Some(task) = registry.next_task().await {
            dispatched.push(task);
        }

        assert_eq!(dispatched.len(), 5);
        let seqs: Vec<usize> = dispatched.iter().map(|t| t.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
        assert!(registry.next_task().await.is_none());
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let registry = registry();
        let id = registry.submit("2+2*2").await.unwrap();

        // First task: 2 * 2
        let task = registry.next_task().await.unwrap();
        assert_eq!((task.arg1, task.arg2, task.operation.as_str()), (2.0, 2.0, "*"));
        assert_eq!(
            registry.get(&id).await.unwrap().status,
            ExpressionStatus::InProgress
        );

        let status = registry.report_result(&id, 4.0, Some(task.seq)).await.unwrap();
        assert_eq!(status, ExpressionStatus::InProgress);

        // Second task: 2 + 4
        let task = registry.next_task().await.unwrap();
        assert_eq!((task.arg1, task.arg2, task.operation.as_str()), (2.0, 4.0, "+"));

        let status = registry.report_result(&id, 6.0, Some(task.seq)).await.unwrap();
        assert_eq!(status, ExpressionStatus::Done);

        let expression = registry.get(&id).await.unwrap();
        assert_eq!(expression.status, ExpressionStatus::Done);
        assert_eq!(expression.result, 6.0);
    }

    #[tokio::test]
    async fn test_reports_without_seq_use_latest_value() {
        let registry = registry();
        let id = registry.submit("(2+3)*4").await.unwrap();

        registry.next_task().await.unwrap();
        registry.report_result(&id, 5.0, None).await.unwrap();
        registry.next_task().await.unwrap();
        registry.report_result(&id, 20.0, None).await.unwrap();

        let expression = registry.get(&id).await.unwrap();
        assert_eq!(expression.status, ExpressionStatus::Done);
        assert_eq!(expression.result, 20.0);
    }

    #[tokio::test]
    async fn test_out_of_order_reports_keep_final_value() {
        let registry = registry();
        let id = registry.submit("(2+3)*4").await.unwrap();

        let first = registry.next_task().await.unwrap();
        let last = registry.next_task().await.unwrap();

        // Last task finishes before the first one
        registry.report_result(&id, 20.0, Some(last.seq)).await.unwrap();
        let status = registry.report_result(&id, 5.0, Some(first.seq)).await.unwrap();

        assert_eq!(status, ExpressionStatus::Done);
        assert_eq!(registry.get(&id).await.unwrap().result, 20.0);
    }

    #[tokio::test]
    async fn test_interleaved_expressions_fifo() {
        let registry = registry();
        let a = registry.submit("1+2").await.unwrap();
        let b = registry.submit("3*4").await.unwrap();

        assert_eq!(registry.next_task().await.unwrap().id, a);
        assert_eq!(registry.next_task().await.unwrap().id, b);

        assert_eq!(registry.get(&a).await.unwrap().status, ExpressionStatus::InProgress);
        assert_eq!(registry.get(&b).await.unwrap().status, ExpressionStatus::InProgress);

        registry.report_result(&b, 12.0, Some(0)).await.unwrap();
        assert_eq!(registry.get(&a).await.unwrap().status, ExpressionStatus::InProgress);
        assert_eq!(registry.get(&b).await.unwrap().status, ExpressionStatus::Done);
    }

    #[tokio::test]
    async fn test_report_for_unknown_expression() {
        let registry = registry();
        let missing = ExpressionId("99".to_string());

        let err = registry.report_result(&missing, 1.0, None).await.unwrap_err();
        assert_eq!(err, RegistryError::NotFound(missing.clone()));
        assert!(registry.get(&missing).await.is_none());
        assert!(registry.get(&ExpressionId("abc".to_string())).await.is_none());
    }

    #[tokio::test]
    async fn test_done_is_terminal() {
        let registry = registry();
        let id = registry.submit("1+1").await.unwrap();

        registry.next_task().await.unwrap();
        registry.report_result(&id, 2.0, Some(0)).await.unwrap();

        let status = registry.report_result(&id, 100.0, Some(0)).await.unwrap();
        assert_eq!(status, ExpressionStatus::Done);
        assert_eq!(registry.get(&id).await.unwrap().result, 2.0);

        let status = registry.report_failure(&id, "late failure").await.unwrap();
        assert_eq!(status, ExpressionStatus::Done);
    }

    #[tokio::test]
    async fn test_duplicate_report_does_not_complete_expression() {
        let registry = registry();
        let id = registry.submit("2+2*2").await.unwrap();

        let first = registry.next_task().await.unwrap();
        registry.report_result(&id, 4.0, Some(first.seq)).await.unwrap();

        // A resent report for the same task must not count again
        let status = registry.report_result(&id, 4.0, Some(first.seq)).await.unwrap();
        assert_eq!(status, ExpressionStatus::InProgress);
        assert_eq!(registry.stats().await.queued_tasks, 1);

        let last = registry.next_task().await.unwrap();
        assert_eq!(last.seq, 1);
        let status = registry.report_result(&id, 6.0, Some(last.seq)).await.unwrap();
        assert_eq!(status, ExpressionStatus::Done);
        assert_eq!(registry.get(&id).await.unwrap().result, 6.0);
    }

    #[tokio::test]
    async fn test_report_for_unemitted_seq_is_rejected() {
        let registry = registry();
        let id = registry.submit("1+1").await.unwrap();
        registry.next_task().await.unwrap();

        let err = registry.report_result(&id, 2.0, Some(99)).await.unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownTask {
                id: id.clone(),
                seq: 99
            }
        );
        assert_eq!(
            registry.get(&id).await.unwrap().status,
            ExpressionStatus::InProgress
        );

        let status = registry.report_result(&id, 2.0, Some(0)).await.unwrap();
        assert_eq!(status, ExpressionStatus::Done);
        assert_eq!(registry.get(&id).await.unwrap().result, 2.0);
    }

    #[tokio::test]
    async fn test_failure_discards_remaining_tasks() {
        let registry = registry();
        let failing = registry.submit("(1+2)*3").await.unwrap();
        let other = registry.submit("5-1").await.unwrap();

        registry.next_task().await.unwrap();
        let status = registry
            .report_failure(&failing, "unknown operation: ^")
            .await
            .unwrap();
        assert_eq!(status, ExpressionStatus::Failed);

        let expression = registry.get(&failing).await.unwrap();
        assert_eq!(expression.status, ExpressionStatus::Failed);
        assert_eq!(expression.error.as_deref(), Some("unknown operation: ^"));

        // Only the other expression's task is left
        let task = registry.next_task().await.unwrap();
        assert_eq!(task.id, other);
        assert!(registry.next_task().await.is_none());
    }

    #[tokio::test]
    async fn test_stats_counts_statuses() {
        let registry = registry();
        let done = registry.submit("7").await.unwrap();
        let running = registry.submit("1+1").await.unwrap();
        registry.submit("2+2").await.unwrap();

        registry.next_task().await.unwrap();

        let stats = registry.stats().await;
        assert_eq!(
            stats,
            RegistryStats {
                pending: 1,
                in_progress: 1,
                done: 1,
                failed: 0,
                queued_tasks: 1,
            }
        );
        assert_eq!(registry.get(&done).await.unwrap().status, ExpressionStatus::Done);
        assert_eq!(
            registry.get(&running).await.unwrap().status,
            ExpressionStatus::InProgress
        );
    }

    #[tokio::test]
    async fn test_concurrent_submissions_get_unique_ids() {
        let registry = Arc::new(registry());

        let mut handles = Vec::new();
        for _ in 0..20 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move { registry.submit("1+2*3").await.unwrap() }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().0.parse::<usize>().unwrap());
        }
        ids.sort_unstable();

        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
        assert_eq!(registry.stats().await.queued_tasks, 40);
    }

    // ============================================================
    // TYPES
    // ============================================================

    #[test]
    fn test_task_wire_format() {
        let task = Task {
            id: ExpressionId::new(3),
            seq: 1,
            arg1: 2.0,
            arg2: 4.0,
            operation: "+".to_string(),
            operation_time: Duration::from_millis(1500),
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], "3");
        assert_eq!(json["operation"], "+");
        assert_eq!(json["operation_time"], 1500);

        let restored: Task = serde_json::from_value(json).unwrap();
        assert_eq!(restored, task);

        // `seq` is optional on the wire
        let bare: Task = serde_json::from_str(
            r#"{"id":"1","arg1":1,"arg2":2,"operation":"*","operation_time":0}"#,
        )
        .unwrap();
        assert_eq!(bare.seq, 0);
    }

    #[test]
    fn test_expression_status_serialization() {
        let expression = Expression {
            id: ExpressionId::new(1),
            status: ExpressionStatus::InProgress,
            result: 0.0,
            error: None,
        };

        let json = serde_json::to_value(&expression).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_config_from_lookup() {
        let config = OrchestratorConfig::from_lookup(|key| match key {
            "ORCHESTRATOR_BIND" => Some("0.0.0.0:9000".to_string()),
            "OPERATION_TIME_MS" => Some("not-a-number".to_string()),
            _ => None,
        });

        assert_eq!(config.bind_addr, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.operation_time, Duration::from_millis(1000));
    }

    // ============================================================
    // HANDLERS (direct invocation)
    // ============================================================

    #[tokio::test]
    async fn test_handle_calculate_created() {
        let registry = Arc::new(registry());

        let response = handle_calculate(
            Extension(registry.clone()),
            Ok(Json(CalculateRequest {
                expression: "2+2".to_string(),
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["id"], "1");
    }

    #[tokio::test]
    async fn test_handle_calculate_invalid_expression() {
        let registry = Arc::new(registry());

        let response = handle_calculate(
            Extension(registry.clone()),
            Ok(Json(CalculateRequest {
                expression: "10/0".to_string(),
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "division by zero");
        assert!(registry.get_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_handle_get_expression_not_found() {
        let registry = Arc::new(registry());

        let response =
            handle_get_expression(Extension(registry), axum::extract::Path("5".to_string())).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handle_task_round_trip() {
        let registry = Arc::new(registry());
        let id = registry.submit("3*4").await.unwrap();

        let response = handle_get_task(Extension(registry.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let task = body_json(response).await;
        assert_eq!(task["arg1"], 3.0);
        assert_eq!(task["operation"], "*");

        let response = handle_get_task(Extension(registry.clone())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = handle_post_task_result(
            Extension(registry.clone()),
            Ok(Json(TaskResultRequest {
                id: id.clone(),
                result: Some(12.0),
                seq: Some(0),
                error: None,
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let expression = registry.get(&id).await.unwrap();
        assert_eq!(expression.status, ExpressionStatus::Done);
        assert_eq!(expression.result, 12.0);
    }

    #[tokio::test]
    async fn test_handle_task_result_unknown_expression() {
        let registry = Arc::new(registry());

        let response = handle_post_task_result(
            Extension(registry),
            Ok(Json(TaskResultRequest {
                id: ExpressionId::new(8),
                result: Some(1.0),
                seq: None,
                error: None,
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handle_task_result_requires_result_or_error() {
        let registry = Arc::new(registry());
        let id = registry.submit("1+1").await.unwrap();
        registry.next_task().await.unwrap();

        let response = handle_post_task_result(
            Extension(registry.clone()),
            Ok(Json(TaskResultRequest {
                id: id.clone(),
                result: None,
                seq: Some(0),
                error: None,
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let expression = registry.get(&id).await.unwrap();
        assert_eq!(expression.status, ExpressionStatus::InProgress);
    }

    #[tokio::test]
    async fn test_handle_task_result_unknown_seq() {
        let registry = Arc::new(registry());
        let id = registry.submit("1+1").await.unwrap();

        let response = handle_post_task_result(
            Extension(registry.clone()),
            Ok(Json(TaskResultRequest {
                id,
                result: Some(2.0),
                seq: Some(5),
                error: None,
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // ============================================================
    // HTTP SURFACE (live listener)
    // ============================================================

    #[tokio::test]
    async fn test_http_endpoints() {
        let registry = Arc::new(registry());
        let addr = spawn_server(registry.clone()).await;
        let client = reqwest::Client::new();
        let base = format!("http://{}", addr);

        // Submit
        let resp = client
            .post(format!("{}{}", base, ENDPOINT_CALCULATE))
            .json(&serde_json::json!({"expression": "(2+3)*4"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
        let created: CalculateResponse = resp.json().await.unwrap();
        assert_eq!(created.id.0, "1");

        // Malformed body
        let resp = client
            .post(format!("{}{}", base, ENDPOINT_CALCULATE))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        // Invalid expression
        let resp = client
            .post(format!("{}{}", base, ENDPOINT_CALCULATE))
            .json(&serde_json::json!({"expression": "2 + a"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = resp.json().await.unwrap();
        assert_eq!(body.error, "invalid character: a");

        // Listing
        let list: Vec<Expression> = client
            .get(format!("{}{}", base, ENDPOINT_EXPRESSIONS))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].status, ExpressionStatus::Pending);

        // By id
        let resp = client
            .get(format!("{}/api/v1/expressions/1", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let resp = client
            .get(format!("{}/api/v1/expressions/2", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        // Tasks
        for expected in [5.0, 20.0] {
            let task: Task = client
                .get(format!("{}{}", base, ENDPOINT_INTERNAL_TASK))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            let resp = client
                .post(format!("{}{}", base, ENDPOINT_INTERNAL_TASK))
                .json(&TaskResultRequest {
                    id: task.id,
                    result: Some(expected),
                    seq: Some(task.seq),
                    error: None,
                })
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), reqwest::StatusCode::OK);
        }

        let resp = client
            .get(format!("{}{}", base, ENDPOINT_INTERNAL_TASK))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        // Body with neither result nor error
        let resp = client
            .post(format!("{}{}", base, ENDPOINT_INTERNAL_TASK))
            .json(&serde_json::json!({"id": "1"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        // Malformed task result
        let resp = client
            .post(format!("{}{}", base, ENDPOINT_INTERNAL_TASK))
            .header("content-type", "application/json")
            .body(r#"{"result": 1}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        let expression: Expression = client
            .get(format!("{}/api/v1/expressions/1", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(expression.status, ExpressionStatus::Done);
        assert_eq!(expression.result, 20.0);

        let stats: RegistryStats = client
            .get(format!("{}{}", base, ENDPOINT_INTERNAL_STATS))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats.done, 1);
        assert_eq!(stats.queued_tasks, 0);
    }
}
