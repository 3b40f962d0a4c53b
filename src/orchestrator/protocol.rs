//! Network Protocol Definitions
//!
//! Request and response bodies exchanged with clients and agents, plus the
//! endpoint paths both sides agree on.

use super::types::*;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_CALCULATE: &str = "/api/v1/calculate";
pub const ENDPOINT_EXPRESSIONS: &str = "/api/v1/expressions";
pub const ENDPOINT_EXPRESSION_BY_ID: &str = "/api/v1/expressions/:id";
pub const ENDPOINT_INTERNAL_TASK: &str = "/internal/task";
pub const ENDPOINT_INTERNAL_STATS: &str = "/internal/stats";

#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub expression: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub id: ExpressionId,
}

/// Outcome of one task, posted by an agent.
///
/// Carries either `result` or `error`; a body with neither is rejected. `seq`
/// echoes the task position when the agent knows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultRequest {
    pub id: ExpressionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegistryStats {
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
    pub failed: usize,
    pub queued_tasks: usize,
}
