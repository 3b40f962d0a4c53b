//! Orchestrator HTTP Client
//!
//! Thin wrapper over `reqwest` for the two internal endpoints an agent talks to.

use super::config::RetryPolicy;
use crate::orchestrator::protocol::{ENDPOINT_INTERNAL_TASK, TaskResultRequest};
use crate::orchestrator::types::Task;

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("orchestrator responded with status {0}")]
    Status(StatusCode),

    #[error("failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    base_url: String,
    http_client: reqwest::Client,
    retry: RetryPolicy,
}

impl OrchestratorClient {
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            retry,
        })
    }

    fn task_url(&self) -> String {
        format!("{}{}", self.base_url, ENDPOINT_INTERNAL_TASK)
    }

    /// Asks for the next task. `Ok(None)` means the queue is currently empty.
    pub async fn fetch_task(&self) -> Result<Option<Task>, ClientError> {
        let response = self.http_client.get(self.task_url()).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let task = response.json::<Task>().await.map_err(ClientError::Decode)?;
                tracing::debug!("Received task {}#{}", task.id, task.seq);
                Ok(Some(task))
            }
            status => Err(ClientError::Status(status)),
        }
    }

    /// Reports the value computed for `task`.
    pub async fn submit_result(&self, task: &Task, result: f64) -> Result<(), ClientError> {
        let payload = TaskResultRequest {
            id: task.id.clone(),
            result: Some(result),
            seq: Some(task.seq),
            error: None,
        };
        self.post_with_retry(&payload).await
    }

    /// Reports that `task` could not be executed.
    pub async fn submit_failure(&self, task: &Task, error: &str) -> Result<(), ClientError> {
        let payload = TaskResultRequest {
            id: task.id.clone(),
            result: None,
            seq: Some(task.seq),
            error: Some(error.to_string()),
        };
        self.post_with_retry(&payload).await
    }

    /// Posts `payload`, retrying transport errors and 5xx answers with exponential
    /// backoff. Client errors (4xx) are returned immediately.
    async fn post_with_retry(&self, payload: &TaskResultRequest) -> Result<(), ClientError> {
        let mut delay = self.retry.base_delay;
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = match self
                .http_client
                .post(self.task_url())
                .json(payload)
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) if resp.status().is_client_error() => {
                    return Err(ClientError::Status(resp.status()));
                }
                Ok(resp) => ClientError::Status(resp.status()),
                Err(e) => ClientError::Request(e),
            };

            if attempt >= attempts {
                return Err(outcome);
            }

            tracing::warn!(
                "Posting result for {} failed (attempt {}/{}): {}",
                payload.id,
                attempt,
                attempts,
                outcome
            );

            // Jitter keeps concurrent workers from retrying in lockstep
            let jitter = Duration::from_millis(rand::random::<u64>() % 50);
            tokio::time::sleep(delay + jitter).await;
            delay = (delay * 2).min(self.retry.max_delay);
        }
    }
}
