//! Worker Pool Implementation
//!
//! Runs `worker_count` workers that pull tasks from the orchestrator, execute them
//! after the operator's simulated delay and post the outcome back.
//!
//! ## Dispatch modes
//! - **Parallel**: each worker polls on its own, so up to `worker_count` tasks are in
//!   flight at once.
//! - **Serialized**: one dispatcher fetches a task, hands it to the pool through a
//!   bounded channel and waits for that task to finish before fetching the next.

use super::client::{ClientError, OrchestratorClient};
use super::config::{AgentConfig, DispatchMode, OperationTimes};
use crate::calculator::{CalcError, Operation};
use crate::orchestrator::types::Task;

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Executes one task: waits for the operator's configured duration, then computes.
///
/// Unknown operators are rejected before waiting.
pub async fn execute_task(task: &Task, times: &OperationTimes) -> Result<f64, CalcError> {
    let operation: Operation = task.operation.parse()?;

    tracing::debug!(
        "Executing task {}#{}: {} {} {}",
        task.id,
        task.seq,
        task.arg1,
        operation,
        task.arg2
    );

    tokio::time::sleep(times.for_operation(operation)).await;

    operation.apply(task.arg1, task.arg2)
}

/// A task handed to the pool together with its completion signal.
type Assignment = (Task, oneshot::Sender<()>);

pub struct Agent {
    config: AgentConfig,
    client: OrchestratorClient,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Arc<Self>, ClientError> {
        let client = OrchestratorClient::new(
            &config.orchestrator_url,
            config.request_timeout,
            config.retry.clone(),
        )?;

        Ok(Arc::new(Self { config, client }))
    }

    /// Spawns the pool and returns its handles. Everything stops once `cancel` fires.
    pub fn start(self: Arc<Self>, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        let worker_count = self.config.worker_count.max(1);
        tracing::info!(
            "Starting {} workers against {} ({:?} dispatch)",
            worker_count,
            self.config.orchestrator_url,
            self.config.dispatch_mode
        );

        let mut handles = Vec::with_capacity(worker_count + 1);

        match self.config.dispatch_mode {
            DispatchMode::Parallel => {
                for worker_id in 0..worker_count {
                    let agent = self.clone();
                    let cancel = cancel.clone();
                    handles.push(tokio::spawn(async move {
                        agent.polling_worker(worker_id, cancel).await;
                    }));
                }
            }
            DispatchMode::Serialized => {
                let (tx, rx) = mpsc::channel::<Assignment>(worker_count);
                let rx = Arc::new(Mutex::new(rx));

                for worker_id in 0..worker_count {
                    let agent = self.clone();
                    let rx = rx.clone();
                    handles.push(tokio::spawn(async move {
                        agent.channel_worker(worker_id, rx).await;
                    }));
                }

                let agent = self.clone();
                handles.push(tokio::spawn(async move {
                    agent.dispatcher(tx, cancel).await;
                }));
            }
        }

        handles
    }

    /// Runs the pool until `cancel` fires and every worker has wound down.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        for handle in self.start(cancel) {
            if let Err(e) = handle.await {
                tracing::error!("Agent worker panicked: {}", e);
            }
        }
        tracing::info!("Agent stopped");
    }

    /// Parallel mode: fetch, execute, report, repeat.
    async fn polling_worker(&self, worker_id: usize, cancel: CancellationToken) {
        tracing::info!("Worker {} started", worker_id);

        while !cancel.is_cancelled() {
            let fetched = tokio::select! {
                _ = cancel.cancelled() => break,
                fetched = self.client.fetch_task() => fetched,
            };

            match fetched {
                Ok(Some(task)) => self.process(worker_id, task).await,
                Ok(None) => {
                    tracing::trace!("Worker {}: no task available", worker_id);
                    if !self.pause(&cancel).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Worker {} failed to fetch task: {}", worker_id, e);
                    if !self.pause(&cancel).await {
                        break;
                    }
                }
            }
        }

        tracing::info!("Worker {} stopped", worker_id);
    }

    /// Serialized mode: the only component that talks to `GET /internal/task`.
    async fn dispatcher(&self, tx: mpsc::Sender<Assignment>, cancel: CancellationToken) {
        tracing::info!("Dispatcher started");

        while !cancel.is_cancelled() {
            let fetched = tokio::select! {
                _ = cancel.cancelled() => break,
                fetched = self.client.fetch_task() => fetched,
            };

            let task = match fetched {
                Ok(Some(task)) => task,
                Ok(None) => {
                    if !self.pause(&cancel).await {
                        break;
                    }
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Dispatcher failed to fetch task: {}", e);
                    if !self.pause(&cancel).await {
                        break;
                    }
                    continue;
                }
            };

            let (done_tx, done_rx) = oneshot::channel();
            if tx.send((task, done_tx)).await.is_err() {
                tracing::error!("All workers are gone, dispatcher exiting");
                break;
            }

            // Barrier: the next fetch waits for the current task to finish.
            let _ = done_rx.await;
        }

        // Dropping `tx` lets idle workers observe the closed channel and exit.
        tracing::info!("Dispatcher stopped");
    }

    async fn channel_worker(&self, worker_id: usize, rx: Arc<Mutex<mpsc::Receiver<Assignment>>>) {
        tracing::info!("Worker {} started", worker_id);

        loop {
            let assignment = rx.lock().await.recv().await;
            let Some((task, done)) = assignment else {
                break;
            };

            self.process(worker_id, task).await;
            let _ = done.send(());
        }

        tracing::info!("Worker {} stopped", worker_id);
    }

    /// Executes `task` and reports the outcome. Arithmetic failures are reported
    /// once and never retried.
    async fn process(&self, worker_id: usize, task: Task) {
        match execute_task(&task, &self.config.operation_times).await {
            Ok(result) => match self.client.submit_result(&task, result).await {
                Ok(()) => tracing::info!(
                    "Worker {}: task {}#{} = {} reported",
                    worker_id,
                    task.id,
                    task.seq,
                    result
                ),
                Err(e) => tracing::error!(
                    "Worker {}: failed to report result of task {}#{}: {}",
                    worker_id,
                    task.id,
                    task.seq,
                    e
                ),
            },
            Err(e) => {
                tracing::error!(
                    "Worker {}: task {}#{} failed: {}",
                    worker_id,
                    task.id,
                    task.seq,
                    e
                );
                if let Err(report_err) = self.client.submit_failure(&task, &e.to_string()).await {
                    tracing::error!(
                        "Worker {}: failed to report failure of task {}#{}: {}",
                        worker_id,
                        task.id,
                        task.seq,
                        report_err
                    );
                }
            }
        }
    }

    /// Waits one poll interval. Returns `false` if cancelled meanwhile.
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.config.poll_interval) => true,
        }
    }
}
