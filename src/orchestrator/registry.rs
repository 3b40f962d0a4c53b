//! Expression Registry
//!
//! The orchestrator's only mutable state: submitted expressions, the shared FIFO
//! task queue and the table of reported results. All three live behind one lock,
//! so every command below is atomic with respect to the others.

use super::protocol::RegistryStats;
use super::types::*;
use crate::calculator::{compile, CalcError};

use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("expression not found: {0}")]
    NotFound(ExpressionId),

    #[error("expression {id} has no task #{seq}")]
    UnknownTask { id: ExpressionId, seq: usize },

    #[error(transparent)]
    Compile(#[from] CalcError),
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Entries in submission order; entry `n` has id `n + 1`.
    expressions: Vec<ExpressionEntry>,
    queue: VecDeque<Task>,
    /// Latest value reported per expression.
    results: HashMap<ExpressionId, f64>,
}

impl RegistryState {
    fn index_of(&self, id: &ExpressionId) -> Option<usize> {
        let index = id.0.parse::<usize>().ok()?.checked_sub(1)?;
        self.expressions
            .get(index)
            .filter(|entry| entry.expression.id == *id)
            .map(|_| index)
    }

    fn entry_mut(&mut self, id: &ExpressionId) -> Option<&mut ExpressionEntry> {
        let index = self.index_of(id)?;
        self.expressions.get_mut(index)
    }

    fn entry(&self, id: &ExpressionId) -> Option<&ExpressionEntry> {
        self.expressions.get(self.index_of(id)?)
    }
}

/// Serialized access point to expressions and their tasks.
pub struct ExpressionRegistry {
    state: Mutex<RegistryState>,
    /// Simulated cost stamped on every compiled task.
    operation_time: Duration,
}

impl ExpressionRegistry {
    pub fn new(operation_time: Duration) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            operation_time,
        }
    }

    /// Compiles `expression`, registers it and enqueues its tasks.
    ///
    /// Nothing is registered when compilation fails. A lone literal has no tasks
    /// and is registered as already `done`.
    pub async fn submit(&self, expression: &str) -> Result<ExpressionId, RegistryError> {
        let mut state = self.state.lock().await;

        let id = ExpressionId::new(state.expressions.len() + 1);
        let compilation = compile(&id, expression, self.operation_time)?;
        let task_count = compilation.tasks.len();

        let status = if task_count == 0 {
            ExpressionStatus::Done
        } else {
            ExpressionStatus::Pending
        };

        state.expressions.push(ExpressionEntry {
            expression: Expression {
                id: id.clone(),
                status,
                result: if task_count == 0 { compilation.value } else { 0.0 },
                error: None,
            },
            remaining: task_count,
            final_seq: task_count.checked_sub(1),
            final_result: None,
            reported: vec![false; task_count],
        });
        state.queue.extend(compilation.tasks);

        tracing::info!(
            "Registered expression {} ({} tasks): {}",
            id,
            task_count,
            expression
        );

        Ok(id)
    }

    /// Pops the oldest queued task and marks its expression `in_progress`.
    ///
    /// `None` means the queue is empty; callers are expected to poll again later.
    pub async fn next_task(&self) -> Option<Task> {
        let mut state = self.state.lock().await;

        let task = state.queue.pop_front()?;
        if let Some(entry) = state.entry_mut(&task.id) {
            if entry.expression.status == ExpressionStatus::Pending {
                entry.expression.status = ExpressionStatus::InProgress;
            }
        }

        tracing::debug!(
            "Dispatching task {}#{}: {} {} {}",
            task.id,
            task.seq,
            task.arg1,
            task.operation,
            task.arg2
        );

        Some(task)
    }

    /// Records a task result and completes the expression once no task is outstanding.
    ///
    /// The expression value is the result reported for its last task. When reports
    /// carry no `seq`, the latest value in the result table is used instead.
    /// A repeated `seq` is ignored, and a `seq` the expression never emitted is
    /// rejected. Reports for expressions that already reached a terminal state
    /// are ignored.
    pub async fn report_result(
        &self,
        id: &ExpressionId,
        value: f64,
        seq: Option<usize>,
    ) -> Result<ExpressionStatus, RegistryError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let index = state
            .index_of(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let entry = &mut state.expressions[index];

        if entry.expression.status.is_terminal() {
            tracing::warn!(
                "Ignoring result {} for expression {} in state {:?}",
                value,
                id,
                entry.expression.status
            );
            return Ok(entry.expression.status);
        }

        if let Some(seq) = seq {
            match entry.reported.get_mut(seq) {
                None => {
                    tracing::warn!("Rejecting result for unknown task {}#{}", id, seq);
                    return Err(RegistryError::UnknownTask {
                        id: id.clone(),
                        seq,
                    });
                }
                Some(true) => {
                    tracing::warn!("Ignoring duplicate result for task {}#{}", id, seq);
                    return Ok(entry.expression.status);
                }
                Some(flag) => *flag = true,
            }

            if Some(seq) == entry.final_seq {
                entry.final_result = Some(value);
            }
        }

        state.results.insert(id.clone(), value);
        entry.remaining = entry.remaining.saturating_sub(1);

        if entry.remaining == 0 {
            entry.expression.status = ExpressionStatus::Done;
            entry.expression.result = entry
                .final_result
                .or_else(|| state.results.get(id).copied())
                .unwrap_or(value);
            tracing::info!(
                "Expression {} done, result: {}",
                id,
                entry.expression.result
            );
        }

        Ok(entry.expression.status)
    }

    /// Marks the expression `failed` and drops its queued tasks.
    pub async fn report_failure(
        &self,
        id: &ExpressionId,
        error: &str,
    ) -> Result<ExpressionStatus, RegistryError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let entry = state
            .entry_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        if entry.expression.status.is_terminal() {
            tracing::warn!("Ignoring failure for finished expression {}: {}", id, error);
            return Ok(entry.expression.status);
        }

        entry.expression.status = ExpressionStatus::Failed;
        entry.expression.error = Some(error.to_string());
        entry.remaining = 0;

        state.queue.retain(|task| task.id != *id);

        tracing::error!("Expression {} failed: {}", id, error);

        Ok(ExpressionStatus::Failed)
    }

    pub async fn get(&self, id: &ExpressionId) -> Option<Expression> {
        let state = self.state.lock().await;
        state.entry(id).map(|entry| entry.expression.clone())
    }

    /// Snapshot of every expression in submission order.
    pub async fn get_all(&self) -> Vec<Expression> {
        let state = self.state.lock().await;
        state
            .expressions
            .iter()
            .map(|entry| entry.expression.clone())
            .collect()
    }

    pub async fn stats(&self) -> RegistryStats {
        let state = self.state.lock().await;

        let mut stats = RegistryStats {
            queued_tasks: state.queue.len(),
            ..RegistryStats::default()
        };

        for entry in state.expressions.iter() {
            match entry.expression.status {
                ExpressionStatus::Pending => stats.pending += 1,
                ExpressionStatus::InProgress => stats.in_progress += 1,
                ExpressionStatus::Done => stats.done += 1,
                ExpressionStatus::Failed => stats.failed += 1,
            }
        }

        stats
    }
}

impl Default for ExpressionRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
