use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identifier of a submitted expression.
///
/// Assigned sequentially by the registry (`"1"`, `"2"`, ...). Tasks reuse the id of the
/// expression they belong to, so it is a correlation key rather than a task identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ExpressionId(pub String);

impl ExpressionId {
    pub fn new(seq: usize) -> Self {
        Self(seq.to_string())
    }
}

impl fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of an expression.
///
/// `pending -> in_progress -> done`, with `failed` reachable from either
/// non-terminal state when an agent reports an arithmetic failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionStatus {
    /// Submitted, no task fetched yet.
    Pending,
    /// At least one task has been handed to an agent.
    InProgress,
    /// The result of the last task has been reported.
    Done,
    /// An agent could not execute one of the tasks.
    Failed,
}

impl ExpressionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExpressionStatus::Done | ExpressionStatus::Failed)
    }
}

/// Public view of an expression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expression {
    pub id: ExpressionId,
    pub status: ExpressionStatus,
    pub result: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One elementary binary operation, `arg1 <operation> arg2`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Owning expression.
    pub id: ExpressionId,
    /// Position of this task in its expression's task list.
    #[serde(default)]
    pub seq: usize,
    pub arg1: f64,
    pub arg2: f64,
    /// Operator symbol. Kept as text on the wire so agents can reject
    /// operators they do not know.
    pub operation: String,
    /// Simulated cost, serialized in milliseconds.
    #[serde(with = "duration_ms", default)]
    pub operation_time: Duration,
}

/// Internal bookkeeping for one expression inside the registry.
#[derive(Debug, Clone)]
pub struct ExpressionEntry {
    pub expression: Expression,
    /// Tasks handed out or queued but not yet reported.
    pub remaining: usize,
    /// `seq` of the task whose result defines the expression value.
    pub final_seq: Option<usize>,
    /// Value reported for the final task, when reports carry `seq`.
    pub final_result: Option<f64>,
    /// One flag per task, set once a report naming that `seq` is accepted.
    pub reported: Vec<bool>,
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
