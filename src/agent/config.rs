use crate::calculator::Operation;

use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_ORCHESTRATOR_URL: &str = "http://127.0.0.1:8080";

/// Simulated cost of each operator.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationTimes {
    pub addition: Duration,
    pub subtraction: Duration,
    pub multiplication: Duration,
    pub division: Duration,
}

impl OperationTimes {
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Add => self.addition,
            Operation::Subtract => self.subtraction,
            Operation::Multiply => self.multiplication,
            Operation::Divide => self.division,
        }
    }

    /// Same duration for every operator. Handy for tests.
    pub fn uniform(duration: Duration) -> Self {
        Self {
            addition: duration,
            subtraction: duration,
            multiplication: duration,
            division: duration,
        }
    }
}

impl Default for OperationTimes {
    fn default() -> Self {
        Self {
            addition: Duration::from_millis(1000),
            subtraction: Duration::from_millis(1000),
            multiplication: Duration::from_millis(2000),
            division: Duration::from_millis(2000),
        }
    }
}

/// Bounded retry used when posting results back to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of tries, including the first one.
    pub attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(150),
            max_delay: Duration::from_millis(1200),
        }
    }
}

/// How fetched tasks reach the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Every worker polls the orchestrator on its own.
    Parallel,
    /// A single dispatcher fetches one task at a time and waits until a worker
    /// has finished it before fetching the next.
    Serialized,
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parallel" => Ok(DispatchMode::Parallel),
            "serialized" | "serial" => Ok(DispatchMode::Serialized),
            other => Err(format!("unknown dispatch mode: {}", other)),
        }
    }
}

/// Everything an agent needs, passed explicitly to `Agent::new`.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub orchestrator_url: String,
    pub worker_count: usize,
    pub operation_times: OperationTimes,
    /// Wait between polls when no task is available or the orchestrator is unreachable.
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub dispatch_mode: DispatchMode,
}

impl AgentConfig {
    /// Builds the config from named settings. Unset or unparsable values fall back
    /// to their defaults; a worker count below one is clamped to one.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let millis = |key: &str, fallback: Duration| {
            lookup(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(fallback)
        };

        let orchestrator_url = lookup("ORCHESTRATOR_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.orchestrator_url);

        let worker_count = lookup("COMPUTING_POWER")
            .and_then(|value| value.trim().parse::<i64>().ok())
            .map(|count| count.max(1) as usize)
            .unwrap_or(defaults.worker_count);

        let operation_times = OperationTimes {
            addition: millis("TIME_ADDITION_MS", defaults.operation_times.addition),
            subtraction: millis("TIME_SUBTRACTION_MS", defaults.operation_times.subtraction),
            multiplication: millis(
                "TIME_MULTIPLICATIONS_MS",
                defaults.operation_times.multiplication,
            ),
            division: millis("TIME_DIVISIONS_MS", defaults.operation_times.division),
        };

        let dispatch_mode = lookup("AGENT_DISPATCH_MODE")
            .and_then(|value| value.parse().ok())
            .unwrap_or(defaults.dispatch_mode);

        Self {
            orchestrator_url,
            worker_count,
            operation_times,
            dispatch_mode,
            ..defaults
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            orchestrator_url: DEFAULT_ORCHESTRATOR_URL.to_string(),
            worker_count: 1,
            operation_times: OperationTimes::default(),
            poll_interval: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            dispatch_mode: DispatchMode::Parallel,
        }
    }
}
