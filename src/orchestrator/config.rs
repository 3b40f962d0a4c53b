use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_OPERATION_TIME_MS: u64 = 1000;

/// Settings for the orchestrator role.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub bind_addr: SocketAddr,
    /// Duration stamped on every compiled task.
    pub operation_time: Duration,
}

impl OrchestratorConfig {
    /// Reads `ORCHESTRATOR_BIND` and `OPERATION_TIME_MS` through `lookup`,
    /// falling back to defaults for unset or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("ORCHESTRATOR_BIND")
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or_else(default_bind_addr);

        let operation_time = lookup("OPERATION_TIME_MS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_OPERATION_TIME_MS);

        Self {
            bind_addr,
            operation_time: Duration::from_millis(operation_time),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}
