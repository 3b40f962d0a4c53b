//! Agent Module
//!
//! The compute side of the system. An agent polls the orchestrator for tasks,
//! executes each one with a simulated per-operator delay and posts the result back.
//!
//! ## Submodules
//! - **`config`**: explicit agent settings (URL, pool size, operator timings, retry).
//! - **`client`**: HTTP client for the orchestrator's internal task endpoint.
//! - **`executor`**: task execution and the worker pool.

pub mod client;
pub mod config;
pub mod executor;

pub use config::{AgentConfig, DispatchMode, OperationTimes, RetryPolicy};
pub use executor::{Agent, execute_task};
