//! Orchestrator Module
//!
//! Holds expression state and hands out tasks to agents over HTTP.
//!
//! ## Flow
//! 1. **Submission**: a client posts an expression; it is compiled into tasks which are
//!    appended to one shared FIFO queue.
//! 2. **Dispatch**: agents poll `GET /internal/task` and receive the oldest queued task.
//!    The first dispatch moves the owning expression to `in_progress`.
//! 3. **Completion**: agents post results back. Each expression counts its outstanding
//!    tasks and becomes `done` when the counter reaches zero.
//!
//! ## Submodules
//! - **`types`**: expression and task model.
//! - **`protocol`**: request/response bodies and endpoint paths.
//! - **`registry`**: the lock-guarded state container.
//! - **`handlers`**: axum handlers mapping HTTP onto registry commands.
//! - **`server`**: router assembly and the serve loop.
//! - **`config`**: orchestrator settings.

pub mod config;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod types;

#[cfg(test)]
mod tests;
