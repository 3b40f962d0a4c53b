//! Distributed Arithmetic Calculator Library
//!
//! Evaluates arithmetic expressions by splitting them into elementary binary
//! operations and farming those out to remote agents over HTTP. Each operation is
//! treated as an expensive unit of work, with a configurable per-operator delay.
//!
//! ## Architecture Modules
//! - **`calculator`**: The expression compiler. Tokenizes an infix string, converts it to
//!   postfix and emits the ordered list of operation tasks.
//! - **`orchestrator`**: The server role. Keeps expressions and the shared task queue under
//!   one lock and exposes them through the public and internal HTTP endpoints.
//! - **`agent`**: The compute role. A pool of workers that fetch tasks, execute them with
//!   simulated cost and report results back.

pub mod agent;
pub mod calculator;
pub mod orchestrator;
