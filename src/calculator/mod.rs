//! Expression Compiler Module
//!
//! Turns an infix arithmetic string into an ordered list of elementary binary
//! operation tasks that agents can execute one by one.
//!
//! ## Pipeline
//! 1. **Tokenize**: split the raw string into numeric literals, operators and parentheses.
//!    A `-` at the start of the input or right after `(` belongs to the following literal.
//! 2. **Infix to Postfix**: shunting-yard conversion with left-associative operators.
//! 3. **Postfix to Tasks**: evaluate the postfix stream on a value stack, emitting one
//!    `Task` per operator in evaluation order.
//!
//! Every operator is evaluated during compilation as well, so the task list is a record
//! of arithmetic already known to be valid. Agents repeat the work to simulate its cost.
//!
//! ## Submodules
//! - **`tokenizer`**: character scanning.
//! - **`parser`**: infix to postfix conversion.
//! - **`compiler`**: postfix evaluation, task emission and direct evaluation.
//! - **`types`**: the supported `Operation` set.
//! - **`error`**: the `CalcError` taxonomy shared with the agent.

pub mod compiler;
pub mod error;
pub mod parser;
pub mod tokenizer;
pub mod types;

pub use compiler::{calc, compile, Compilation};
pub use error::CalcError;
pub use types::Operation;
