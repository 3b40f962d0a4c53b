use super::error::CalcError;
use super::parser::infix_to_postfix;
use super::tokenizer::tokenize;
use super::types::Operation;
use crate::orchestrator::types::{ExpressionId, Task};

use std::time::Duration;

/// Output of a successful compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    /// Elementary operations in evaluation order.
    pub tasks: Vec<Task>,
    /// The value the task list reduces to.
    pub value: f64,
}

/// Compiles `expression` into the ordered task list for expression `id`.
///
/// Every emitted task carries `operation_time` and its position in the list (`seq`).
/// A lone literal compiles to an empty task list whose value is the literal itself.
pub fn compile(
    id: &ExpressionId,
    expression: &str,
    operation_time: Duration,
) -> Result<Compilation, CalcError> {
    if expression.is_empty() {
        return Err(CalcError::InvalidExpression);
    }

    let tokens = tokenize(expression);
    let postfix = infix_to_postfix(&tokens)?;

    evaluate_postfix(id, &postfix, operation_time)
}

/// Evaluates `expression` directly, without keeping the task list.
pub fn calc(expression: &str) -> Result<f64, CalcError> {
    compile(&ExpressionId::new(0), expression, Duration::ZERO).map(|c| c.value)
}

/// Walks a postfix stream with a value stack, emitting one task per operator.
///
/// The left operand is the value pushed earlier. Results are pushed back so that
/// later operators see the same stack the agents will eventually reproduce.
fn evaluate_postfix(
    id: &ExpressionId,
    postfix: &[String],
    operation_time: Duration,
) -> Result<Compilation, CalcError> {
    let mut stack: Vec<f64> = Vec::new();
    let mut tasks: Vec<Task> = Vec::new();

    for token in postfix {
        if let Ok(number) = token.parse::<f64>() {
            stack.push(number);
            continue;
        }

        let operation = token
            .parse::<Operation>()
            .map_err(|_| CalcError::InvalidCharacter(token.clone()))?;

        let (lhs, rhs) = match (stack.pop(), stack.pop()) {
            (Some(rhs), Some(lhs)) => (lhs, rhs),
            _ => return Err(CalcError::InvalidExpression),
        };

        let result = operation.apply(lhs, rhs)?;

        tasks.push(Task {
            id: id.clone(),
            seq: tasks.len(),
            arg1: lhs,
            arg2: rhs,
            operation: operation.symbol().to_string(),
            operation_time,
        });

        stack.push(result);
    }

    match stack.as_slice() {
        [value] => Ok(Compilation {
            tasks,
            value: *value,
        }),
        _ => Err(CalcError::InvalidExpression),
    }
}
