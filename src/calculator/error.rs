use thiserror::Error;

/// Failures raised while compiling an expression or executing a single operation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CalcError {
    /// Empty input, or an operand/operator count that does not reduce to one value.
    #[error("invalid expression")]
    InvalidExpression,

    #[error("mismatched parentheses")]
    MismatchedParentheses,

    /// A token that is neither a number, an operator nor a parenthesis.
    #[error("invalid character: {0}")]
    InvalidCharacter(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}
