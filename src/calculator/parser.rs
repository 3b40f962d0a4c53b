use super::error::CalcError;
use super::tokenizer::is_number;
use super::types::Operation;

/// Converts infix tokens to postfix (Reverse Polish) order with the shunting-yard algorithm.
///
/// Operators of equal or lower precedence already on the stack are popped before the
/// new one is pushed, which makes every operator left-associative.
pub fn infix_to_postfix(tokens: &[String]) -> Result<Vec<String>, CalcError> {
    let mut output: Vec<String> = Vec::with_capacity(tokens.len());
    let mut operators: Vec<&str> = Vec::new();

    for token in tokens {
        let token = token.as_str();

        if is_number(token) {
            output.push(token.to_string());
        } else if token == "(" {
            operators.push(token);
        } else if token == ")" {
            loop {
                match operators.pop() {
                    Some("(") => break,
                    Some(op) => output.push(op.to_string()),
                    None => return Err(CalcError::MismatchedParentheses),
                }
            }
        } else if let Ok(incoming) = token.parse::<Operation>() {
            while let Some(&top) = operators.last() {
                // "(" never parses as an operator, so it stops the popping.
                match top.parse::<Operation>() {
                    Ok(stacked) if stacked.precedence() >= incoming.precedence() => {
                        output.push(top.to_string());
                        operators.pop();
                    }
                    _ => break,
                }
            }
            operators.push(token);
        } else {
            return Err(CalcError::InvalidCharacter(token.to_string()));
        }
    }

    while let Some(op) = operators.pop() {
        if op == "(" {
            return Err(CalcError::MismatchedParentheses);
        }
        output.push(op.to_string());
    }

    Ok(output)
}
