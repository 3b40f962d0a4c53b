/// Splits an infix expression into tokens.
///
/// Whitespace is skipped. Operators and parentheses become single-character tokens;
/// every other character is accumulated into the current literal, so junk such as
/// `a` or `3^2` survives as a token and is rejected later by the parser.
pub fn tokenize(expression: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut previous: Option<char> = None;

    for ch in expression.chars() {
        if ch.is_whitespace() {
            previous = Some(ch);
            continue;
        }

        if is_symbol(ch) {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }

            // Unary minus: glued to the literal that follows it.
            if ch == '-' && matches!(previous, None | Some('(')) {
                current.push(ch);
            } else {
                tokens.push(ch.to_string());
            }
        } else {
            current.push(ch);
        }

        previous = Some(ch);
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn is_symbol(ch: char) -> bool {
    matches!(ch, '+' | '-' | '*' | '/' | '(' | ')')
}

/// True when the token parses as a floating point literal.
pub fn is_number(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}
