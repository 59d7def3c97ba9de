//! Syntactic validation (§4.2): a tokenising brace/paren/bracket balance
//! checker for JS/TS family files. Correctly skips string literals,
//! template literals, and comments so a stray bracket inside a string
//! doesn't register as a real opener. All other extensions pass with a
//! no-op.

const VALIDATED_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    UnbalancedOpener(char),
    UnexpectedCloser(char),
    UnclosedString(char),
    UnclosedTemplateLiteral,
    UnclosedBlockComment,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnbalancedOpener(c) => write!(f, "unclosed '{c}'"),
            Self::UnexpectedCloser(c) => write!(f, "unexpected closing '{c}' with no matching opener"),
            Self::UnclosedString(c) => write!(f, "unterminated string literal starting with '{c}'"),
            Self::UnclosedTemplateLiteral => write!(f, "unterminated template literal"),
            Self::UnclosedBlockComment => write!(f, "unterminated block comment"),
        }
    }
}

impl std::error::Error for SyntaxError {}

/// Validate `content` as if it were a file with the given extension
/// (without the leading dot). Returns `Ok(())` for extensions outside
/// [`VALIDATED_EXTENSIONS`] unconditionally.
pub fn validate(extension: &str, content: &str) -> Result<(), SyntaxError> {
    if !VALIDATED_EXTENSIONS.contains(&extension) {
        return Ok(());
    }
    check_balance(content)
}

fn matching_opener(closer: char) -> char {
    match closer {
        ')' => '(',
        ']' => '[',
        '}' => '{',
        _ => unreachable!(),
    }
}

fn check_balance(content: &str) -> Result<(), SyntaxError> {
    let mut stack: Vec<char> = Vec::new();
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => consume_string(c, &mut chars)?,
            '`' => consume_template_literal(&mut chars)?,
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut closed = false;
                while let Some(next) = chars.next() {
                    if next == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(SyntaxError::UnclosedBlockComment);
                }
            }
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = matching_opener(c);
                match stack.pop() {
                    Some(top) if top == expected => {}
                    _ => return Err(SyntaxError::UnexpectedCloser(c)),
                }
            }
            _ => {}
        }
    }

    if let Some(unclosed) = stack.into_iter().last() {
        return Err(SyntaxError::UnbalancedOpener(unclosed));
    }
    Ok(())
}

fn consume_string(
    quote: char,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<(), SyntaxError> {
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            c if c == quote => return Ok(()),
            '\n' => return Err(SyntaxError::UnclosedString(quote)),
            _ => {}
        }
    }
    Err(SyntaxError::UnclosedString(quote))
}

/// Template literals can contain `${ ... }` interpolations whose braces
/// participate in the outer balance check, so we recursively track
/// nested braces rather than treating the whole literal as opaque text.
fn consume_template_literal(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<(), SyntaxError> {
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '`' => return Ok(()),
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                let mut depth = 1;
                while depth > 0 {
                    match chars.next() {
                        Some('{') => depth += 1,
                        Some('}') => depth -= 1,
                        Some('\'') | Some('"') => {}
                        Some(_) => {}
                        None => return Err(SyntaxError::UnclosedTemplateLiteral),
                    }
                }
            }
            _ => {}
        }
    }
    Err(SyntaxError::UnclosedTemplateLiteral)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_js_passes() {
        assert!(validate("js", "function f() { return [1, 2, (3 + 4)]; }").is_ok());
    }

    #[test]
    fn unbalanced_brace_fails() {
        assert!(validate("ts", "function f() { return 1; {").is_err());
    }

    #[test]
    fn unexpected_closer_fails() {
        assert!(validate("ts", "function f() { return 1; } }").is_err());
    }

    #[test]
    fn brace_inside_string_is_ignored() {
        assert!(validate("js", r#"const s = "{ unbalanced";"#).is_ok());
    }

    #[test]
    fn brace_inside_template_literal_text_is_ignored() {
        assert!(validate("js", "const s = `has a { here`;").is_ok());
    }

    #[test]
    fn interpolation_braces_are_tracked() {
        assert!(validate("ts", "const s = `${fn({a: 1})}`;").is_ok());
        assert!(validate("ts", "const s = `${fn({a: 1})`;").is_err());
    }

    #[test]
    fn line_comment_hides_brace() {
        assert!(validate("js", "function f() { // unbalanced {\n return 1; }").is_ok());
    }

    #[test]
    fn block_comment_hides_brace() {
        assert!(validate("js", "function f() { /* { */ return 1; }").is_ok());
    }

    #[test]
    fn unclosed_block_comment_fails() {
        assert!(validate("js", "function f() { /* never closed").is_err());
    }

    #[test]
    fn unclosed_string_fails() {
        assert!(validate("js", "const s = \"never closed").is_err());
    }

    #[test]
    fn non_validated_extension_is_noop() {
        assert!(validate("py", "def f(:\n    return [").is_ok());
        assert!(validate("rs", "fn f( {{{{").is_ok());
    }
}
