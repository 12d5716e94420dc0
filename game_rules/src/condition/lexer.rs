//! Tokenizer for condition expressions.

use super::ConditionError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Int(i64),
    Str(String),
    Ident(String),
    True,
    False,
    And,
    Or,
    Not,
    In,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub pos: usize,
}

fn syntax(position: usize, message: impl Into<String>) -> ConditionError {
    ConditionError::Syntax {
        position,
        message: message.into(),
    }
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ConditionError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let token = match c {
            b'(' => {
                i += 1;
                Token::LParen
            }
            b')' => {
                i += 1;
                Token::RParen
            }
            b'[' => {
                i += 1;
                Token::LBracket
            }
            b']' => {
                i += 1;
                Token::RBracket
            }
            b'.' => {
                i += 1;
                Token::Dot
            }
            b',' => {
                i += 1;
                Token::Comma
            }
            b'+' => {
                i += 1;
                Token::Plus
            }
            b'-' => {
                i += 1;
                Token::Minus
            }
            b'*' => {
                i += 1;
                Token::Star
            }
            b'/' => {
                i += 1;
                Token::Slash
            }
            b'%' => {
                i += 1;
                Token::Percent
            }
            b'=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    Token::Eq
                } else {
                    return Err(syntax(start, "assignment is not allowed, use '=='"));
                }
            }
            b'!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    Token::Ne
                } else {
                    i += 1;
                    Token::Not
                }
            }
            b'<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    Token::Le
                } else {
                    i += 1;
                    Token::Lt
                }
            }
            b'>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    Token::Ge
                } else {
                    i += 1;
                    Token::Gt
                }
            }
            b'&' => {
                if bytes.get(i + 1) == Some(&b'&') {
                    i += 2;
                    Token::And
                } else {
                    return Err(syntax(start, "expected '&&'"));
                }
            }
            b'|' => {
                if bytes.get(i + 1) == Some(&b'|') {
                    i += 2;
                    Token::Or
                } else {
                    return Err(syntax(start, "expected '||'"));
                }
            }
            b'"' | b'\'' => {
                let (text, next) = read_string(source, start)?;
                i = next;
                Token::Str(text)
            }
            b'0'..=b'9' => {
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
                    return Err(syntax(start, "only integer literals are supported"));
                }
                let digits = &source[start..i];
                let value = digits
                    .parse::<i64>()
                    .map_err(|_| syntax(start, format!("integer literal '{}' is out of range", digits)))?;
                Token::Int(value)
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                match &source[start..i] {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    "true" | "True" => Token::True,
                    "false" | "False" => Token::False,
                    word => Token::Ident(word.to_string()),
                }
            }
            _ => {
                let ch = source[start..].chars().next().unwrap_or('?');
                return Err(syntax(start, format!("unexpected character '{}'", ch)));
            }
        };

        tokens.push(Spanned { token, pos: start });
    }

    Ok(tokens)
}

/// Read a quoted string starting at `start`; returns the text and the offset past the closing quote.
fn read_string(source: &str, start: usize) -> Result<(String, usize), ConditionError> {
    let quote = source.as_bytes()[start] as char;
    let mut text = String::new();
    let mut chars = source[start + 1..].char_indices();

    while let Some((offset, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, escaped @ ('\\' | '\'' | '"'))) => text.push(escaped),
                Some((esc_offset, other)) => {
                    return Err(syntax(
                        start + 1 + esc_offset,
                        format!("unknown escape '\\{}'", other),
                    ))
                }
                None => break,
            },
            c if c == quote => return Ok((text, start + 1 + offset + 1)),
            c => text.push(c),
        }
    }

    Err(syntax(start, "unterminated string literal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_operators_and_keywords() {
        assert_eq!(
            kinds("a >= 10 && not b || c != 'x'"),
            vec![
                Token::Ident("a".into()),
                Token::Ge,
                Token::Int(10),
                Token::And,
                Token::Not,
                Token::Ident("b".into()),
                Token::Or,
                Token::Ident("c".into()),
                Token::Ne,
                Token::Str("x".into()),
            ]
        );
    }

    #[test]
    fn test_capitalized_literals() {
        assert_eq!(kinds("True and False"), vec![Token::True, Token::And, Token::False]);
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(kinds(r#""a\"b""#), vec![Token::Str("a\"b".into())]);
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("  day").unwrap();
        assert_eq!(tokens[0].pos, 2);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(tokenize("a = 1"), Err(ConditionError::Syntax { position: 2, .. })));
        assert!(tokenize("'open").is_err());
        assert!(tokenize("1.5").is_err());
        assert!(tokenize("a & b").is_err());
        assert!(tokenize("x $ y").is_err());
        assert!(tokenize("99999999999999999999").is_err());
    }
}
