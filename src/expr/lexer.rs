//! Tokenizer for segment expressions.
//!
//! Hand-rolled scanner over a byte position; string literals accept single
//! or double quotes with backslash escapes. Positions are byte offsets into
//! the segment, carried on errors so the user can see where a segment broke.

use crate::expr::error::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(f64),
    Str(String),

    // Punctuation
    Dot,        // .
    Spread,     // ...
    LBracket,   // [
    RBracket,   // ]
    LBrace,     // {
    RBrace,     // }
    LParen,     // (
    RParen,     // )
    Comma,      // ,
    Colon,      // :
    Question,   // ?
    Arrow,      // =>

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    Eq,         // ==
    NotEq,      // !=
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=
    AndAnd,     // &&
    OrOr,       // ||
    Bang,       // !
}

/// A token plus the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub pos: usize,
}

/// Tokenize a whole segment up front. Segments are short (a handful of
/// tokens), so there is no point in lexing lazily.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, ExprError> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let c = bytes[i] as char;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c == '\'' || c == '"' {
            let (s, next) = lex_string(input, i, c)?;
            tokens.push(SpannedToken { token: Token::Str(s), pos: start });
            i = next;
            continue;
        }

        if c.is_ascii_digit() {
            let (n, next) = lex_number(input, i)?;
            tokens.push(SpannedToken { token: Token::Number(n), pos: start });
            i = next;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            let mut end = i + 1;
            while end < bytes.len() {
                let b = bytes[end] as char;
                if b.is_ascii_alphanumeric() || b == '_' || b == '$' {
                    end += 1;
                } else {
                    break;
                }
            }
            tokens.push(SpannedToken {
                token: Token::Ident(input[i..end].to_string()),
                pos: start,
            });
            i = end;
            continue;
        }

        let rest = &input[i..];
        let (token, len) = if rest.starts_with("...") {
            (Token::Spread, 3)
        } else if rest.starts_with("=>") {
            (Token::Arrow, 2)
        } else if rest.starts_with("==") {
            (Token::Eq, 2)
        } else if rest.starts_with("!=") {
            (Token::NotEq, 2)
        } else if rest.starts_with("<=") {
            (Token::LtEq, 2)
        } else if rest.starts_with(">=") {
            (Token::GtEq, 2)
        } else if rest.starts_with("&&") {
            (Token::AndAnd, 2)
        } else if rest.starts_with("||") {
            (Token::OrOr, 2)
        } else {
            let t = match c {
                '.' => Token::Dot,
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                '{' => Token::LBrace,
                '}' => Token::RBrace,
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                ':' => Token::Colon,
                '?' => Token::Question,
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '%' => Token::Percent,
                '<' => Token::Lt,
                '>' => Token::Gt,
                '!' => Token::Bang,
                _ => {
                    return Err(ExprError::Parse {
                        message: format!("unexpected character `{c}`"),
                        position: i,
                    });
                }
            };
            (t, 1)
        };
        tokens.push(SpannedToken { token, pos: start });
        i += len;
    }

    Ok(tokens)
}

/// Lex a quoted string starting at `start` (which holds the quote char).
/// Returns the unescaped contents and the position after the closing quote.
fn lex_string(input: &str, start: usize, quote: char) -> Result<(String, usize), ExprError> {
    let mut out = String::new();
    let mut chars = input[start + 1..].char_indices();

    while let Some((off, c)) = chars.next() {
        if c == quote {
            return Ok((out, start + 1 + off + c.len_utf8()));
        }
        if c == '\\' {
            match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, '0')) => out.push('\0'),
                Some((_, e)) => out.push(e),
                None => break,
            }
            continue;
        }
        out.push(c);
    }

    Err(ExprError::Parse {
        message: "unterminated string literal".into(),
        position: start,
    })
}

/// Lex a number: integer or decimal, no exponent (segments never need one;
/// `parse` handles full JSON numbers).
fn lex_number(input: &str, start: usize) -> Result<(f64, usize), ExprError> {
    let bytes = input.as_bytes();
    let mut end = start;
    let mut seen_dot = false;

    while end < bytes.len() {
        let c = bytes[end] as char;
        if c.is_ascii_digit() {
            end += 1;
        } else if c == '.' && !seen_dot && end + 1 < bytes.len() && bytes[end + 1].is_ascii_digit()
        {
            // Only consume the dot when a digit follows, so `1.foo`
            // still lexes as number, dot, ident.
            seen_dot = true;
            end += 1;
        } else {
            break;
        }
    }

    input[start..end].parse::<f64>().map(|n| (n, end)).map_err(|_| ExprError::Parse {
        message: format!("invalid number `{}`", &input[start..end]),
        position: start,
    })
}
