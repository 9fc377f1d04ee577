//! Recursive-descent parser for segment expressions.
//!
//! Grammar, precedence low to high:
//!
//! ```text
//! lambda   := IDENT '=>' ternary | ternary
//! ternary  := or ('?' ternary ':' ternary)?
//! or       := and ('||' and)*
//! and      := equality ('&&' equality)*
//! equality := compare (('==' | '!=') compare)*
//! compare  := additive (('<' | '<=' | '>' | '>=') additive)*
//! additive := multiplicative (('+' | '-') multiplicative)*
//! multiplicative := unary (('*' | '/' | '%') unary)*
//! unary    := ('!' | '-') unary | postfix
//! postfix  := primary ('.' IDENT | '[' ternary ']' | '(' args ')')*
//! primary  := NUMBER | STRING | 'true' | 'false' | 'null' | IDENT
//!           | '(' lambda ')' | '[' elements ']' | '{' entries '}'
//! ```
//!
//! Object entries: `key: expr`, `"key": expr`, shorthand `key`, and
//! `...expr` spreads.

use crate::expr::error::ExprError;
use crate::expr::lexer::{SpannedToken, Token, tokenize};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Ident(String),
    Array(Vec<Expr>),
    Object(Vec<ObjectEntry>),
    Lambda { param: String, body: Box<Expr> },
    Field { target: Box<Expr>, name: String },
    Index { target: Box<Expr>, index: Box<Expr> },
    Call { target: Box<Expr>, args: Vec<Expr> },
    Unary { op: UnaryOp, expr: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Cond { cond: Box<Expr>, then: Box<Expr>, otherwise: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectEntry {
    /// `key: value` or `"key": value`; shorthand `key` stores
    /// `Ident(key)` as the value.
    Pair { key: String, value: Expr },
    /// `...expr`
    Spread(Expr),
}

/// Parse a full segment. Trailing tokens are an error: a segment is one
/// expression, not a sequence.
pub fn parse(input: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0, input_len: input.len() };
    let expr = parser.lambda()?;
    if let Some(t) = parser.peek_spanned() {
        return Err(ExprError::Parse {
            message: format!("unexpected trailing `{:?}`", t.token),
            position: t.pos,
        });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_spanned(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn peek2(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).map(|t| t.token.clone());
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn here(&self) -> usize {
        self.peek_spanned().map_or(self.input_len, |t| t.pos)
    }

    fn expect(&mut self, want: &Token, what: &str) -> Result<(), ExprError> {
        if self.peek() == Some(want) {
            self.pos += 1;
            Ok(())
        } else {
            Err(ExprError::Parse {
                message: format!("expected {what}"),
                position: self.here(),
            })
        }
    }

    fn eat(&mut self, want: &Token) -> bool {
        if self.peek() == Some(want) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ── Precedence levels ──

    fn lambda(&mut self) -> Result<Expr, ExprError> {
        if let (Some(Token::Ident(name)), Some(Token::Arrow)) = (self.peek(), self.peek2()) {
            let param = name.clone();
            self.pos += 2;
            let body = self.lambda()?;
            return Ok(Expr::Lambda { param, body: Box::new(body) });
        }
        self.ternary()
    }

    fn ternary(&mut self) -> Result<Expr, ExprError> {
        let cond = self.or()?;
        if self.eat(&Token::Question) {
            let then = self.ternary()?;
            self.expect(&Token::Colon, "`:` in conditional")?;
            let otherwise = self.ternary()?;
            return Ok(Expr::Cond {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(cond)
    }

    fn or(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.equality()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.equality()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.compare()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::NotEq,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.compare()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn compare(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::LtEq) => BinaryOp::LtEq,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::GtEq) => BinaryOp::GtEq,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek() {
            Some(Token::Bang) => Some(UnaryOp::Not),
            Some(Token::Minus) => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let expr = self.unary()?;
            return Ok(Expr::Unary { op, expr: Box::new(expr) });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    let name = match self.advance() {
                        Some(Token::Ident(n)) => n,
                        _ => {
                            return Err(ExprError::Parse {
                                message: "expected property name after `.`".into(),
                                position: self.here(),
                            });
                        }
                    };
                    expr = Expr::Field { target: Box::new(expr), name };
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.ternary()?;
                    self.expect(&Token::RBracket, "`]`")?;
                    expr = Expr::Index { target: Box::new(expr), index: Box::new(index) };
                }
                Some(Token::LParen) => {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if !self.eat(&Token::RParen) {
                        loop {
                            args.push(self.lambda()?);
                            if self.eat(&Token::Comma) {
                                continue;
                            }
                            self.expect(&Token::RParen, "`)` after arguments")?;
                            break;
                        }
                    }
                    expr = Expr::Call { target: Box::new(expr), args };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.peek().cloned() {
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            Some(Token::Str(s)) => {
                self.pos += 1;
                Ok(Expr::Str(s))
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                match name.as_str() {
                    "true" => Ok(Expr::Bool(true)),
                    "false" => Ok(Expr::Bool(false)),
                    "null" => Ok(Expr::Null),
                    _ => Ok(Expr::Ident(name)),
                }
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.lambda()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Some(Token::LBracket) => {
                self.pos += 1;
                let mut elements = Vec::new();
                if !self.eat(&Token::RBracket) {
                    loop {
                        elements.push(self.lambda()?);
                        if self.eat(&Token::Comma) {
                            if self.eat(&Token::RBracket) {
                                break; // trailing comma
                            }
                            continue;
                        }
                        self.expect(&Token::RBracket, "`]` after array elements")?;
                        break;
                    }
                }
                Ok(Expr::Array(elements))
            }
            Some(Token::LBrace) => {
                self.pos += 1;
                self.object()
            }
            _ => Err(ExprError::Parse {
                message: "expected an expression".into(),
                position: self.here(),
            }),
        }
    }

    /// Object literal body; the opening `{` is already consumed.
    fn object(&mut self) -> Result<Expr, ExprError> {
        let mut entries = Vec::new();
        if self.eat(&Token::RBrace) {
            return Ok(Expr::Object(entries));
        }
        loop {
            if self.eat(&Token::Spread) {
                let expr = self.lambda()?;
                entries.push(ObjectEntry::Spread(expr));
            } else {
                let key = match self.advance() {
                    Some(Token::Ident(k)) => k,
                    Some(Token::Str(k)) => k,
                    _ => {
                        return Err(ExprError::Parse {
                            message: "expected object key".into(),
                            position: self.here(),
                        });
                    }
                };
                if self.eat(&Token::Colon) {
                    let value = self.lambda()?;
                    entries.push(ObjectEntry::Pair { key, value });
                } else {
                    // Shorthand `{ key }` means `{ key: key }`
                    let value = Expr::Ident(key.clone());
                    entries.push(ObjectEntry::Pair { key, value });
                }
            }
            if self.eat(&Token::Comma) {
                if self.eat(&Token::RBrace) {
                    break; // trailing comma
                }
                continue;
            }
            self.expect(&Token::RBrace, "`}` after object entries")?;
            break;
        }
        Ok(Expr::Object(entries))
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
}
