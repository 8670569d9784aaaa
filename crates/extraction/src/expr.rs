//! Sandboxed arithmetic expressions
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | '$' INDEX | '(' expr ')'
//! ```
//!
//! Integer operands stay exact. `+`, `-` and `*` fall back to float on
//! overflow, `/` always yields a float.

use std::fmt;

use contracts::{Number, SampleError};

use crate::error::{CompileError, Result};

/// Maximum nesting of unary operators and parentheses
const MAX_DEPTH: usize = 64;

/// Maximum number of nodes in a parsed tree, bounds evaluation recursion
const MAX_NODES: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(Number),
    Placeholder(usize),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    position: usize,
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;
        let kind = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                pos += 1;
                continue;
            }
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'$' => {
                pos += 1;
                let digits = scan_digits(bytes, pos);
                if digits == pos {
                    return Err(CompileError::expression(start, "expected index after '$'"));
                }
                let index = source[pos..digits]
                    .parse::<usize>()
                    .map_err(|e| CompileError::expression(start, e.to_string()))?;
                pos = digits;
                tokens.push(Token {
                    kind: TokenKind::Placeholder(index),
                    position: start,
                });
                continue;
            }
            b'0'..=b'9' | b'.' => {
                let (number, end) = scan_number(source, pos)?;
                pos = end;
                tokens.push(Token {
                    kind: TokenKind::Number(number),
                    position: start,
                });
                continue;
            }
            _ => {
                let ch = source[pos..].chars().next().unwrap_or('?');
                return Err(CompileError::expression(
                    pos,
                    format!("unexpected character '{ch}'"),
                ));
            }
        };
        pos += 1;
        tokens.push(Token {
            kind,
            position: start,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        position: bytes.len(),
    });
    Ok(tokens)
}

fn scan_digits(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    pos
}

/// Scan `digits [. digits] [e [+-] digits]`
fn scan_number(source: &str, start: usize) -> Result<(Number, usize)> {
    let bytes = source.as_bytes();
    let mut pos = scan_digits(bytes, start);
    let mut is_float = false;

    if pos < bytes.len() && bytes[pos] == b'.' {
        is_float = true;
        pos = scan_digits(bytes, pos + 1);
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp = pos + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let end = scan_digits(bytes, exp);
        if end == exp {
            return Err(CompileError::expression(pos, "malformed exponent"));
        }
        is_float = true;
        pos = end;
    }

    let text = &source[start..pos];
    let invalid = || CompileError::expression(start, format!("invalid number '{text}'"));
    let number = if is_float {
        Number::Float(text.parse::<f64>().map_err(|_| invalid())?)
    } else {
        match text.parse::<i64>() {
            Ok(v) => Number::Int(v),
            Err(_) => Number::Float(text.parse::<f64>().map_err(|_| invalid())?),
        }
    };
    Ok((number, pos))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Number),
    Var(usize),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
    nodes: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // tokenize always terminates the stream with Eof
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        token
    }

    fn enter(&mut self, position: usize) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CompileError::expression(
                position,
                format!("nesting deeper than {MAX_DEPTH} levels"),
            ));
        }
        Ok(())
    }

    fn node(&mut self, position: usize) -> Result<()> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(CompileError::expression(
                position,
                format!("expression larger than {MAX_NODES} nodes"),
            ));
        }
        Ok(())
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let position = self.advance().position;
            self.node(position)?;
            let right = self.parse_term()?;
            left = Expr::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            let position = self.advance().position;
            self.node(position)?;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Minus | TokenKind::Plus => {
                self.advance();
                self.enter(token.position)?;
                let operand = self.parse_unary()?;
                self.depth -= 1;
                if token.kind == TokenKind::Minus {
                    self.node(token.position)?;
                }
                Ok(if token.kind == TokenKind::Minus {
                    Expr::Neg(Box::new(operand))
                } else {
                    operand
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number(n) => {
                self.node(token.position)?;
                Ok(Expr::Literal(n))
            }
            TokenKind::Placeholder(index) => {
                self.node(token.position)?;
                Ok(Expr::Var(index))
            }
            TokenKind::LParen => {
                self.enter(token.position)?;
                let inner = self.parse_expr()?;
                self.depth -= 1;
                let close = self.advance();
                if close.kind != TokenKind::RParen {
                    return Err(CompileError::expression(close.position, "expected ')'"));
                }
                Ok(inner)
            }
            TokenKind::Eof => Err(CompileError::expression(
                token.position,
                "unexpected end of expression",
            )),
            other => Err(CompileError::expression(
                token.position,
                format!("unexpected token {other:?}"),
            )),
        }
    }
}

/// Compiled arithmetic expression over placeholder variables `$0..$n`
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    /// Parse an expression
    ///
    /// # Errors
    /// `CompileError::Expression` with the byte position of the offending token.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            current: 0,
            depth: 0,
            nodes: 0,
        };
        let root = parser.parse_expr()?;
        let trailing = parser.peek();
        if trailing.kind != TokenKind::Eof {
            return Err(CompileError::expression(
                trailing.position,
                "unexpected trailing input",
            ));
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder indices referenced by the expression, ascending, deduplicated
    pub fn placeholders(&self) -> Vec<usize> {
        fn walk(expr: &Expr, out: &mut Vec<usize>) {
            match expr {
                Expr::Literal(_) => {}
                Expr::Var(i) => out.push(*i),
                Expr::Neg(inner) => walk(inner, out),
                Expr::Binary { lhs, rhs, .. } => {
                    walk(lhs, out);
                    walk(rhs, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Evaluate against bound variables, `$k` reading `vars[k]`
    ///
    /// # Errors
    /// `SampleError::Expression` on division by zero, unbound placeholders
    /// or a non-finite result.
    pub fn evaluate(&self, vars: &[Number]) -> std::result::Result<Number, SampleError> {
        let value = eval(&self.root, vars)?;
        if !value.is_finite() {
            return Err(SampleError::expression(format!(
                "'{}' evaluated to non-finite value {value}",
                self.source
            )));
        }
        Ok(value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn eval(expr: &Expr, vars: &[Number]) -> std::result::Result<Number, SampleError> {
    match expr {
        Expr::Literal(n) => Ok(*n),
        Expr::Var(i) => vars
            .get(*i)
            .copied()
            .ok_or_else(|| SampleError::expression(format!("unbound placeholder ${i}"))),
        Expr::Neg(inner) => Ok(match eval(inner, vars)? {
            Number::Int(v) => v
                .checked_neg()
                .map(Number::Int)
                .unwrap_or(Number::Float(-(v as f64))),
            Number::Float(v) => Number::Float(-v),
        }),
        Expr::Binary { op, lhs, rhs } => {
            let a = eval(lhs, vars)?;
            let b = eval(rhs, vars)?;
            apply(*op, a, b)
        }
    }
}

fn apply(op: BinaryOp, a: Number, b: Number) -> std::result::Result<Number, SampleError> {
    if op == BinaryOp::Div {
        let divisor = b.as_f64();
        if divisor == 0.0 {
            return Err(SampleError::expression(format!(
                "division by zero ({a} / {b})"
            )));
        }
        return Ok(Number::Float(a.as_f64() / divisor));
    }

    if let (Number::Int(x), Number::Int(y)) = (a, b) {
        let exact = match op {
            BinaryOp::Add => x.checked_add(y),
            BinaryOp::Sub => x.checked_sub(y),
            BinaryOp::Mul => x.checked_mul(y),
            BinaryOp::Div => None,
        };
        if let Some(v) = exact {
            return Ok(Number::Int(v));
        }
    }

    let (x, y) = (a.as_f64(), b.as_f64());
    Ok(Number::Float(match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
    }))
}
