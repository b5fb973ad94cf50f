//! Arithmetic expression parser and evaluator used by `calculate`.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/' | '//' | '%') factor)*
//! factor := ('+' | '-') factor | power
//! power  := atom ('**' factor)?
//! atom   := NUMBER | NAME | NAME '(' args ')' | '(' expr ')'
//! ```
//!
//! Names are restricted to the constants `pi` and `e` and a fixed set of
//! math functions. Integers stay integers until an operation produces a
//! float, so `2 + 2` gives `4` while `sqrt(16)` gives `4.0`.

use std::f64::consts;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

const MAX_DEPTH: usize = 64;

/// A numeric value: integer or float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

/// Render a float the way a calculator user expects: always with a decimal
/// point, switching to exponent notation for very large or small values.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let abs = x.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let repr = format!("{:e}", x);
        let (mantissa, exp) = repr.split_once('e').unwrap_or((repr.as_str(), "0"));
        let exp: i32 = exp.parse().unwrap_or(0);
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exp.abs());
    }

    let repr = format!("{}", x);
    if repr.contains('.') {
        repr
    } else {
        format!("{}.0", repr)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("{0}")]
    Syntax(String),

    #[error("name '{0}' is not defined")]
    UnknownName(String),

    #[error("math domain error")]
    Domain,

    #[error("math range error")]
    Range,

    #[error("{0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Number),
    Ident(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{}", n),
            Token::Ident(name) => f.write_str(name),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::DoubleStar => f.write_str("**"),
            Token::Slash => f.write_str("/"),
            Token::DoubleSlash => f.write_str("//"),
            Token::Percent => f.write_str("%"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
        }
    }
}

struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, EvalError> {
        let mut tokens = Vec::new();

        while let Some(&(pos, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
                continue;
            }

            let token = match c {
                '0'..='9' | '.' => self.number(pos)?,
                c if c.is_ascii_alphabetic() || c == '_' => self.ident(pos),
                _ => {
                    self.chars.next();
                    match c {
                        '+' => Token::Plus,
                        '-' => Token::Minus,
                        '*' if self.eat('*') => Token::DoubleStar,
                        '*' => Token::Star,
                        '/' if self.eat('/') => Token::DoubleSlash,
                        '/' => Token::Slash,
                        '%' => Token::Percent,
                        '(' => Token::LParen,
                        ')' => Token::RParen,
                        ',' => Token::Comma,
                        other => {
                            return Err(EvalError::Syntax(format!(
                                "unexpected character '{}' at position {}",
                                other, pos
                            )))
                        }
                    }
                }
            };
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek().map(|&(_, c)| c) == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn eat_digits(&mut self) -> usize {
        let mut count = 0;
        while self.chars.next_if(|&(_, c)| c.is_ascii_digit()).is_some() {
            count += 1;
        }
        count
    }

    fn end(&mut self) -> usize {
        self.chars.peek().map_or(self.src.len(), |&(i, _)| i)
    }

    fn number(&mut self, start: usize) -> Result<Token, EvalError> {
        let mut is_float = false;
        let mut digits = self.eat_digits();

        if self.eat('.') {
            is_float = true;
            digits += self.eat_digits();
        }

        if digits == 0 {
            return Err(EvalError::Syntax(format!(
                "unexpected character '.' at position {}",
                start
            )));
        }

        if self.chars.next_if(|&(_, c)| c == 'e' || c == 'E').is_some() {
            is_float = true;
            self.chars.next_if(|&(_, c)| c == '+' || c == '-');
            if self.eat_digits() == 0 {
                let end = self.end();
                return Err(EvalError::Syntax(format!(
                    "invalid number literal '{}'",
                    &self.src[start..end]
                )));
            }
        }

        let end = self.end();
        let literal = &self.src[start..end];
        let invalid = || EvalError::Syntax(format!("invalid number literal '{}'", literal));

        if !is_float {
            if let Ok(i) = literal.parse::<i64>() {
                return Ok(Token::Num(Number::Int(i)));
            }
        }
        literal
            .parse::<f64>()
            .map(|f| Token::Num(Number::Float(f)))
            .map_err(|_| invalid())
    }

    fn ident(&mut self, start: usize) -> Token {
        while self
            .chars
            .next_if(|&(_, c)| c.is_ascii_alphanumeric() || c == '_')
            .is_some()
        {}
        let end = self.end();
        Token::Ident(self.src[start..end].to_string())
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------
//
// The parser evaluates as it goes instead of building a tree, so stack use is
// bounded by nesting depth alone. A long flat chain like `1+1+...+1` is folded
// in a loop.

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

/// Value of a parsed sub-expression. The outer `Result` of each parser method
/// carries syntax errors, which win over any evaluation error held here.
type Value = Result<Number, EvalError>;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn parse(tokens: Vec<Token>) -> Result<Value, EvalError> {
        if tokens.is_empty() {
            return Err(EvalError::Syntax("empty expression".to_string()));
        }

        let mut parser = Self {
            tokens,
            pos: 0,
            depth: 0,
        };
        let value = parser.expr()?;
        match parser.peek() {
            None => Ok(value),
            Some(token) => Err(EvalError::Syntax(format!("unexpected '{}'", token))),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), EvalError> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(EvalError::Syntax(format!(
                "expected '{}', found '{}'",
                expected, token
            ))),
            None => Err(EvalError::Syntax(format!(
                "expected '{}' before end of expression",
                expected
            ))),
        }
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::Syntax("expression is nested too deeply".to_string()));
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Value, EvalError> {
        self.enter()?;
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = combine(op, lhs, rhs);
        }
        self.depth -= 1;
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Value, EvalError> {
        let mut lhs = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::DoubleSlash) => BinOp::FloorDiv,
                Some(Token::Percent) => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.factor()?;
            lhs = combine(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Value, EvalError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.enter()?;
                let operand = self.factor()?;
                self.depth -= 1;
                Ok(operand.map(negate))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.enter()?;
                let operand = self.factor()?;
                self.depth -= 1;
                Ok(operand)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Value, EvalError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::DoubleStar) {
            self.pos += 1;
            self.enter()?;
            let exponent = self.factor()?;
            self.depth -= 1;
            return Ok(combine(BinOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Value, EvalError> {
        match self.advance() {
            Some(Token::Num(n)) => Ok(Ok(n)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.args()?;
                    Ok(args
                        .into_iter()
                        .collect::<Result<Vec<_>, _>>()
                        .and_then(|values| call(&name, &values)))
                } else {
                    Ok(constant(&name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(token) => Err(EvalError::Syntax(format!("unexpected '{}'", token))),
            None => Err(EvalError::Syntax("unexpected end of expression".to_string())),
        }
    }

    /// Arguments after the opening parenthesis, consuming the closing one.
    fn args(&mut self) -> Result<Vec<Value>, EvalError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.advance() {
                Some(Token::Comma) if self.peek() == Some(&Token::RParen) => {
                    self.pos += 1;
                    return Ok(args);
                }
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(token) => {
                    return Err(EvalError::Syntax(format!(
                        "expected ',' or ')', found '{}'",
                        token
                    )))
                }
                None => {
                    return Err(EvalError::Syntax(
                        "expected ')' before end of expression".to_string(),
                    ))
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

const FUNCTIONS: &[&str] = &[
    "abs", "round", "min", "max", "sqrt", "pow", "sin", "cos", "tan", "log", "log10", "ceil",
    "floor",
];

/// Parse and evaluate an arithmetic expression.
pub fn evaluate(input: &str) -> Result<Number, EvalError> {
    let tokens = Lexer::new(input).tokenize()?;
    Parser::parse(tokens)?
}

/// Apply `op` once both operands evaluated; the leftmost failure is kept.
fn combine(op: BinOp, lhs: Value, rhs: Value) -> Value {
    binary(op, lhs?, rhs?)
}

fn negate(n: Number) -> Number {
    match n {
        Number::Int(i) => i
            .checked_neg()
            .map_or(Number::Float(-(i as f64)), Number::Int),
        Number::Float(f) => Number::Float(-f),
    }
}

fn constant(name: &str) -> Result<Number, EvalError> {
    match name {
        "pi" => Ok(Number::Float(consts::PI)),
        "e" => Ok(Number::Float(consts::E)),
        f if FUNCTIONS.contains(&f) => Err(EvalError::Invalid(format!(
            "function '{}' must be called with arguments",
            f
        ))),
        other => Err(EvalError::UnknownName(other.to_string())),
    }
}

fn binary(op: BinOp, lhs: Number, rhs: Number) -> Result<Number, EvalError> {
    use Number::{Float, Int};

    match op {
        BinOp::Add => Ok(match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_add(b).map_or(Float(a as f64 + b as f64), Int),
            _ => Float(lhs.as_f64() + rhs.as_f64()),
        }),
        BinOp::Sub => Ok(match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_sub(b).map_or(Float(a as f64 - b as f64), Int),
            _ => Float(lhs.as_f64() - rhs.as_f64()),
        }),
        BinOp::Mul => Ok(match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_mul(b).map_or(Float(a as f64 * b as f64), Int),
            _ => Float(lhs.as_f64() * rhs.as_f64()),
        }),
        BinOp::Div => {
            if rhs.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Float(lhs.as_f64() / rhs.as_f64()))
        }
        BinOp::FloorDiv => {
            if rhs.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            Ok(match (lhs, rhs) {
                (Int(a), Int(b)) => match a.checked_div(b) {
                    Some(q) if a % b != 0 && ((a < 0) != (b < 0)) => Int(q - 1),
                    Some(q) => Int(q),
                    None => Float((a as f64 / b as f64).floor()),
                },
                _ => Float((lhs.as_f64() / rhs.as_f64()).floor()),
            })
        }
        BinOp::Mod => {
            if rhs.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            Ok(match (lhs, rhs) {
                (Int(a), Int(b)) => {
                    let r = a.wrapping_rem(b);
                    Int(if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r })
                }
                _ => {
                    let (a, b) = (lhs.as_f64(), rhs.as_f64());
                    let r = a % b;
                    Float(if r != 0.0 && ((r < 0.0) != (b < 0.0)) { r + b } else { r })
                }
            })
        }
        BinOp::Pow => power(lhs, rhs),
    }
}

fn power(base: Number, exp: Number) -> Result<Number, EvalError> {
    if let (Number::Int(b), Number::Int(e)) = (base, exp) {
        if e >= 0 {
            if let Some(v) = u32::try_from(e).ok().and_then(|e| b.checked_pow(e)) {
                return Ok(Number::Int(v));
            }
        } else if b == 0 {
            return Err(EvalError::DivisionByZero);
        }
    }

    let (b, e) = (base.as_f64(), exp.as_f64());
    if b == 0.0 && e < 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    if b < 0.0 && e.fract() != 0.0 && e.is_finite() {
        return Err(EvalError::Domain);
    }
    let v = b.powf(e);
    if v.is_infinite() && b.is_finite() && e.is_finite() {
        return Err(EvalError::Range);
    }
    Ok(Number::Float(v))
}

fn call(name: &str, args: &[Number]) -> Result<Number, EvalError> {
    use Number::{Float, Int};

    match name {
        "abs" => {
            let [x] = exactly::<1>(name, args)?;
            Ok(match x {
                Int(i) => i.checked_abs().map_or(Float((i as f64).abs()), Int),
                Float(f) => Float(f.abs()),
            })
        }
        "round" => match args {
            [x] => round_to_int(*x),
            [x, n] => round_digits(*x, *n),
            _ => Err(EvalError::Invalid(format!(
                "round() takes 1 or 2 arguments ({} given)",
                args.len()
            ))),
        },
        "min" | "max" => {
            if args.len() < 2 {
                return Err(EvalError::Invalid(format!(
                    "{}() expected at least 2 arguments, got {}",
                    name,
                    args.len()
                )));
            }
            let pick_min = name == "min";
            let best = args[1..].iter().fold(args[0], |best, &x| {
                let better = if pick_min {
                    x.as_f64() < best.as_f64()
                } else {
                    x.as_f64() > best.as_f64()
                };
                if better {
                    x
                } else {
                    best
                }
            });
            Ok(best)
        }
        "sqrt" => {
            let [x] = exactly::<1>(name, args)?;
            let x = x.as_f64();
            if x < 0.0 {
                return Err(EvalError::Domain);
            }
            Ok(Float(x.sqrt()))
        }
        "pow" => {
            let [b, e] = exactly::<2>(name, args)?;
            let (b, e) = (b.as_f64(), e.as_f64());
            if (b == 0.0 && e < 0.0) || (b < 0.0 && e.is_finite() && e.fract() != 0.0) {
                return Err(EvalError::Domain);
            }
            let v = b.powf(e);
            if v.is_infinite() && b.is_finite() && e.is_finite() {
                return Err(EvalError::Range);
            }
            Ok(Float(v))
        }
        "sin" | "cos" | "tan" => {
            let [x] = exactly::<1>(name, args)?;
            let x = x.as_f64();
            if x.is_infinite() {
                return Err(EvalError::Domain);
            }
            Ok(Float(match name {
                "sin" => x.sin(),
                "cos" => x.cos(),
                _ => x.tan(),
            }))
        }
        "log" => {
            let (x, base) = match args {
                [x] => (x.as_f64(), None),
                [x, b] => (x.as_f64(), Some(b.as_f64())),
                _ => {
                    return Err(EvalError::Invalid(format!(
                        "log() takes 1 or 2 arguments ({} given)",
                        args.len()
                    )))
                }
            };
            if x <= 0.0 {
                return Err(EvalError::Domain);
            }
            match base {
                None => Ok(Float(x.ln())),
                Some(b) if b <= 0.0 => Err(EvalError::Domain),
                Some(b) if b == 1.0 => Err(EvalError::DivisionByZero),
                Some(b) => Ok(Float(x.ln() / b.ln())),
            }
        }
        "log10" => {
            let [x] = exactly::<1>(name, args)?;
            let x = x.as_f64();
            if x <= 0.0 {
                return Err(EvalError::Domain);
            }
            Ok(Float(x.log10()))
        }
        "ceil" | "floor" => {
            let [x] = exactly::<1>(name, args)?;
            match x {
                Int(i) => Ok(Int(i)),
                Float(f) => {
                    let r = if name == "ceil" { f.ceil() } else { f.floor() };
                    float_to_int(r)
                }
            }
        }
        "pi" | "e" => Err(EvalError::Invalid("'float' object is not callable".to_string())),
        other => Err(EvalError::UnknownName(other.to_string())),
    }
}

fn exactly<const N: usize>(name: &str, args: &[Number]) -> Result<[Number; N], EvalError> {
    <[Number; N]>::try_from(args).map_err(|_| {
        EvalError::Invalid(format!(
            "{}() takes exactly {} argument{} ({} given)",
            name,
            N,
            if N == 1 { "" } else { "s" },
            args.len()
        ))
    })
}

/// Convert an integral float to an integer, keeping it a float if it does not fit.
fn float_to_int(f: f64) -> Result<Number, EvalError> {
    if f.is_nan() {
        return Err(EvalError::Invalid(
            "cannot convert float NaN to integer".to_string(),
        ));
    }
    if f.is_infinite() {
        return Err(EvalError::Invalid(
            "cannot convert float infinity to integer".to_string(),
        ));
    }
    if f >= -9.223_372_036_854_776e18 && f < 9.223_372_036_854_776e18 {
        Ok(Number::Int(f as i64))
    } else {
        Ok(Number::Float(f))
    }
}

fn round_to_int(x: Number) -> Result<Number, EvalError> {
    match x {
        Number::Int(i) => Ok(Number::Int(i)),
        Number::Float(f) => float_to_int(f.round_ties_even()),
    }
}

fn round_digits(x: Number, digits: Number) -> Result<Number, EvalError> {
    let Number::Int(n) = digits else {
        return Err(EvalError::Invalid(
            "'float' object cannot be interpreted as an integer".to_string(),
        ));
    };

    match x {
        Number::Int(i) if n >= 0 => Ok(Number::Int(i)),
        Number::Int(i) => {
            let k = n.unsigned_abs();
            if k > 18 {
                return Ok(Number::Int(0));
            }
            let p = 10_i128.pow(k as u32);
            let v = i128::from(i);
            let (q, r) = (v.div_euclid(p), v.rem_euclid(p));
            let q = if 2 * r > p || (2 * r == p && q % 2 != 0) {
                q + 1
            } else {
                q
            };
            Ok(i64::try_from(q * p).map_or(Number::Float((q * p) as f64), Number::Int))
        }
        Number::Float(f) if !f.is_finite() => Ok(Number::Float(f)),
        Number::Float(f) => {
            if n > 308 {
                return Ok(Number::Float(f));
            }
            if n < -308 {
                return Ok(Number::Float(0.0 * f.signum()));
            }
            let scale = 10f64.powi(n.unsigned_abs() as i32);
            let rounded = if n >= 0 {
                let scaled = f * scale;
                if scaled.is_infinite() {
                    f
                } else {
                    scaled.round_ties_even() / scale
                }
            } else {
                (f / scale).round_ties_even() * scale
            };
            Ok(Number::Float(rounded))
        }
    }
}
