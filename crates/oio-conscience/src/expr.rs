// Path: crates/oio-conscience/src/expr.rs
//! A small arithmetic grammar for `score_expr`:
//! `+ - * / ( ) min() max() root()` over a service's reported numeric tags.
//! Hand-written recursive-descent parser and typed AST — the corpus has no
//! expression-evaluation crate to reuse for this (checked `examples/`), so
//! this follows the same "small hand-rolled parser, typed AST, `Result`
//! eval" shape as `oio_types::position::ChunkPosition`'s parser.

use oio_types::error::ConscienceError;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var(String),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Call(String, Vec<Expr>),
}

impl Expr {
    /// Evaluates the expression against a service's tag set. Unknown
    /// variables evaluate to `0.0` (a service that hasn't reported a given
    /// metric yet contributes nothing to its score, rather than aborting
    /// the whole recompute).
    pub fn eval(&self, vars: &HashMap<String, f64>) -> Result<f64, ConscienceError> {
        match self {
            Expr::Num(n) => Ok(*n),
            Expr::Var(name) => Ok(*vars.get(name).unwrap_or(&0.0)),
            Expr::Add(a, b) => Ok(a.eval(vars)? + b.eval(vars)?),
            Expr::Sub(a, b) => Ok(a.eval(vars)? - b.eval(vars)?),
            Expr::Mul(a, b) => Ok(a.eval(vars)? * b.eval(vars)?),
            Expr::Div(a, b) => {
                let divisor = b.eval(vars)?;
                if divisor == 0.0 {
                    return Err(ConscienceError::InvalidExpression("division by zero".into()));
                }
                Ok(a.eval(vars)? / divisor)
            }
            Expr::Neg(a) => Ok(-a.eval(vars)?),
            Expr::Call(name, args) => {
                let values = args
                .iter()
                .map(|a| a.eval(vars))
                .collect::<Result<Vec<_>, _>>()?;
                match name.as_str() {
                    "min" => values
                    .into_iter()
                    .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.min(v))))
                    .ok_or_else(|| ConscienceError::InvalidExpression("min() needs args".into())),
                    "max" => values
                    .into_iter()
                    .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
                    .ok_or_else(|| ConscienceError::InvalidExpression("max() needs args".into())),
                    "root" => {
                        if values.len() != 2 {
                            return Err(ConscienceError::InvalidExpression(
                                    "root() takes exactly 2 args".into(),
                                ));
                        }
                        let (value, n) = (values[0], values[1]);
                        if n == 0.0 {
                            return Err(ConscienceError::InvalidExpression("root() degree is zero".into()));
                        }
                        Ok(value.powf(1.0 / n))
                    }
                    other => Err(ConscienceError::InvalidExpression(format!("unknown function {other:?}"))),
                }
            }
        }
    }
}

/// Parses a `score_expr` source string into an AST, once per type at
/// registration time.
pub fn parse(src: &str) -> Result<Expr, ConscienceError> {
    let mut parser = Parser {
        chars: src.chars().peekable(),
    };
    let expr = parser.parse_expr()?;
    parser.skip_ws();
    if parser.chars.peek().is_some() {
        return Err(ConscienceError::InvalidExpression(format!(
                    "trailing input in expression {src:?}"
                )));
    }
    Ok(expr)
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ConscienceError> {
        let mut node = self.parse_term()?;
        loop {
            self.skip_ws();
            match self.chars.peek() {
                Some('+') => {
                    self.chars.next();
                    node = Expr::Add(Box::new(node), Box::new(self.parse_term()?));
                }
                Some('-') => {
                    self.chars.next();
                    node = Expr::Sub(Box::new(node), Box::new(self.parse_term()?));
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_term(&mut self) -> Result<Expr, ConscienceError> {
        let mut node = self.parse_unary()?;
        loop {
            self.skip_ws();
            match self.chars.peek() {
                Some('*') => {
                    self.chars.next();
                    node = Expr::Mul(Box::new(node), Box::new(self.parse_unary()?));
                }
                Some('/') => {
                    self.chars.next();
                    node = Expr::Div(Box::new(node), Box::new(self.parse_unary()?));
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Expr, ConscienceError> {
        self.skip_ws();
        if self.chars.peek() == Some(&'-') {
            self.chars.next();
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr, ConscienceError> {
        self.skip_ws();
        match self.chars.peek() {
            Some('(') => {
                    self.chars.next();
                    let node = self.parse_expr()?;
                    self.skip_ws();
                    if self.chars.next() != Some(')') {
                    return Err(ConscienceError::InvalidExpression("unclosed '('".into()));
                }
                Ok(node)
            }
            Some(c) if c.is_ascii_digit() || *c == '.' => self.parse_number(),
            Some(c) if c.is_alphabetic() || *c == '_' => self.parse_ident_or_call(),
            other => Err(ConscienceError::InvalidExpression(format!(
                        "unexpected character {other:?}"
                    ))),
        }
    }

    fn parse_number(&mut self) -> Result<Expr, ConscienceError> {
        let mut buf = String::new();
        while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit() || *c == '.') {
            buf.push(self.chars.next().expect("peeked"));
        }
        buf.parse::<f64>()
        .map(Expr::Num)
        .map_err(|_| ConscienceError::InvalidExpression(format!("invalid number {buf:?}")))
    }

    fn parse_ident_or_call(&mut self) -> Result<Expr, ConscienceError> {
        let mut buf = String::new();
        while matches!(self.chars.peek(), Some(c) if c.is_alphanumeric() || *c == '_') {
            buf.push(self.chars.next().expect("peeked"));
        }
        self.skip_ws();
        if self.chars.peek() == Some(&'(') {
                self.chars.next();
                let mut args = Vec::new();
                self.skip_ws();
                if self.chars.peek() != Some(&')') {
                loop {
                    args.push(self.parse_expr()?);
                    self.skip_ws();
                    match self.chars.peek() {
                        Some(',') => {
                            self.chars.next();
                        }
                        _ => break,
                    }
                }
            }
            self.skip_ws();
            if self.chars.next() != Some(')') {
            return Err(ConscienceError::InvalidExpression(format!("unclosed call to {buf:?}")));
        }
        Ok(Expr::Call(buf, args))
    } else {
        Ok(Expr::Var(buf))
    }
}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn evaluates_plain_variable() {
        let e = parse("cpu").unwrap();
        assert_eq!(e.eval(&vars(&[("cpu", 42.0)])).unwrap(), 42.0);
    }

    #[test]
    fn evaluates_arithmetic_with_precedence() {
        let e = parse("cpu + io * 2").unwrap();
        assert_eq!(e.eval(&vars(&[("cpu", 10.0), ("io", 5.0)])).unwrap(), 20.0);
    }

    #[test]
    fn evaluates_parenthesized_expression() {
        let e = parse("(cpu + io) * 2").unwrap();
        assert_eq!(e.eval(&vars(&[("cpu", 10.0), ("io", 5.0)])).unwrap(), 30.0);
    }

    #[test]
    fn evaluates_min_max() {
        let e = parse("min(cpu, io, 3)").unwrap();
        assert_eq!(e.eval(&vars(&[("cpu", 10.0), ("io", 5.0)])).unwrap(), 3.0);
        let e = parse("max(cpu, io)").unwrap();
        assert_eq!(e.eval(&vars(&[("cpu", 10.0), ("io", 5.0)])).unwrap(), 10.0);
    }

    #[test]
    fn evaluates_root() {
        let e = parse("root(9, 2)").unwrap();
        assert_eq!(e.eval(&HashMap::new()).unwrap(), 3.0);
    }

    #[test]
    fn unknown_variable_defaults_to_zero() {
        let e = parse("missing").unwrap();
        assert_eq!(e.eval(&HashMap::new()).unwrap(), 0.0);
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("cpu +").is_err());
        assert!(parse("cpu ) ").is_err());
    }

    #[test]
    fn rejects_division_by_zero() {
        let e = parse("cpu / io").unwrap();
        assert!(e.eval(&vars(&[("cpu", 1.0), ("io", 0.0)])).is_err());
    }
}
