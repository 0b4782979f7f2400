//! Arithmetic over cell references and literals.
//!
//! Used for formulas that are not a built-in function call. The grammar is
//! closed; there is no way to reach functions, variables or anything else:
//!
//! ```text
//! expression     --> additive EOF
//! additive       --> multiplicative ( ("+" | "-") multiplicative )*
//! multiplicative --> unary ( ("*" | "/") unary )*
//! unary          --> ("-" | "+") unary | primary
//! primary        --> NUMBER | STRING | CELL_REF | "(" additive ")"
//! ```
//!
//! Cell references are replaced by the referenced cell's raw value: numeric
//! when it parses, text otherwise, `0` when the cell is missing or empty.
//! `+` concatenates when either side is text; the other operators require
//! numbers.

use super::cell::parse_number;
use super::cell_ref::CellRef;
use super::store::SheetStore;
use super::value::{EvalError, EvalOutcome, EvalResult};

/// Parenthesis/unary nesting allowed inside one arithmetic expression.
const MAX_NESTING: usize = 256;

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Cell(CellRef),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn lex(expr: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '"' => {
                let start = i + 1;
                let Some(len) = chars[start..].iter().position(|&ch| ch == '"') else {
                    return Err(EvalError::Syntax("unterminated string".into()));
                };
                tokens.push(Token::Str(chars[start..start + len].iter().collect()));
                i = start + len + 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent: e, optional sign, at least one digit.
                if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && matches!(chars[j], '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let n = parse_number(&text)
                    .ok_or_else(|| EvalError::Syntax(format!("bad number '{}'", text)))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let cell_ref = CellRef::from_str(&word)
                    .ok_or_else(|| EvalError::Syntax(format!("unknown name '{}'", word)))?;
                tokens.push(Token::Cell(cell_ref));
            }
            other => {
                return Err(EvalError::Syntax(format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    store: &'a dyn SheetStore,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(EvalError::Syntax("expression nested too deeply".into()));
        }
        Ok(())
    }

    fn parse_additive(&mut self) -> EvalOutcome {
        let mut lhs = self.parse_multiplicative()?;
        while let Some(op) = self.peek().cloned() {
            if op != Token::Plus && op != Token::Minus {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = if op == Token::Plus {
                add(lhs, rhs)?
            } else {
                numeric_op(lhs, rhs, |a, b| Ok(a - b))?
            };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> EvalOutcome {
        let mut lhs = self.parse_unary()?;
        while let Some(op) = self.peek().cloned() {
            if op != Token::Star && op != Token::Slash {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = if op == Token::Star {
                numeric_op(lhs, rhs, |a, b| Ok(a * b))?
            } else {
                numeric_op(lhs, rhs, |a, b| {
                    if b == 0.0 {
                        Err(EvalError::DivideByZero)
                    } else {
                        Ok(a / b)
                    }
                })?
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> EvalOutcome {
        match self.peek() {
            Some(Token::Minus) | Some(Token::Plus) => {
                let negate = self.next() == Some(Token::Minus);
                self.enter()?;
                let operand = self.parse_unary()?;
                self.depth -= 1;
                match operand {
                    EvalResult::Number(n) if negate => Ok(EvalResult::Number(-n)),
                    EvalResult::Number(n) => Ok(EvalResult::Number(n)),
                    other => Err(EvalError::NonNumeric(other.to_display())),
                }
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> EvalOutcome {
        match self.next() {
            Some(Token::Number(n)) => Ok(EvalResult::Number(n)),
            Some(Token::Str(s)) => Ok(EvalResult::Text(s)),
            Some(Token::Cell(cell_ref)) => Ok(self.cell_value(&cell_ref)),
            Some(Token::LParen) => {
                self.enter()?;
                let inner = self.parse_additive()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(EvalError::Syntax("expected ')'".into())),
                }
            }
            Some(other) => Err(EvalError::Syntax(format!("unexpected token {:?}", other))),
            None => Err(EvalError::Syntax("unexpected end of expression".into())),
        }
    }

    fn cell_value(&self, cell_ref: &CellRef) -> EvalResult {
        match self.store.get_cell(cell_ref) {
            None => EvalResult::Number(0.0),
            Some(cell) if cell.raw_value.is_empty() => EvalResult::Number(0.0),
            Some(cell) => EvalResult::from_literal(&cell.raw_value),
        }
    }
}

fn add(lhs: EvalResult, rhs: EvalResult) -> EvalOutcome {
    match (lhs, rhs) {
        (EvalResult::Number(a), EvalResult::Number(b)) => finite(a + b),
        (lhs, rhs) => Ok(EvalResult::Text(format!(
            "{}{}",
            lhs.to_display(),
            rhs.to_display()
        ))),
    }
}

fn numeric_op(
    lhs: EvalResult,
    rhs: EvalResult,
    op: impl Fn(f64, f64) -> Result<f64, EvalError>,
) -> EvalOutcome {
    match (lhs, rhs) {
        (EvalResult::Number(a), EvalResult::Number(b)) => finite(op(a, b)?),
        (EvalResult::Number(_), other) | (other, _) => {
            Err(EvalError::NonNumeric(other.to_display()))
        }
    }
}

fn finite(n: f64) -> EvalOutcome {
    if n.is_finite() {
        Ok(EvalResult::Number(n))
    } else {
        Err(EvalError::NonFinite)
    }
}

/// Evaluate an arithmetic expression (without the leading '=').
pub fn evaluate_arithmetic(expr: &str, store: &dyn SheetStore) -> EvalOutcome {
    let tokens = lex(expr)?;
    if tokens.is_empty() {
        return Err(EvalError::Syntax("empty expression".into()));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        store,
    };
    let value = parser.parse_additive()?;
    if parser.pos != parser.tokens.len() {
        return Err(EvalError::Syntax("trailing input".into()));
    }
    Ok(value)
}
