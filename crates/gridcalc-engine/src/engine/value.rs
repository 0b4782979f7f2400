//! Evaluation results and error codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::cell::parse_number;
use super::format::format_number;

/// User-visible error codes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ErrorCode {
    MalformedExpression,
    DivideByZero,
    NotAvailable,
}

impl ErrorCode {
    pub fn token(self) -> &'static str {
        match self {
            ErrorCode::MalformedExpression => "#ERROR!",
            ErrorCode::DivideByZero => "#DIV/0!",
            ErrorCode::NotAvailable => "#N/A!",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// The value of any evaluation step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EvalResult {
    Number(f64),
    Text(String),
    Error(ErrorCode),
}

impl EvalResult {
    pub fn text(s: impl Into<String>) -> EvalResult {
        EvalResult::Text(s.into())
    }

    /// Interpret literal cell text: numbers become `Number`, everything else `Text`.
    pub fn from_literal(text: &str) -> EvalResult {
        match parse_number(text) {
            Some(n) => EvalResult::Number(n),
            None => EvalResult::Text(text.to_string()),
        }
    }

    /// Like [`EvalResult::from_literal`], but a number is only produced when
    /// its display form is the literal itself, so `"007"` or `"1e3"` stay text.
    pub fn verbatim(text: &str) -> EvalResult {
        match parse_number(text) {
            Some(n) if format_number(n) == text => EvalResult::Number(n),
            _ => EvalResult::Text(text.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            EvalResult::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EvalResult::Error(_))
    }

    /// Display string for the grid (and the textual form used by string functions).
    pub fn to_display(&self) -> String {
        match self {
            EvalResult::Number(n) => format_number(*n),
            EvalResult::Text(s) => s.clone(),
            EvalResult::Error(code) => code.token().to_string(),
        }
    }
}

impl fmt::Display for EvalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}

impl From<ErrorCode> for EvalResult {
    fn from(code: ErrorCode) -> Self {
        EvalResult::Error(code)
    }
}

/// Why an evaluation step failed. Converted to an [`ErrorCode`] at the
/// formula boundary.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("{name} expects {expected} argument(s), got {got}")]
    Arity {
        name: &'static str,
        expected: String,
        got: usize,
    },

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("ranges have different shapes: {0} and {1}")]
    RangeMismatch(String, String),

    #[error("expected a number, got {0}")]
    NonNumeric(String),

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("malformed condition: {0}")]
    Condition(String),

    #[error("division by zero")]
    DivideByZero,

    #[error("result is not a finite number")]
    NonFinite,

    #[error("nesting deeper than {0} levels")]
    DepthExceeded(usize),
}

impl EvalError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EvalError::DivideByZero => ErrorCode::DivideByZero,
            _ => ErrorCode::MalformedExpression,
        }
    }
}

pub type EvalOutcome = std::result::Result<EvalResult, EvalError>;
