//! Formula evaluation.
//!
//! [`evaluate_formula`] is the single entry point used by callers. It strips
//! the leading '=', dispatches to a built-in function when the expression
//! starts with a known `NAME(`, and otherwise falls back to the sandboxed
//! arithmetic evaluator. Every failure is turned into an [`ErrorCode`] here;
//! nothing escapes to the caller.

use serde::{Deserialize, Serialize};

use super::arith::evaluate_arithmetic;
use super::cell::{FORMULA_PREFIX, parse_number};
use super::cell_ref::{CellRange, CellRef};
use super::store::SheetStore;
use super::tokenize::{call_parens, extract_arguments};
use super::value::{ErrorCode, EvalError, EvalOutcome, EvalResult};
use crate::builtins;

pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Evaluation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalOptions {
    /// Maximum nesting of formulas (the top-level formula counts as one).
    pub max_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Evaluates formulas against a borrowed sheet.
///
/// Holds no state between calls apart from the current nesting depth.
pub struct Evaluator<'a> {
    store: &'a dyn SheetStore,
    options: &'a EvalOptions,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(store: &'a dyn SheetStore, options: &'a EvalOptions) -> Self {
        Evaluator {
            store,
            options,
            depth: 0,
        }
    }

    pub fn store(&self) -> &'a dyn SheetStore {
        self.store
    }

    /// Evaluate cell input. Text without the leading '=' is returned as a literal.
    pub fn evaluate(&mut self, text: &str) -> EvalResult {
        match self.evaluate_text(text) {
            Ok(value) => normalize(value),
            Err(err) => {
                tracing::debug!(formula = text, error = %err, "formula evaluation failed");
                EvalResult::Error(err.code())
            }
        }
    }

    fn evaluate_text(&mut self, text: &str) -> EvalOutcome {
        let Some(expr) = text.strip_prefix(FORMULA_PREFIX) else {
            return Ok(EvalResult::verbatim(text));
        };

        self.depth += 1;
        let result = if self.depth > self.options.max_depth {
            Err(EvalError::DepthExceeded(self.options.max_depth))
        } else {
            self.evaluate_expression(expr.trim())
        };
        self.depth -= 1;
        result
    }

    fn evaluate_expression(&mut self, expr: &str) -> EvalOutcome {
        let Some(builtin) = builtins::lookup(expr) else {
            tracing::trace!(expr, "no built-in matched, evaluating as arithmetic");
            return evaluate_arithmetic(expr, self.store);
        };

        let Some((_, close)) = call_parens(expr) else {
            return Err(EvalError::Syntax(format!("unbalanced parentheses in {}", expr)));
        };
        let trailing = expr[close + 1..].trim();
        if !trailing.is_empty() {
            return Err(EvalError::Syntax(format!(
                "unexpected '{}' after {} call",
                trailing, builtin.name
            )));
        }

        let args = extract_arguments(expr);
        tracing::trace!(function = builtin.name, args = args.len(), "dispatching built-in");
        builtin.call(self, &args)
    }

    /// Evaluate a nested formula. Its failures become error values so the
    /// enclosing function sees them as ordinary arguments; exceeding the
    /// depth limit is the exception and aborts the whole evaluation.
    fn evaluate_nested(&mut self, text: &str) -> EvalOutcome {
        match self.evaluate_text(text) {
            Ok(value) => Ok(normalize(value)),
            Err(err @ EvalError::DepthExceeded(_)) => Err(err),
            Err(err) => {
                tracing::debug!(formula = text, error = %err, "nested formula failed");
                Ok(EvalResult::Error(err.code()))
            }
        }
    }

    /// Evaluate one function argument.
    ///
    /// Checked in order: nested formula, single cell reference, range (kept
    /// verbatim for the calling function), number, quoted string, and finally
    /// the token itself as text. Only a leading '=' recurses; a bare
    /// `SUM(A1:A2)` stays text.
    pub fn evaluate_argument(&mut self, token: &str) -> EvalOutcome {
        let token = token.trim();

        if token.starts_with(FORMULA_PREFIX) {
            return self.evaluate_nested(token);
        }

        if let Some(cell_ref) = CellRef::from_str(token) {
            return Ok(match self.store.get_cell(&cell_ref) {
                Some(cell) => EvalResult::from_literal(&cell.raw_value),
                None => EvalResult::text(""),
            });
        }

        if CellRange::parse(token).is_some() {
            return Ok(EvalResult::text(token));
        }

        if let Some(n) = parse_number(token) {
            return Ok(EvalResult::Number(n));
        }

        if let Some(inner) = unquote(token) {
            return Ok(EvalResult::text(inner));
        }

        Ok(EvalResult::text(token))
    }
}

/// Strip one pair of surrounding double quotes. No escape processing.
fn unquote(token: &str) -> Option<&str> {
    token.strip_prefix('"')?.strip_suffix('"')
}

fn normalize(value: EvalResult) -> EvalResult {
    match value {
        EvalResult::Number(n) if !n.is_finite() => {
            tracing::debug!("non-finite result replaced by error");
            EvalResult::Error(ErrorCode::MalformedExpression)
        }
        other => other,
    }
}

/// Evaluate `text` against `store` with default options.
pub fn evaluate_formula(text: &str, store: &dyn SheetStore) -> EvalResult {
    evaluate_formula_with(text, store, &EvalOptions::default())
}

/// Evaluate `text` against `store` with explicit options.
#[tracing::instrument(level = "trace", skip(store, options))]
pub fn evaluate_formula_with(
    text: &str,
    store: &dyn SheetStore,
    options: &EvalOptions,
) -> EvalResult {
    Evaluator::new(store, options).evaluate(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Cell;
    use std::collections::HashMap;

    fn sheet() -> HashMap<CellRef, Cell> {
        let mut sheet = HashMap::new();
        sheet.insert(CellRef::new(0, 0), Cell::new_number(15.0));
        sheet.insert(CellRef::new(1, 0), Cell::new_text("hello"));
        sheet
    }

    #[test]
    fn test_argument_precedence() {
        let sheet = sheet();
        let options = EvalOptions::default();
        let mut ev = Evaluator::new(&sheet, &options);

        assert_eq!(ev.evaluate_argument("A1"), Ok(EvalResult::Number(15.0)));
        assert_eq!(ev.evaluate_argument("b1"), Ok(EvalResult::text("hello")));
        assert_eq!(ev.evaluate_argument("C7"), Ok(EvalResult::text("")));
        assert_eq!(ev.evaluate_argument("A1:B2"), Ok(EvalResult::text("A1:B2")));
        assert_eq!(ev.evaluate_argument(" 2.5 "), Ok(EvalResult::Number(2.5)));
        assert_eq!(ev.evaluate_argument("\"A1\""), Ok(EvalResult::text("A1")));
        assert_eq!(ev.evaluate_argument("\"12\""), Ok(EvalResult::text("12")));
        assert_eq!(ev.evaluate_argument("plain"), Ok(EvalResult::text("plain")));
        assert_eq!(ev.evaluate_argument("=A1*2"), Ok(EvalResult::Number(30.0)));
        assert_eq!(
            ev.evaluate_argument("=UPPER(B1)"),
            Ok(EvalResult::text("HELLO"))
        );
        assert_eq!(
            ev.evaluate_argument("UPPER(B1)"),
            Ok(EvalResult::text("UPPER(B1)"))
        );
    }

    #[test]
    fn test_quoted_argument_keeps_inner_quotes() {
        let sheet = sheet();
        let options = EvalOptions::default();
        let mut ev = Evaluator::new(&sheet, &options);
        assert_eq!(ev.evaluate_argument(r#""a""b""#), Ok(EvalResult::text(r#"a""b"#)));
        assert_eq!(ev.evaluate_argument(r#""""#), Ok(EvalResult::text("")));
        assert_eq!(ev.evaluate_argument("\""), Ok(EvalResult::text("\"")));
        assert_eq!(
            evaluate_formula(r#"=CONCATENATE("a""b")"#, &sheet),
            EvalResult::text(r#"a""b"#)
        );
    }

    #[test]
    fn test_nested_error_becomes_argument_value() {
        let sheet = sheet();
        let options = EvalOptions::default();
        let mut ev = Evaluator::new(&sheet, &options);
        assert_eq!(
            ev.evaluate_argument("=1/0"),
            Ok(EvalResult::Error(ErrorCode::DivideByZero))
        );
    }

    #[test]
    fn test_literals_are_returned_unchanged() {
        let sheet = sheet();
        assert_eq!(evaluate_formula("hello", &sheet), EvalResult::text("hello"));
        assert_eq!(evaluate_formula("A1", &sheet), EvalResult::text("A1"));
        assert_eq!(evaluate_formula("42", &sheet), EvalResult::Number(42.0));
        assert_eq!(evaluate_formula("", &sheet), EvalResult::text(""));
    }

    #[test]
    fn test_literals_that_do_not_round_trip_stay_text() {
        let sheet = sheet();
        for text in ["007", "1e3", " 5", "5.0", "-0", "+1"] {
            assert_eq!(evaluate_formula(text, &sheet), EvalResult::text(text), "{text:?}");
        }
        assert_eq!(evaluate_formula("-2.5", &sheet), EvalResult::Number(-2.5));
        assert_eq!(evaluate_formula("0.1", &sheet), EvalResult::Number(0.1));
    }

    #[test]
    fn test_depth_limit_is_configurable() {
        let sheet = sheet();
        let options = EvalOptions { max_depth: 2 };
        assert_eq!(
            evaluate_formula_with("=IF(1=1, =A1, 0)", &sheet, &options),
            EvalResult::Number(15.0)
        );
        assert_eq!(
            evaluate_formula_with("=IF(1=1, =IF(1=1, =A1, 0), 0)", &sheet, &options),
            EvalResult::Error(ErrorCode::MalformedExpression)
        );
    }
}
