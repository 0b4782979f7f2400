//! Built-in spreadsheet functions and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing built-in names are ALL CAPS and matched
//!   case-insensitively as a `NAME(` prefix of the expression.
//! - `BUILTINS` is searched in order. Keep it sorted by descending name length
//!   so a longer name is always tried before any name that prefixes it.
//! - Range arguments are read from the raw argument token (`A1:B5`); cells
//!   whose raw value is not numeric are skipped by the numeric aggregates.

use std::fmt;

use crate::engine::{
    Cell, CellRange, ErrorCode, EvalError, EvalOutcome, EvalResult, Evaluator, FORMULA_PREFIX,
    MAX_RANGE_CELLS, find_top_level,
};

type BuiltinFn = fn(&mut Evaluator<'_>, &[String]) -> EvalOutcome;

/// How many arguments a built-in accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Arity {
    Exactly(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::Between(lo, hi) => (lo..=hi).contains(&count),
            Arity::AtLeast(n) => count >= n,
        }
    }

    fn describe(self) -> String {
        match self {
            Arity::Exactly(n) => n.to_string(),
            Arity::Between(lo, hi) => format!("{} to {}", lo, hi),
            Arity::AtLeast(n) => format!("at least {}", n),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub description: &'static str,
    eval: BuiltinFn,
}

impl Builtin {
    pub fn call(&self, ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
        if !self.arity.accepts(args.len()) {
            return Err(EvalError::Arity {
                name: self.name,
                expected: self.arity.describe(),
                got: args.len(),
            });
        }
        (self.eval)(ev, args)
    }
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "CONCATENATE",
        arity: Arity::AtLeast(1),
        description: "Join the text of every argument",
        eval: concatenate,
    },
    Builtin {
        name: "AVERAGE",
        arity: Arity::Exactly(1),
        description: "Mean of numeric values in a cell range",
        eval: average,
    },
    Builtin {
        name: "COUNTIF",
        arity: Arity::Exactly(2),
        description: "Count cells equal to a criterion",
        eval: countif,
    },
    Builtin {
        name: "COUNT",
        arity: Arity::Exactly(1),
        description: "Count of numeric cells in a cell range",
        eval: count,
    },
    Builtin {
        name: "LOWER",
        arity: Arity::Exactly(1),
        description: "Lowercase text",
        eval: lower,
    },
    Builtin {
        name: "ROUND",
        arity: Arity::Exactly(2),
        description: "Round a number to a number of decimals",
        eval: round,
    },
    Builtin {
        name: "SUMIF",
        arity: Arity::Between(2, 3),
        description: "Sum values where the aligned criteria cell matches",
        eval: sumif,
    },
    Builtin {
        name: "UPPER",
        arity: Arity::Exactly(1),
        description: "Uppercase text",
        eval: upper,
    },
    Builtin {
        name: "TRIM",
        arity: Arity::Exactly(1),
        description: "Strip surrounding whitespace",
        eval: trim,
    },
    Builtin {
        name: "MAX",
        arity: Arity::Exactly(1),
        description: "Maximum numeric value in a cell range",
        eval: max,
    },
    Builtin {
        name: "MIN",
        arity: Arity::Exactly(1),
        description: "Minimum numeric value in a cell range",
        eval: min,
    },
    Builtin {
        name: "SUM",
        arity: Arity::Exactly(1),
        description: "Sum of numeric values in a cell range",
        eval: sum,
    },
    Builtin {
        name: "IF",
        arity: Arity::Exactly(3),
        description: "Choose between two values on a condition",
        eval: if_fn,
    },
];

/// The built-in whose `NAME(` prefixes `expr`, ignoring case.
pub fn lookup(expr: &str) -> Option<&'static Builtin> {
    let bytes = expr.as_bytes();
    BUILTINS.iter().find(|b| {
        let name = b.name.as_bytes();
        bytes.len() > name.len()
            && bytes[..name.len()].eq_ignore_ascii_case(name)
            && bytes[name.len()] == b'('
    })
}

// Shared argument helpers

fn range_arg(token: &str) -> Result<CellRange, EvalError> {
    let range = CellRange::parse(token).ok_or_else(|| EvalError::InvalidRange(token.to_string()))?;
    match range.cell_count() {
        Some(n) if n <= MAX_RANGE_CELLS => Ok(range),
        _ => Err(EvalError::InvalidRange(format!(
            "{} spans more than {} cells",
            token, MAX_RANGE_CELLS
        ))),
    }
}

fn numeric_values(ev: &Evaluator<'_>, token: &str) -> Result<Vec<f64>, EvalError> {
    let range = range_arg(token)?;
    Ok(ev
        .store()
        .cells_in_range(&range)
        .iter()
        .filter_map(Cell::numeric_value)
        .collect())
}

fn number_arg(ev: &mut Evaluator<'_>, token: &str) -> Result<f64, EvalError> {
    match ev.evaluate_argument(token)? {
        EvalResult::Number(n) => Ok(n),
        other => Err(EvalError::NonNumeric(other.to_display())),
    }
}

fn text_arg(ev: &mut Evaluator<'_>, token: &str) -> Result<String, EvalError> {
    if CellRange::parse(token).is_some() {
        return Err(EvalError::InvalidRange(format!(
            "{} where a single value is expected",
            token
        )));
    }
    Ok(ev.evaluate_argument(token)?.to_display())
}

// Aggregates

fn sum(ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
    let values = numeric_values(ev, &args[0])?;
    Ok(EvalResult::Number(values.iter().sum()))
}

fn average(ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
    let values = numeric_values(ev, &args[0])?;
    if values.is_empty() {
        return Ok(ErrorCode::DivideByZero.into());
    }
    Ok(EvalResult::Number(
        values.iter().sum::<f64>() / values.len() as f64,
    ))
}

fn max(ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
    let values = numeric_values(ev, &args[0])?;
    Ok(values
        .into_iter()
        .reduce(f64::max)
        .map_or(ErrorCode::NotAvailable.into(), EvalResult::Number))
}

fn min(ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
    let values = numeric_values(ev, &args[0])?;
    Ok(values
        .into_iter()
        .reduce(f64::min)
        .map_or(ErrorCode::NotAvailable.into(), EvalResult::Number))
}

fn count(ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
    let values = numeric_values(ev, &args[0])?;
    Ok(EvalResult::Number(values.len() as f64))
}

fn round(ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
    let value = number_arg(ev, &args[0])?;
    // Non-finite results from very large `decimals` are caught by the caller.
    let decimals = number_arg(ev, &args[1])?.trunc();
    let rounded = if decimals >= 0.0 {
        let factor = 10f64.powi(decimals as i32);
        (value * factor).round() / factor
    } else {
        let factor = 10f64.powi((-decimals) as i32);
        (value / factor).round() * factor
    };
    Ok(EvalResult::Number(rounded))
}

// Conditional aggregates

/// Whether a cell's raw value equals the criterion: numerically for number
/// criteria, by exact text otherwise.
fn matches_criterion(cell: &Cell, criterion: &EvalResult) -> bool {
    match criterion {
        EvalResult::Number(n) => cell.numeric_value() == Some(*n),
        EvalResult::Text(s) => cell.raw_value == *s,
        EvalResult::Error(code) => cell.raw_value == code.token(),
    }
}

fn countif(ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
    let range = range_arg(&args[0])?;
    let criterion = ev.evaluate_argument(&args[1])?;
    let count = ev
        .store()
        .cells_in_range(&range)
        .iter()
        .filter(|cell| matches_criterion(cell, &criterion))
        .count();
    Ok(EvalResult::Number(count as f64))
}

fn sumif(ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
    let range = range_arg(&args[0])?;
    let criterion = ev.evaluate_argument(&args[1])?;
    let sum_range = match args.get(2) {
        Some(token) => range_arg(token)?,
        None => range.clone(),
    };
    if (range.rows(), range.cols()) != (sum_range.rows(), sum_range.cols()) {
        return Err(EvalError::RangeMismatch(
            range.to_string(),
            sum_range.to_string(),
        ));
    }

    // Aligned by iteration order over populated cells; a criteria cell with
    // no counterpart in the sum range contributes 0.
    let store = ev.store();
    let criteria_cells = store.cells_in_range(&range);
    let sum_cells = store.cells_in_range(&sum_range);
    let total = criteria_cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| matches_criterion(cell, &criterion))
        .filter_map(|(idx, _)| sum_cells.get(idx).and_then(Cell::numeric_value))
        .sum();
    Ok(EvalResult::Number(total))
}

// Logical

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Comparison {
    GreaterEqual,
    LessEqual,
    NotEqual,
    Equal,
    Greater,
    Less,
}

impl Comparison {
    /// Two-character operators first so `>=` is never read as `>`.
    const SCAN_ORDER: [Comparison; 6] = [
        Comparison::GreaterEqual,
        Comparison::LessEqual,
        Comparison::NotEqual,
        Comparison::Equal,
        Comparison::Greater,
        Comparison::Less,
    ];

    fn symbol(self) -> &'static str {
        match self {
            Comparison::GreaterEqual => ">=",
            Comparison::LessEqual => "<=",
            Comparison::NotEqual => "<>",
            Comparison::Equal => "=",
            Comparison::Greater => ">",
            Comparison::Less => "<",
        }
    }

    fn apply(self, lhs: &EvalResult, rhs: &EvalResult) -> bool {
        match self {
            Comparison::Equal => values_equal(lhs, rhs),
            Comparison::NotEqual => !values_equal(lhs, rhs),
            _ => {
                let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) else {
                    return false;
                };
                match self {
                    Comparison::GreaterEqual => a >= b,
                    Comparison::LessEqual => a <= b,
                    Comparison::Greater => a > b,
                    _ => a < b,
                }
            }
        }
    }
}

fn values_equal(lhs: &EvalResult, rhs: &EvalResult) -> bool {
    match (lhs, rhs) {
        (EvalResult::Number(a), EvalResult::Number(b)) => a == b,
        (EvalResult::Text(a), EvalResult::Text(b)) => a == b,
        (EvalResult::Error(a), EvalResult::Error(b)) => a == b,
        (EvalResult::Error(code), EvalResult::Text(s))
        | (EvalResult::Text(s), EvalResult::Error(code)) => code.token() == s.as_str(),
        _ => false,
    }
}

fn evaluate_condition(ev: &mut Evaluator<'_>, condition: &str) -> Result<bool, EvalError> {
    let condition = condition.trim();
    if condition.is_empty() {
        return Err(EvalError::Condition("empty condition".into()));
    }

    // A leading '=' marks a nested formula, not an equality test.
    let nested = condition.starts_with(FORMULA_PREFIX);
    for op in Comparison::SCAN_ORDER {
        let symbol = op.symbol();
        let Some(pos) = find_top_level(condition, symbol, nested) else {
            continue;
        };
        let lhs = condition[..pos].trim();
        let rhs = condition[pos + symbol.len()..].trim();
        if lhs.is_empty() || rhs.is_empty() {
            return Err(EvalError::Condition(condition.to_string()));
        }
        let lhs = ev.evaluate_argument(lhs)?;
        let rhs = ev.evaluate_argument(rhs)?;
        return Ok(op.apply(&lhs, &rhs));
    }

    match ev.evaluate_argument(condition)? {
        EvalResult::Number(n) => Ok(n != 0.0),
        EvalResult::Text(s) => Ok(!s.is_empty()),
        EvalResult::Error(code) => Err(EvalError::Condition(format!(
            "{} evaluated to {}",
            condition, code
        ))),
    }
}

fn if_fn(ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
    if evaluate_condition(ev, &args[0])? {
        ev.evaluate_argument(&args[1])
    } else {
        ev.evaluate_argument(&args[2])
    }
}

// Text

fn concatenate(ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
    let mut out = String::new();
    for arg in args {
        out.push_str(&ev.evaluate_argument(arg)?.to_display());
    }
    Ok(EvalResult::Text(out))
}

fn trim(ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
    Ok(EvalResult::Text(text_arg(ev, &args[0])?.trim().to_string()))
}

fn upper(ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
    Ok(EvalResult::Text(text_arg(ev, &args[0])?.to_uppercase()))
}

fn lower(ev: &mut Evaluator<'_>, args: &[String]) -> EvalOutcome {
    Ok(EvalResult::Text(text_arg(ev, &args[0])?.to_lowercase()))
}
