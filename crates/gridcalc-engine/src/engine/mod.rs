//! Spreadsheet engine API.

mod arith;
mod cell;
mod cell_ref;
mod eval;
mod format;
mod store;
mod tokenize;
mod value;

pub use arith::evaluate_arithmetic;
pub use cell::{Cell, CellDataType, CellStyle, FORMULA_PREFIX, Grid, HorizontalAlign, parse_number};
pub use cell_ref::{CellRange, CellRef, MAX_RANGE_CELLS};
pub use eval::{
    DEFAULT_MAX_DEPTH, EvalOptions, Evaluator, evaluate_formula, evaluate_formula_with,
};
pub use format::format_number;
pub use store::SheetStore;
pub use tokenize::{extract_arguments, find_top_level, split_top_level};
pub use value::{ErrorCode, EvalError, EvalOutcome, EvalResult};
