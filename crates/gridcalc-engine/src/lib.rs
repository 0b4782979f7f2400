//! gridcalc_engine - Spreadsheet formula engine.
//!
//! Resolves A1-style references, dispatches built-in functions, evaluates
//! nested formulas and sandboxed arithmetic, and reports failures as one of
//! three error codes. The sheet itself is borrowed read-only through
//! [`engine::SheetStore`].

pub(crate) mod builtins;
pub mod engine;

pub use builtins::{Arity, BUILTINS, Builtin};

#[cfg(test)]
mod tests {
    use crate::engine::*;
    use dashmap::DashMap;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn grid() -> Grid {
        Arc::new(DashMap::new())
    }

    fn set(grid: &Grid, name: &str, value: &str) {
        grid.insert(CellRef::from_str(name).unwrap(), Cell::from_input(value));
    }

    #[test]
    fn test_sum_excludes_non_numeric_cells() {
        let grid = grid();
        set(&grid, "A1", "1");
        set(&grid, "A2", "x");
        set(&grid, "A3", "3");
        assert_eq!(evaluate_formula("=SUM(A1:A3)", &grid), EvalResult::Number(4.0));
    }

    #[test]
    fn test_empty_populations() {
        let grid = grid();
        set(&grid, "A1", "label");
        assert_eq!(
            evaluate_formula("=AVERAGE(A1:A3)", &grid),
            EvalResult::Error(ErrorCode::DivideByZero)
        );
        assert_eq!(
            evaluate_formula("=MAX(A1:A3)", &grid),
            EvalResult::Error(ErrorCode::NotAvailable)
        );
    }

    #[test]
    fn test_round_display() {
        let grid = grid();
        let result = evaluate_formula("=ROUND(3.14159, 2)", &grid);
        assert_eq!(result.to_display(), "3.14");
    }

    #[test]
    fn test_formula_cells_are_read_through_their_value() {
        let grid = grid();
        set(&grid, "A1", "2");
        grid.insert(
            CellRef::from_str("B1").unwrap(),
            Cell::new_formula("=A1*21", "42"),
        );
        assert_eq!(evaluate_formula("=B1+1", &grid), EvalResult::Number(43.0));
        assert_eq!(evaluate_formula("=SUM(A1:B1)", &grid), EvalResult::Number(44.0));
    }

    #[test]
    fn test_error_cascades_into_enclosing_arithmetic() {
        let grid = grid();
        set(&grid, "A1", "=1/0");
        // A1 holds formula text as its raw value; arithmetic treats it as text.
        assert_eq!(
            evaluate_formula("=A1*2", &grid),
            EvalResult::Error(ErrorCode::MalformedExpression)
        );
        assert_eq!(
            evaluate_formula("=1/0", &grid),
            EvalResult::Error(ErrorCode::DivideByZero)
        );
    }

    #[test]
    fn test_arithmetic_fallback_is_not_a_scripting_language() {
        let grid = grid();
        for formula in ["=1;2", "=x = 5", "=print(1)", "=A1.len()", "=[1,2]"] {
            assert_eq!(
                evaluate_formula(formula, &grid),
                EvalResult::Error(ErrorCode::MalformedExpression),
                "{formula}"
            );
        }
    }

    #[test]
    fn test_builtin_table_is_public() {
        let names: Vec<&str> = crate::BUILTINS.iter().map(|b| b.name).collect();
        for expected in [
            "SUM", "AVERAGE", "MAX", "MIN", "COUNT", "ROUND", "COUNTIF", "SUMIF", "IF",
            "CONCATENATE", "TRIM", "UPPER", "LOWER",
        ] {
            assert!(names.contains(&expected), "{expected} missing");
        }
        assert!(crate::BUILTINS.iter().all(|b| !b.description.is_empty()));
    }

    proptest! {
        #[test]
        fn prop_literals_are_idempotent(
            text in prop_oneof!["[^=].{0,20}", "[-+ 0-9.e]{1,8}", "A[0-9]{1,2}"]
        ) {
            let grid = grid();
            set(&grid, "A1", "5");
            prop_assert_eq!(evaluate_formula(&text, &grid).to_display(), text);
        }
    }
}
