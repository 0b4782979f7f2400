//! Read-only access to a caller-owned sheet.
//!
//! The evaluator never owns or mutates cells; it borrows anything that
//! implements [`SheetStore`] for the duration of one evaluation.

use dashmap::DashMap;
use std::collections::HashMap;
use std::hash::BuildHasher;

use super::cell::Cell;
use super::cell_ref::{CellRange, CellRef};

pub trait SheetStore {
    /// The cell at `cell_ref`, or None if it was never populated.
    fn get_cell(&self, cell_ref: &CellRef) -> Option<Cell>;

    /// Cells of the normalized range in row-major order.
    ///
    /// Coordinates without a stored cell are skipped, never synthesized, so
    /// the result can be shorter than the range.
    fn cells_in_range(&self, range: &CellRange) -> Vec<Cell> {
        range.iter().filter_map(|cell_ref| self.get_cell(&cell_ref)).collect()
    }
}

impl<S: BuildHasher + Clone> SheetStore for DashMap<CellRef, Cell, S> {
    fn get_cell(&self, cell_ref: &CellRef) -> Option<Cell> {
        self.get(cell_ref).map(|entry| entry.value().clone())
    }
}

impl<S: BuildHasher> SheetStore for HashMap<CellRef, Cell, S> {
    fn get_cell(&self, cell_ref: &CellRef) -> Option<Cell> {
        self.get(cell_ref).cloned()
    }
}

impl<T: SheetStore + ?Sized> SheetStore for std::sync::Arc<T> {
    fn get_cell(&self, cell_ref: &CellRef) -> Option<Cell> {
        (**self).get_cell(cell_ref)
    }

    fn cells_in_range(&self, range: &CellRange) -> Vec<Cell> {
        (**self).cells_in_range(range)
    }
}

impl<T: SheetStore + ?Sized> SheetStore for &T {
    fn get_cell(&self, cell_ref: &CellRef) -> Option<Cell> {
        (**self).get_cell(cell_ref)
    }

    fn cells_in_range(&self, range: &CellRange) -> Vec<Cell> {
        (**self).cells_in_range(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Grid;

    #[test]
    fn test_cells_in_range_skips_missing() {
        let grid: Grid = std::sync::Arc::new(DashMap::new());
        grid.insert(CellRef::new(0, 0), Cell::new_number(1.0));
        grid.insert(CellRef::new(0, 2), Cell::new_number(3.0));

        let range = CellRange::parse("A1:A3").unwrap();
        let values: Vec<String> = grid
            .cells_in_range(&range)
            .into_iter()
            .map(|c| c.raw_value)
            .collect();
        assert_eq!(values, vec!["1", "3"]);
    }

    #[test]
    fn test_cells_in_range_is_row_major_for_reversed_ranges() {
        let mut sheet = HashMap::new();
        sheet.insert(CellRef::new(0, 0), Cell::new_text("a1"));
        sheet.insert(CellRef::new(1, 0), Cell::new_text("b1"));
        sheet.insert(CellRef::new(0, 1), Cell::new_text("a2"));
        sheet.insert(CellRef::new(1, 1), Cell::new_text("b2"));

        let range = CellRange::parse("B2:A1").unwrap();
        let values: Vec<String> = sheet
            .cells_in_range(&range)
            .into_iter()
            .map(|c| c.raw_value)
            .collect();
        assert_eq!(values, vec!["a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn test_get_cell_missing_is_none() {
        let sheet: HashMap<CellRef, Cell> = HashMap::new();
        assert!(sheet.get_cell(&CellRef::new(3, 3)).is_none());
    }
}
