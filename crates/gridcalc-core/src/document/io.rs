use super::Document;
use crate::error::Result;
use crate::storage::{parse_csv, write_csv};
use gridcalc_engine::engine::{Cell, CellDataType};
use std::path::Path;

impl Document {
    /// Replace the grid with the contents of a CSV file, then evaluate every
    /// formula it contained. Returns the number of cells loaded.
    pub fn load_csv(&mut self, path: &Path) -> Result<usize> {
        let inputs = parse_csv(path)?;

        self.grid.clear();
        for (cell_ref, input) in &inputs {
            // Formulas are stored unevaluated; recalculate fills them in.
            let cell = match CellDataType::detect(input) {
                CellDataType::Formula => Cell::new_formula(input, ""),
                _ => Cell::from_input(input),
            };
            self.grid.insert(cell_ref.clone(), cell);
        }
        self.recalculate();

        tracing::debug!(path = %path.display(), cells = inputs.len(), "loaded csv");
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(inputs.len())
    }

    /// Write display values to `path` as CSV.
    pub fn save_csv(&mut self, path: &Path) -> Result<()> {
        write_csv(path, &self.grid)?;
        tracing::debug!(path = %path.display(), "saved csv");
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }
}
