use super::Document;
use crate::error::{GridcalcError, Result};
use gridcalc_engine::engine::{
    Cell, CellDataType, CellRange, CellRef, EvalResult, evaluate_formula_with,
};
use regex::Regex;

impl Document {
    /// Evaluate `text` against the current grid without writing anything.
    pub fn evaluate(&self, text: &str) -> EvalResult {
        evaluate_formula_with(text, &self.grid, &self.options)
    }

    /// Apply user input to a cell: formulas are evaluated and their display
    /// value stored next to the source; anything else is stored verbatim.
    /// The cell's style survives. Returns the stored display value.
    pub fn set_cell_input(&mut self, cell_ref: CellRef, input: &str) -> String {
        let style = self
            .grid
            .get(&cell_ref)
            .map(|cell| cell.style.clone())
            .unwrap_or_default();

        let mut cell = match CellDataType::detect(input) {
            CellDataType::Formula => {
                let value = self.evaluate(input).to_display();
                Cell::new_formula(input, &value)
            }
            _ => Cell::from_input(input),
        };
        cell.style = style;

        tracing::debug!(cell = %cell_ref, input, value = %cell.raw_value, "cell updated");
        let display = cell.raw_value.clone();
        self.grid.insert(cell_ref, cell);
        self.modified = true;
        display
    }

    /// Apply an assignment such as `B2=SUM(A1:A3)`; the first `=` separates
    /// the cell name from its input.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(CellRef, String)> {
        let (name, input) = assignment
            .split_once('=')
            .ok_or_else(|| GridcalcError::InvalidCell(assignment.to_string()))?;
        let cell_ref = CellRef::from_str(name.trim())
            .ok_or_else(|| GridcalcError::InvalidCell(assignment.to_string()))?;
        let display = self.set_cell_input(cell_ref.clone(), input);
        Ok((cell_ref, display))
    }

    /// The text a user would edit: the formula if present, else the raw value.
    pub fn cell_input(&self, cell_ref: &CellRef) -> String {
        self.grid
            .get(cell_ref)
            .map(|cell| cell.to_input_string())
            .unwrap_or_default()
    }

    /// The stored display value of a cell (empty when unpopulated).
    pub fn get_cell_display(&self, cell_ref: &CellRef) -> String {
        self.grid
            .get(cell_ref)
            .map(|cell| cell.raw_value.clone())
            .unwrap_or_default()
    }

    pub fn clear_cell(&mut self, cell_ref: &CellRef) -> Option<Cell> {
        let removed = self.grid.remove(cell_ref).map(|(_, cell)| cell);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    /// Re-evaluate every formula cell once, row-major, writing the new display
    /// values back. Returns the number of formula cells visited.
    pub fn recalculate(&mut self) -> usize {
        let mut formulas: Vec<(CellRef, String)> = self
            .grid
            .iter()
            .filter(|entry| entry.is_formula())
            .map(|entry| (entry.key().clone(), entry.formula.clone()))
            .collect();
        formulas.sort_by(|a, b| a.0.cmp(&b.0));

        for (cell_ref, formula) in &formulas {
            let value = self.evaluate(formula).to_display();
            if let Some(mut cell) = self.grid.get_mut(cell_ref) {
                cell.raw_value = value;
            }
        }
        tracing::debug!(cells = formulas.len(), "recalculated");
        formulas.len()
    }

    /// Replace every match of `pattern` in the raw value of non-formula cells
    /// inside `range` (the whole sheet when None). Returns the number of
    /// cells changed.
    pub fn find_and_replace(
        &mut self,
        range: Option<&CellRange>,
        pattern: &str,
        replacement: &str,
    ) -> Result<usize> {
        let re = Regex::new(pattern)?;

        let mut edits: Vec<(CellRef, String)> = self
            .grid
            .iter()
            .filter(|entry| !entry.is_formula())
            .filter(|entry| range.is_none_or(|r| r.contains(entry.key())))
            .filter_map(|entry| {
                let replaced = re.replace_all(&entry.raw_value, replacement);
                (replaced != entry.raw_value.as_str())
                    .then(|| (entry.key().clone(), replaced.into_owned()))
            })
            .collect();
        edits.sort_by(|a, b| a.0.cmp(&b.0));

        for (cell_ref, value) in &edits {
            self.set_cell_input(cell_ref.clone(), value);
        }
        if !edits.is_empty() {
            self.recalculate();
        }
        tracing::debug!(pattern, changed = edits.len(), "find and replace");
        Ok(edits.len())
    }
}
