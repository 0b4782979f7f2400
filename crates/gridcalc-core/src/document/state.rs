use gridcalc_engine::engine::{Cell, CellRef, EvalOptions, Grid};
use std::path::PathBuf;

/// UI-agnostic document state for the spreadsheet.
///
/// The document owns the sheet store. Formula cells keep their source in
/// `formula` and the last computed display value in `raw_value`; the engine
/// only ever reads the grid.
pub struct Document {
    /// The spreadsheet grid (DashMap is internally Arc-based, clones are cheap)
    pub grid: Grid,
    /// Settings passed to every evaluation
    pub options: EvalOptions,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the grid has been modified
    pub modified: bool,
}

impl Document {
    /// Create an empty, sparse document.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new() -> Self {
        Self::with_options(EvalOptions::default())
    }

    pub fn with_options(options: EvalOptions) -> Self {
        Document {
            grid: std::sync::Arc::new(dashmap::DashMap::new()),
            options,
            file_path: None,
            modified: false,
        }
    }

    /// Create a document with every cell of a `rows` x `cols` block populated
    /// by an empty text cell.
    pub fn with_size(rows: usize, cols: usize) -> Self {
        let doc = Self::new();
        for row in 0..rows {
            for col in 0..cols {
                doc.grid.insert(CellRef::new(col, row), Cell::new_empty());
            }
        }
        doc
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_sparse() {
        let doc = Document::new();
        assert!(doc.grid.is_empty());
        assert!(!doc.modified);
        assert_eq!(doc.options, EvalOptions::default());
    }

    #[test]
    fn test_with_size_populates_empty_cells() {
        let doc = Document::with_size(3, 2);
        assert_eq!(doc.grid.len(), 6);
        let cell = doc.grid.get(&CellRef::new(1, 2)).unwrap();
        assert_eq!(cell.raw_value, "");
        assert!(!cell.is_formula());
        assert!(doc.grid.get(&CellRef::new(2, 0)).is_none());
    }
}
