//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed column/row coordinates, plus
//! rectangular ranges such as "A1:C10".
//!
//! # Examples
//!
//! ```
//! use gridcalc_engine::engine::{CellRange, CellRef};
//!
//! let cell = CellRef::from_str("B3").unwrap();
//! assert_eq!(cell.col, 1); // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//!
//! let range = CellRange::parse("B2:A1").unwrap();
//! assert_eq!(range.normalized().to_string(), "A1:B2");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Ranges spanning more cells than this are rejected by range-valued functions.
pub const MAX_RANGE_CELLS: usize = 1_000_000;

/// A reference to a cell by column and row indices (0-indexed).
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

fn a1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("A1 reference regex must compile")
    })
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "b2", "AA10").
    /// Returns None if the input is invalid.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::parse_a1(name)
    }

    fn parse_a1(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name)?;
        let col = Self::letters_to_col(&caps["letters"])?;
        let row = caps["numbers"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(CellRef::new(col, row))
    }

    /// Convert spreadsheet-style letters to a column index (A -> 0, Z -> 25, AA -> 26).
    /// Lowercase letters are accepted. Returns None for empty, non-alphabetic or
    /// overflowing labels.
    pub fn letters_to_col(letters: &str) -> Option<usize> {
        if letters.is_empty() {
            return None;
        }
        let mut col_acc = 0usize;
        for c in letters.bytes() {
            if !c.is_ascii_alphabetic() {
                return None;
            }
            let digit = (c.to_ascii_uppercase() - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        col_acc.checked_sub(1)
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

/// A rectangular span between two cells.
///
/// `start` is not required to be the top-left corner; use [`CellRange::normalized`]
/// or [`CellRange::iter`], which order each axis independently.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    pub fn new(start: CellRef, end: CellRef) -> CellRange {
        CellRange { start, end }
    }

    /// Parse a range like "A1:B5". Exactly one `:` is allowed and both halves
    /// must be valid cell references.
    pub fn parse(text: &str) -> Option<CellRange> {
        let parts: Vec<&str> = text.trim().split(':').collect();
        if parts.len() != 2 {
            return None;
        }
        let start = CellRef::from_str(parts[0])?;
        let end = CellRef::from_str(parts[1])?;
        Some(CellRange::new(start, end))
    }

    /// The same span with `start` at the minimum row/column and `end` at the maximum.
    pub fn normalized(&self) -> CellRange {
        CellRange {
            start: CellRef::new(
                self.start.col.min(self.end.col),
                self.start.row.min(self.end.row),
            ),
            end: CellRef::new(
                self.start.col.max(self.end.col),
                self.start.row.max(self.end.row),
            ),
        }
    }

    pub fn rows(&self) -> usize {
        self.start.row.abs_diff(self.end.row) + 1
    }

    pub fn cols(&self) -> usize {
        self.start.col.abs_diff(self.end.col) + 1
    }

    /// Number of coordinates covered, or None on overflow.
    pub fn cell_count(&self) -> Option<usize> {
        self.rows().checked_mul(self.cols())
    }

    pub fn contains(&self, cell_ref: &CellRef) -> bool {
        let n = self.normalized();
        (n.start.row..=n.end.row).contains(&cell_ref.row)
            && (n.start.col..=n.end.col).contains(&cell_ref.col)
    }

    /// Every coordinate of the normalized range, row-major.
    pub fn iter(&self) -> impl Iterator<Item = CellRef> {
        let n = self.normalized();
        let (first_col, last_col) = (n.start.col, n.end.col);
        (n.start.row..=n.end.row)
            .flat_map(move |row| (first_col..=last_col).map(move |col| CellRef::new(col, row)))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_a1_overflow_returns_none() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::from_str(&huge).is_none());
    }

    #[test]
    fn test_col_to_letters_handles_max_usize() {
        let letters = CellRef::col_to_letters(usize::MAX);
        assert!(!letters.is_empty());
        assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_column_label_boundaries() {
        assert_eq!(CellRef::col_to_letters(0), "A");
        assert_eq!(CellRef::col_to_letters(25), "Z");
        assert_eq!(CellRef::col_to_letters(26), "AA");
        assert_eq!(CellRef::col_to_letters(701), "ZZ");
        assert_eq!(CellRef::col_to_letters(702), "AAA");
        assert_eq!(CellRef::letters_to_col("AAA"), Some(702));
        assert_eq!(CellRef::letters_to_col("zz"), Some(701));
        assert_eq!(CellRef::letters_to_col(""), None);
        assert_eq!(CellRef::letters_to_col("A1"), None);
    }

    #[test]
    fn test_row_zero_is_invalid() {
        assert!(CellRef::from_str("A0").is_none());
    }

    #[test]
    fn test_rejects_other_shapes() {
        for text in ["", "A", "1", "1A", "A1B", "A-1", " A1", "A1:B2"] {
            assert!(CellRef::from_str(text).is_none(), "{text:?} should not parse");
        }
    }

    #[test]
    fn test_parse_range_requires_exactly_one_colon() {
        assert!(CellRange::parse("A1").is_none());
        assert!(CellRange::parse("A1:B2:C3").is_none());
        assert!(CellRange::parse("A1:").is_none());
        assert!(CellRange::parse("A1:2B").is_none());
        let range = CellRange::parse("a1:b3").unwrap();
        assert_eq!(range.start, CellRef::new(0, 0));
        assert_eq!(range.end, CellRef::new(1, 2));
    }

    #[test]
    fn test_reversed_range_iterates_row_major_from_minimum() {
        let range = CellRange::parse("B2:A1").unwrap();
        let cells: Vec<String> = range.iter().map(|c| c.to_string()).collect();
        assert_eq!(cells, vec!["A1", "B1", "A2", "B2"]);
        assert_eq!(range.cell_count(), Some(4));
        assert!(range.contains(&CellRef::new(1, 0)));
        assert!(!range.contains(&CellRef::new(2, 0)));
    }

    #[test]
    fn test_mixed_corner_range_normalizes_each_axis() {
        // Bottom-left to top-right.
        let range = CellRange::parse("A3:C1").unwrap();
        let n = range.normalized();
        assert_eq!(n.to_string(), "A1:C3");
        assert_eq!((range.rows(), range.cols()), (3, 3));
    }

    proptest! {
        #[test]
        fn prop_column_label_round_trip(col in 0usize..5_000_000) {
            let letters = CellRef::col_to_letters(col);
            prop_assert_eq!(CellRef::letters_to_col(&letters), Some(col));
        }

        #[test]
        fn prop_cell_ref_text_round_trip(col in 0usize..100_000, row in 0usize..10_000_000) {
            let cell = CellRef::new(col, row);
            prop_assert_eq!(CellRef::from_str(&cell.to_string()), Some(cell));
        }
    }
}
