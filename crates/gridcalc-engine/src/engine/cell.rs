//! Cell data structures for the spreadsheet grid.
//!
//! This module provides the core data types for representing cells:
//! - [`CellDataType`] - What kind of content the user typed (text, number, date, formula)
//! - [`Cell`] - Raw value, formula source and presentation style of one cell
//! - [`CellStyle`] - Presentation attributes (opaque to evaluation)
//! - [`Grid`] - Thread-safe sparse storage for cells (backed by `DashMap`)

use dashmap::DashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use super::cell_ref::CellRef;

/// The formula marker.
pub const FORMULA_PREFIX: char = '=';

/// The kind of content a cell holds.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellDataType {
    #[default]
    Text,
    Number,
    Date,
    Formula,
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("date regex must compile"))
}

impl CellDataType {
    /// Classify user input.
    /// - Starts with '=' -> Formula
    /// - Non-empty and numeric -> Number
    /// - `d/m/yyyy`-shaped -> Date
    /// - Otherwise -> Text
    pub fn detect(input: &str) -> CellDataType {
        if input.starts_with(FORMULA_PREFIX) {
            CellDataType::Formula
        } else if parse_number(input).is_some() {
            CellDataType::Number
        } else if date_re().is_match(input) {
            CellDataType::Date
        } else {
            CellDataType::Text
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Presentation attributes. The evaluator never reads these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    pub bold: bool,
    pub italic: bool,
    pub font_size: u16,
    pub color: String,
    pub background_color: String,
    pub horizontal_align: HorizontalAlign,
}

impl Default for CellStyle {
    fn default() -> Self {
        CellStyle {
            bold: false,
            italic: false,
            font_size: 11,
            color: "#000000".to_string(),
            background_color: "#ffffff".to_string(),
            horizontal_align: HorizontalAlign::Left,
        }
    }
}

/// A cell in the spreadsheet grid.
///
/// For formula cells `raw_value` holds the last computed display value and
/// `formula` holds the source text (including the leading '=').
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub raw_value: String,
    pub formula: String,
    pub data_type: CellDataType,
    pub style: CellStyle,
}

impl Cell {
    pub fn new_empty() -> Cell {
        Cell::default()
    }

    pub fn new_text(text: &str) -> Cell {
        Cell {
            raw_value: text.to_string(),
            ..Cell::default()
        }
    }

    pub fn new_number(n: f64) -> Cell {
        Cell {
            raw_value: n.to_string(),
            data_type: CellDataType::Number,
            ..Cell::default()
        }
    }

    /// A formula cell with its computed display value.
    pub fn new_formula(formula: &str, value: &str) -> Cell {
        Cell {
            raw_value: value.to_string(),
            formula: formula.to_string(),
            data_type: CellDataType::Formula,
            ..Cell::default()
        }
    }

    /// Build a non-formula cell from user input, classifying it on the way.
    pub fn from_input(input: &str) -> Cell {
        Cell {
            raw_value: input.to_string(),
            data_type: CellDataType::detect(input),
            ..Cell::default()
        }
    }

    pub fn is_formula(&self) -> bool {
        !self.formula.is_empty()
    }

    /// The raw value as a number, if it parses as one.
    pub fn numeric_value(&self) -> Option<f64> {
        parse_number(&self.raw_value)
    }

    /// The text a user would edit: the formula if present, else the raw value.
    pub fn to_input_string(&self) -> String {
        if self.is_formula() {
            self.formula.clone()
        } else {
            self.raw_value.clone()
        }
    }
}

/// Parse a finite number from cell or literal text.
///
/// Surrounding whitespace is ignored. Spellings such as `inf` or `NaN` that
/// Rust's float parser accepts are treated as text.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Thread-safe sparse grid storage.
pub type Grid = Arc<DashMap<CellRef, Cell>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_types() {
        assert_eq!(CellDataType::detect("=SUM(A1:A2)"), CellDataType::Formula);
        assert_eq!(CellDataType::detect("42"), CellDataType::Number);
        assert_eq!(CellDataType::detect(" -3.5 "), CellDataType::Number);
        assert_eq!(CellDataType::detect("12/31/2024"), CellDataType::Date);
        assert_eq!(CellDataType::detect("1/2/2024"), CellDataType::Date);
        assert_eq!(CellDataType::detect("2024-01-02"), CellDataType::Text);
        assert_eq!(CellDataType::detect(""), CellDataType::Text);
        assert_eq!(CellDataType::detect("hello"), CellDataType::Text);
    }

    #[test]
    fn test_parse_number_rejects_non_finite_spellings() {
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("   "), None);
    }

    #[test]
    fn test_input_string_prefers_formula() {
        let cell = Cell::new_formula("=1+1", "2");
        assert_eq!(cell.to_input_string(), "=1+1");
        assert_eq!(cell.numeric_value(), Some(2.0));
        assert_eq!(Cell::new_text("x").to_input_string(), "x");
    }

    #[test]
    fn test_new_number_renders_shortest_form() {
        assert_eq!(Cell::new_number(4.0).raw_value, "4");
        assert_eq!(Cell::new_number(2.5).raw_value, "2.5");
    }
}
