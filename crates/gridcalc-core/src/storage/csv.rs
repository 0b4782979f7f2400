//! CSV import/export functionality

use crate::error::{GridcalcError, Result};
use gridcalc_engine::engine::{CellRef, Grid, parse_number};
use std::io::Write;
use std::path::Path;

/// Read a CSV file into cell inputs, one per non-empty field.
pub fn parse_csv(path: &Path) -> Result<Vec<(CellRef, String)>> {
    let content = std::fs::read_to_string(path)?;
    parse_csv_str(&content)
}

/// Parse CSV text into cell inputs. Record `n`, field `m` lands at column `m`,
/// row `n` (both 0-based); empty fields are skipped. Quoted fields may span
/// lines.
pub fn parse_csv_str(content: &str) -> Result<Vec<(CellRef, String)>> {
    if content.trim().is_empty() {
        return Err(GridcalcError::EmptyCsv);
    }

    let mut cells = Vec::new();
    for (row_idx, record) in split_records(content).into_iter().enumerate() {
        let (fields, terminated) = parse_csv_line(record);
        if !terminated {
            tracing::warn!(row = row_idx + 1, "unterminated quoted field, closed at end of input");
        }
        for (col_idx, field) in fields.into_iter().enumerate() {
            if field.is_empty() {
                continue;
            }
            cells.push((CellRef::new(col_idx, row_idx), field));
        }
    }

    Ok(cells)
}

/// Split CSV text into records on newlines outside quotes. A trailing `\r`
/// is dropped from each record.
fn split_records(content: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (idx, byte) in content.bytes().enumerate() {
        match byte {
            b'"' => in_quotes = !in_quotes,
            b'\n' if !in_quotes => {
                records.push(trim_cr(&content[start..idx]));
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < content.len() {
        records.push(trim_cr(&content[start..]));
    }
    records
}

fn trim_cr(record: &str) -> &str {
    record.strip_suffix('\r').unwrap_or(record)
}

/// Parse a single CSV record, handling quoted fields.
///
/// Returns the fields and whether every quoted field was closed.
pub(crate) fn parse_csv_line(line: &str) -> (Vec<String>, bool) {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                // Check for escaped quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' => {
                    in_quotes = true;
                    field_was_quoted = true;
                }
                ',' => {
                    if field_was_quoted {
                        fields.push(std::mem::take(&mut current));
                    } else {
                        fields.push(current.trim().to_string());
                        current.clear();
                    }
                    field_was_quoted = false;
                }
                _ => current.push(c),
            }
        }
    }
    if field_was_quoted {
        fields.push(current);
    } else {
        fields.push(current.trim().to_string());
    }
    (fields, !in_quotes)
}

/// Write the display value of every cell inside the populated bounds.
/// An empty grid produces an empty file.
pub fn write_csv(path: &Path, grid: &Grid) -> Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_csv_to(&mut file, grid)?;
    file.flush()?;
    Ok(())
}

/// Like [`write_csv`], for any writer.
pub fn write_csv_to(out: &mut impl Write, grid: &Grid) -> Result<()> {
    let Some((min_row, min_col, max_row, max_col)) = populated_bounds(grid) else {
        return Ok(());
    };

    for row in min_row..=max_row {
        let mut row_fields = Vec::with_capacity(max_col - min_col + 1);
        for col in min_col..=max_col {
            let value = grid
                .get(&CellRef::new(col, row))
                .map(|cell| cell.raw_value.clone())
                .unwrap_or_default();
            row_fields.push(escape_csv_field(&value));
        }
        writeln!(out, "{}", row_fields.join(","))?;
    }

    Ok(())
}

fn populated_bounds(grid: &Grid) -> Option<(usize, usize, usize, usize)> {
    grid.iter().fold(None, |bounds, entry| {
        let r = entry.key();
        Some(match bounds {
            None => (r.row, r.col, r.row, r.col),
            Some((r0, c0, r1, c1)) => (r0.min(r.row), c0.min(r.col), r1.max(r.row), c1.max(r.col)),
        })
    })
}

/// Escape a field for CSV output
fn escape_csv_field(field: &str) -> String {
    // Guard against CSV formula injection in spreadsheet apps. Numbers such
    // as "-5" are left alone.
    let first_non_space = field.trim_start_matches([' ', '\t']).chars().next();
    let safe_field = if matches!(first_non_space, Some('=' | '+' | '-' | '@'))
        && parse_number(field).is_none()
    {
        format!("'{}", field)
    } else {
        field.to_string()
    };

    if safe_field.contains(',')
        || safe_field.contains('"')
        || safe_field.contains('\n')
        || safe_field.contains('\r')
    {
        format!("\"{}\"", safe_field.replace('"', "\"\""))
    } else {
        safe_field
    }
}
