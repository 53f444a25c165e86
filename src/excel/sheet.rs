//! Cell and row operations on a worksheet
//!
//! Rows and columns are zero-based here; umya addresses cells as one-based
//! `(column, row)` pairs. A cleared cell stays in place with its style and
//! only loses its value, the way a spreadsheet keeps an emptied cell.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use umya_spreadsheet::{Cell, Worksheet};

use super::workbook::{date_to_serial, DATE_DISPLAY_FORMAT};

/// Typed cell content, as the pipeline and its callers see it
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date (1900 date system)
    Date(f64),
}

fn address(row: u32, col: u32) -> (u32, u32) {
    (col + 1, row + 1)
}

/// Zero-based `(row, col)` of a cell
fn position(cell: &Cell) -> (u32, u32) {
    let coordinate = cell.get_coordinate();
    (*coordinate.get_row_num() - 1, *coordinate.get_col_num() - 1)
}

/// A formula counts as data even before Excel has cached its result.
fn has_data(cell: &Cell) -> bool {
    cell.is_formula() || !cell.get_value().is_empty()
}

/// True when a number format code renders a date.
///
/// Quoted literals and bracketed sections (colours, locales, elapsed time)
/// are skipped before looking for day or year tokens.
pub fn is_date_format(code: &str) -> bool {
    let mut in_quote = false;
    let mut in_bracket = false;
    code.chars().any(|c| match c {
        '"' => {
            in_quote = !in_quote;
            false
        }
        '[' if !in_quote => {
            in_bracket = true;
            false
        }
        ']' if !in_quote => {
            in_bracket = false;
            false
        }
        'd' | 'D' | 'y' | 'Y' => !in_quote && !in_bracket,
        _ => false,
    })
}

fn read_value(cell: &Cell) -> Option<CellValue> {
    let raw = cell.get_value();
    if raw.is_empty() {
        return None;
    }
    let value = match cell.get_data_type() {
        "n" => match raw.parse::<f64>() {
            Ok(number) if number_format_of(cell).map_or(false, is_date_format) => {
                CellValue::Date(number)
            }
            Ok(number) => CellValue::Number(number),
            Err(_) => CellValue::Text(raw.into_owned()),
        },
        "b" => CellValue::Bool(raw.eq_ignore_ascii_case("true") || raw == "1"),
        _ => CellValue::Text(raw.into_owned()),
    };
    Some(value)
}

fn number_format_of(cell: &Cell) -> Option<&str> {
    cell.get_style()
        .get_number_format()
        .map(|format| format.get_format_code())
}

/// Pipeline operations on a worksheet
pub trait SheetExt {
    /// Value at `(row, col)`, `None` when the cell is absent or blank.
    fn value(&self, row: u32, col: u32) -> Option<CellValue>;

    /// Number format code of the cell at `(row, col)`
    fn number_format(&self, row: u32, col: u32) -> Option<&str>;

    /// Formula of the cell at `(row, col)`, without the leading `=`
    fn formula(&self, row: u32, col: u32) -> Option<&str>;

    /// Highest row index that physically holds a cell, blank or not.
    fn last_physical_row(&self) -> Option<u32>;

    /// Highest row index holding any non-blank cell.
    ///
    /// A sheet without data reports row 0, so a new row lands at row 1 below
    /// the presumed header.
    fn last_data_row(&self) -> u32;

    fn is_empty(&self) -> bool;

    /// Write `date` as a serial number displayed with [`DATE_DISPLAY_FORMAT`].
    fn set_date(&mut self, row: u32, col: u32, date: NaiveDate);

    /// Blank columns `cols` on every row from `start_row` down.
    ///
    /// Only rows with at least one non-blank cell in `cols` are touched and
    /// counted. Cells keep their style and rows are never removed.
    fn clear_range(&mut self, start_row: u32, cols: RangeInclusive<u32>) -> usize;

    /// Physically remove every row. Returns the number of rows removed.
    fn remove_all_rows(&mut self) -> u32;
}

impl SheetExt for Worksheet {
    fn value(&self, row: u32, col: u32) -> Option<CellValue> {
        self.get_cell(address(row, col)).and_then(read_value)
    }

    fn number_format(&self, row: u32, col: u32) -> Option<&str> {
        self.get_cell(address(row, col)).and_then(number_format_of)
    }

    fn formula(&self, row: u32, col: u32) -> Option<&str> {
        self.get_cell(address(row, col))
            .filter(|cell| cell.is_formula())
            .map(|cell| cell.get_formula())
    }

    fn last_physical_row(&self) -> Option<u32> {
        self.get_highest_row().checked_sub(1)
    }

    fn last_data_row(&self) -> u32 {
        self.get_cell_collection()
            .into_iter()
            .filter(|cell| has_data(cell))
            .map(|cell| position(cell).0)
            .max()
            .unwrap_or(0)
    }

    fn is_empty(&self) -> bool {
        self.get_cell_collection().is_empty()
    }

    fn set_date(&mut self, row: u32, col: u32, date: NaiveDate) {
        let cell = self.get_cell_mut(address(row, col));
        cell.set_value_number(date_to_serial(date));
        cell.get_style_mut()
            .get_number_format_mut()
            .set_format_code(DATE_DISPLAY_FORMAT);
    }

    fn clear_range(&mut self, start_row: u32, cols: RangeInclusive<u32>) -> usize {
        let targets: Vec<(u32, u32)> = self
            .get_cell_collection()
            .into_iter()
            .filter(|cell| has_data(cell))
            .map(position)
            .filter(|(row, col)| *row >= start_row && cols.contains(col))
            .collect();

        let rows: BTreeSet<u32> = targets.iter().map(|(row, _)| *row).collect();
        for (row, col) in targets {
            self.get_cell_mut(address(row, col)).set_cell_value(umya_spreadsheet::CellValue::default());
        }
        rows.len()
    }

    fn remove_all_rows(&mut self) -> u32 {
        let rows = self.get_highest_row();
        if rows > 0 {
            self.remove_row(&1, &rows);
        }
        rows
    }
}
