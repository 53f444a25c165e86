//! Workbook accessor
//!
//! Opens an existing `.xlsx` package with umya-spreadsheet, edits cells and
//! rows in place and writes the package back.

mod sheet;
mod workbook;

pub use sheet::{is_date_format, CellValue, SheetExt};
pub use umya_spreadsheet::Worksheet;
pub use workbook::{date_to_serial, serial_to_date, Workbook, DATE_DISPLAY_FORMAT};
