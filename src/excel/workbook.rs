//! Workbook file handle
//!
//! A [`Workbook`] wraps the whole `.xlsx` package. Opening parses every part
//! of it and saving writes every part back, so whatever an operation does not
//! touch (formulas, styles, column widths, merged regions, other sheets) is
//! carried through as it was.

use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing::debug;
use umya_spreadsheet::{reader, writer, Spreadsheet, Worksheet};

use crate::error::{AdminError, AdminResult};

/// Display format written with the appended date row.
pub const DATE_DISPLAY_FORMAT: &str = "dd/mm/yyyy";

/// An open workbook. Sheets are umya [`Worksheet`]s, edited through
/// [`SheetExt`](super::SheetExt).
pub struct Workbook {
    book: Spreadsheet,
}

impl From<Spreadsheet> for Workbook {
    fn from(book: Spreadsheet) -> Self {
        Self { book }
    }
}

impl Workbook {
    /// Read a workbook from disk
    pub fn open(path: &Path) -> AdminResult<Self> {
        if !path.is_file() {
            return Err(AdminError::FileNotFound(path.display().to_string()));
        }
        let book = reader::xlsx::read(path)
            .map_err(|e| AdminError::WorkbookCorrupt(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), sheets = book.get_sheet_collection().len(), "workbook opened");
        Ok(Self { book })
    }

    /// Write the workbook to `path`, creating parent directories if needed
    pub fn save(&self, path: &Path) -> AdminResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        writer::xlsx::write(&self.book, path)
            .map_err(|e| AdminError::WorkbookWrite(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "workbook saved");
        Ok(())
    }

    pub fn sheet_count(&self) -> usize {
        self.book.get_sheet_collection().len()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|sheet| sheet.get_name())
            .collect()
    }

    /// Position of a sheet. Excel sheet names are case-insensitive.
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.book
            .get_sheet_collection()
            .iter()
            .position(|sheet| sheet.get_name().to_lowercase() == wanted)
    }

    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheet_index(name).and_then(|index| self.sheet_at(index))
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        let index = self.sheet_index(name)?;
        self.sheet_at_mut(index)
    }

    pub fn sheet_at(&self, index: usize) -> Option<&Worksheet> {
        self.book.get_sheet(&index)
    }

    pub fn sheet_at_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.book.get_sheet_mut(&index)
    }
}

fn excel_epoch() -> NaiveDate {
    // Day 0 of the 1900 system once the phantom 1900-02-29 is accounted for
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid epoch")
}

/// Convert a calendar date to an Excel serial number.
pub fn date_to_serial(date: NaiveDate) -> f64 {
    (date - excel_epoch()).num_days() as f64
}

/// Convert an Excel serial number back to a calendar date, ignoring the time part.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    excel_epoch().checked_add_signed(chrono::Duration::days(serial.trunc() as i64))
}
