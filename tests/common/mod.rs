//! Shared fixtures: a temp directory holding a verification workbook, a
//! template workbook and the matching configuration.
//!
//! Fixture workbooks are written with rust_xlsxwriter, the way Excel-side
//! tooling would produce them, and inspected afterwards with calamine.

#![allow(dead_code)]

use calamine::{open_workbook, Reader, Xlsx};
use chrono::NaiveDate;
use nautil_admin::config::{AdminConfig, EmailSettings, ExcelSettings, SmtpSettings};
use nautil_admin::error::{AdminError, AdminResult};
use nautil_admin::excel::Workbook;
use nautil_admin::mail::{Mailer, OutgoingEmail};
use rust_xlsxwriter::{Format, Workbook as XlsxBook, Worksheet};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

pub const GLOBAL: &str = "Vue Globale - Re7 NAUTIL";
pub const VERIFICATION_NAME: &str = "verif-2024-01-01.xlsx";
pub const RENAMED_NAME: &str = "verif-2024-06-15.xlsx";

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

pub struct Fixture {
    pub dir: TempDir,
    pub config: AdminConfig,
}

impl Fixture {
    /// Standard layout: global view, TX1..TX3, then two extract sheets.
    pub fn new() -> Self {
        Self::with_verification(VERIFICATION_NAME, standard_verification())
    }

    pub fn with_verification(file_name: &str, verification: XlsxBook) -> Self {
        Self::with_files(file_name, verification, template())
    }

    pub fn with_files(file_name: &str, mut verification: XlsxBook, mut template: XlsxBook) -> Self {
        let dir = TempDir::new().unwrap();
        let verification_file = dir.path().join(file_name);
        let template_file = dir.path().join("template.xlsx");
        verification.save(&verification_file).unwrap();
        template.save(&template_file).unwrap();

        let config = AdminConfig {
            excel: ExcelSettings {
                verification_file,
                template_file,
                output_dir: dir.path().join("out"),
                sheet_global: GLOBAL.to_string(),
                sheet_tx1: "TX1".to_string(),
                sheet_tx2: "TX2".to_string(),
                sheet_tx3: "TX3".to_string(),
            },
            email: EmailSettings {
                default_to: "team@example.com".to_string(),
                from: "robot@example.com".to_string(),
            },
            smtp: SmtpSettings::default(),
        };

        Self { dir, config }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn verification(&self) -> Workbook {
        Workbook::open(&self.config.excel.verification_file).unwrap()
    }

    pub fn template(&self) -> Workbook {
        Workbook::open(&self.config.excel.template_file).unwrap()
    }

    /// Write the configuration as YAML next to the workbooks
    pub fn write_config(&self) -> PathBuf {
        let path = self.path("nautil.yaml");
        std::fs::write(&path, serde_yaml::to_string(&self.config).unwrap()).unwrap();
        path
    }
}

pub type SheetBuilder = fn(&mut Worksheet);

/// Build a workbook from named sheets, in order.
pub fn book(sheets: &[(&str, SheetBuilder)]) -> XlsxBook {
    let mut workbook = XlsxBook::new();
    for (name, build) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        build(worksheet);
    }
    workbook
}

pub fn empty_sheet(_: &mut Worksheet) {}

fn headers(ws: &mut Worksheet) {
    ws.write_string(0, 0, "Report").unwrap();
    ws.write_string(2, 0, "Id").unwrap();
    ws.write_string(2, 1, "Amount").unwrap();
}

pub fn global_sheet(ws: &mut Worksheet) {
    ws.write_string(0, 0, "Date").unwrap();
    ws.write_string(0, 1, "Status").unwrap();
    ws.write_string(1, 0, "01/01/2024").unwrap();
    ws.write_string(1, 1, "OK").unwrap();
    ws.write_string(2, 0, "02/01/2024").unwrap();
    ws.write_string(2, 1, "KO").unwrap();
}

/// TX sheet with three data rows in B..G and a note in column H.
pub fn tx_sheet(ws: &mut Worksheet) {
    headers(ws);
    for row in 3..6u32 {
        ws.write_string(row, 0, format!("id-{}", row)).unwrap();
        ws.write_number(row, 1, row as f64 * 10.0).unwrap();
        ws.write_string(row, 6, "end").unwrap();
    }
    ws.write_string(6, 7, "note").unwrap();
}

pub fn filler_sheet(ws: &mut Worksheet) {
    for row in 0..4u32 {
        ws.write_string(row, 0, format!("row-{}", row)).unwrap();
        ws.write_number(row, 3, row as f64).unwrap();
    }
}

/// Template: two data rows in A..F and one row with data only in G.
pub fn template_sheet(ws: &mut Worksheet) {
    headers(ws);
    ws.write_string(3, 0, "a").unwrap();
    ws.write_string(3, 5, "f").unwrap();
    ws.write_number(4, 2, 3.5).unwrap();
    ws.write_string(5, 6, "keep").unwrap();
}

pub fn standard_verification() -> XlsxBook {
    book(&[
        (GLOBAL, global_sheet),
        ("TX1", tx_sheet),
        ("TX2", tx_sheet),
        ("TX3", tx_sheet),
        ("Extract A", filler_sheet),
        ("Extract B", filler_sheet),
    ])
}

pub fn template() -> XlsxBook {
    book(&[("Template", template_sheet), ("Untouched", filler_sheet)])
}

// ───────────────────────────────────────────────────────────────────────────
// Formatted workbooks: formulas, number formats, bold headers, column widths
// ───────────────────────────────────────────────────────────────────────────

pub const PERCENT: &str = "0.00%";

fn bold_headers(ws: &mut Worksheet, row: u32, titles: &[&str]) {
    let bold = Format::new().set_bold();
    for (col, title) in titles.iter().enumerate() {
        ws.write_string_with_format(row, col as u16, *title, &bold)
            .unwrap();
    }
}

/// Header row, then one dated row with a formula (C2) and a percentage (D2).
pub fn formatted_global_sheet(ws: &mut Worksheet) {
    ws.set_column_width(0, 14.0).unwrap();
    bold_headers(ws, 0, &["Date", "Count", "Double", "Rate"]);
    ws.write_number_with_format(1, 0, 45292.0, &Format::new().set_num_format("dd/mm/yyyy"))
        .unwrap();
    ws.write_number(1, 1, 10.0).unwrap();
    ws.write_formula(1, 2, "=B2*2").unwrap();
    ws.write_number_with_format(1, 3, 0.5, &Format::new().set_num_format(PERCENT))
        .unwrap();
}

/// Data rows 4..5 with a formula in H, and row 10 holding data only in C.
pub fn formatted_tx_sheet(ws: &mut Worksheet) {
    ws.set_column_width(7, 20.0).unwrap();
    bold_headers(ws, 2, &["Id", "Amount"]);
    for row in 3..5u32 {
        ws.write_string(row, 0, format!("id-{}", row)).unwrap();
        ws.write_number(row, 1, row as f64 * 10.0).unwrap();
        ws.write_string(row, 6, "end").unwrap();
        ws.write_formula(row, 7, format!("=B{}*3", row + 1).as_str())
            .unwrap();
    }
    ws.write_string(9, 2, "orphan").unwrap();
}

pub fn formula_filler_sheet(ws: &mut Worksheet) {
    filler_sheet(ws);
    ws.write_formula(4, 3, "=SUM(D1:D4)").unwrap();
}

/// First sheet: row 4 in A..F plus a formula in G4, and row 8 holding only
/// a percentage in B.
pub fn formatted_template_sheet(ws: &mut Worksheet) {
    bold_headers(ws, 0, &["Title"]);
    ws.write_string(2, 0, "Id").unwrap();
    ws.write_string(3, 0, "a").unwrap();
    ws.write_string(3, 5, "f").unwrap();
    ws.write_formula(3, 6, "=1+1").unwrap();
    ws.write_number_with_format(7, 1, 0.25, &Format::new().set_num_format(PERCENT))
        .unwrap();
}

pub fn formatted_verification() -> XlsxBook {
    book(&[
        (GLOBAL, formatted_global_sheet),
        ("TX1", formatted_tx_sheet),
        ("TX2", tx_sheet),
        ("TX3", tx_sheet),
        ("Extract A", formula_filler_sheet),
    ])
}

pub fn formatted_template() -> XlsxBook {
    book(&[
        ("Template", formatted_template_sheet),
        ("Untouched", formula_filler_sheet),
    ])
}

/// Every non-empty cell of `sheet`, keyed by zero-based `(row, col)`.
///
/// Formula cells read as `=<formula>` so the check does not depend on cached
/// results; other cells read as calamine's typed value.
pub fn snapshot(path: &Path, sheet: &str) -> BTreeMap<(u32, u32), String> {
    let mut xlsx: Xlsx<_> = open_workbook(path).unwrap();
    let mut cells = BTreeMap::new();

    let formulas = xlsx.worksheet_formula(sheet).unwrap();
    let (top, left) = formulas.start().unwrap_or((0, 0));
    for (row, col, formula) in formulas.used_cells() {
        cells.insert((top + row as u32, left + col as u32), format!("={}", formula));
    }

    let values = xlsx.worksheet_range(sheet).unwrap();
    let (top, left) = values.start().unwrap_or((0, 0));
    for (row, col, value) in values.used_cells() {
        cells
            .entry((top + row as u32, left + col as u32))
            .or_insert_with(|| format!("{:?}", value));
    }
    cells
}

/// Drop the cells of `snapshot` that fall in rows `from_row..` and `cols`.
pub fn outside(
    mut cells: BTreeMap<(u32, u32), String>,
    from_row: u32,
    cols: RangeInclusive<u32>,
) -> BTreeMap<(u32, u32), String> {
    cells.retain(|(row, col), _| !(*row >= from_row && cols.contains(col)));
    cells
}

/// Mailer that records messages instead of sending them
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail_with: Option<String>,
}

impl RecordingMailer {
    pub fn failing(message: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, email: &OutgoingEmail) -> AdminResult<()> {
        if let Some(message) = &self.fail_with {
            return Err(AdminError::MailTransport(message.clone()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
