//! The five workbook maintenance steps
//!
//! Each step opens what it needs, edits it, writes it back and reports a
//! [`TaskResult`]. Errors never escape a step.

use chrono::NaiveDate;
use regex::Regex;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::config::AdminConfig;
use crate::error::{AdminError, AdminResult};
use crate::excel::{SheetExt, Workbook};
use crate::types::TaskResult;

/// Row index 3, displayed as row 4: everything above is header.
pub const DATA_START_ROW: u32 = 3;
/// Columns B..=G of the TX sheets
pub const TX_COLUMNS: RangeInclusive<u32> = 1..=6;
/// Columns A..=F of the template's first sheet
pub const TEMPLATE_COLUMNS: RangeInclusive<u32> = 0..=5;

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date regex"))
}

/// Human-readable form used in logs and email subjects.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Replace the first `YYYY-MM-DD` in `file_name` with `today`.
///
/// Returns `None` when the name carries no date.
pub fn dated_file_name(file_name: &str, today: NaiveDate) -> Option<String> {
    let pattern = date_pattern();
    if !pattern.is_match(file_name) {
        return None;
    }
    let stamp = today.format("%Y-%m-%d").to_string();
    Some(pattern.replace(file_name, stamp.as_str()).into_owned())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn require_file(path: &Path) -> AdminResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AdminError::FileNotFound(path.display().to_string()))
    }
}

fn save(workbook: &Workbook, path: &Path, config: &AdminConfig) -> AdminResult<()> {
    let output_dir = &config.excel.output_dir;
    if !output_dir.as_os_str().is_empty() {
        fs::create_dir_all(output_dir)?;
    }
    workbook.save(path)
}

/// Step 1: stamp today's date into the verification file name.
pub fn rename_verification_file(config: &mut AdminConfig, today: NaiveDate) -> TaskResult {
    TaskResult::capture("rename", |result| {
        let current = config.excel.verification_file.clone();
        require_file(&current)?;

        let old_name = file_name_of(&current);
        let new_name = dated_file_name(&old_name, today)
            .ok_or_else(|| AdminError::NoDatePattern(old_name.clone()))?;

        if new_name == old_name {
            result.log(format!("ℹ️ File already dated {}: {}", today, old_name));
            return Ok(format!("File already up to date: {}", old_name));
        }

        let target: PathBuf = current.with_file_name(&new_name);
        fs::rename(&current, &target).map_err(|e| {
            AdminError::RenameFailed(format!("{} → {}: {}", old_name, new_name, e))
        })?;

        config.excel.verification_file = fs::canonicalize(&target).unwrap_or(target);
        info!(from = %old_name, to = %new_name, "verification file renamed");
        result.log(format!("✅ Renamed: {} → {}", old_name, new_name));
        Ok(format!("File renamed: {}", new_name))
    })
}

/// Step 2: append a row holding today's date to the global view sheet.
pub fn add_date_row(config: &AdminConfig, today: NaiveDate) -> TaskResult {
    TaskResult::capture("add_date_row", |result| {
        let path = &config.excel.verification_file;
        require_file(path)?;
        let mut workbook = Workbook::open(path)?;

        let sheet_name = &config.excel.sheet_global;
        let sheet = workbook
            .sheet_mut(sheet_name)
            .ok_or_else(|| AdminError::SheetNotFound(sheet_name.clone()))?;

        let new_row = sheet.last_data_row() + 1;
        sheet.set_date(new_row, 0, today);

        result.log(format!(
            "✅ Row added to '{}' at row {}",
            sheet_name,
            new_row + 1
        ));
        result.log(format!("   Date: {}", display_date(today)));

        save(&workbook, path, config)?;
        info!(sheet = %sheet_name, row = new_row, "date row appended");
        Ok("Date row added to global view".to_string())
    })
}

/// Step 3: blank B4:G on each TX sheet. Missing sheets are skipped.
pub fn clear_tx_sheets(config: &AdminConfig) -> TaskResult {
    TaskResult::capture("clear_tx_sheets", |result| {
        let path = &config.excel.verification_file;
        require_file(path)?;
        let mut workbook = Workbook::open(path)?;

        for sheet_name in config.tx_sheets() {
            let Some(sheet) = workbook.sheet_mut(sheet_name) else {
                warn!(sheet = %sheet_name, "TX sheet missing, skipped");
                result.log(format!("⚠️ Sheet not found: {}", sheet_name));
                continue;
            };
            let cleared = sheet.clear_range(DATA_START_ROW, TX_COLUMNS);
            result.log(format!(
                "✅ Sheet '{}': {} row(s) cleared in B{}:G",
                sheet_name,
                cleared,
                DATA_START_ROW + 1
            ));
        }

        save(&workbook, path, config)?;
        Ok("TX1/TX2/TX3 data cleared".to_string())
    })
}

/// Step 4: remove every row of every sheet positioned after TX3.
pub fn clear_sheets_after_tx3(config: &AdminConfig) -> TaskResult {
    TaskResult::capture("clear_sheets_after_tx3", |result| {
        let path = &config.excel.verification_file;
        require_file(path)?;
        let mut workbook = Workbook::open(path)?;

        let tx3 = &config.excel.sheet_tx3;
        let tx3_index = workbook
            .sheet_index(tx3)
            .ok_or_else(|| AdminError::SheetNotFound(tx3.clone()))?;

        let mut cleared = 0;
        for index in tx3_index + 1..workbook.sheet_count() {
            if let Some(sheet) = workbook.sheet_at_mut(index) {
                let rows = sheet.remove_all_rows();
                info!(sheet = %sheet.get_name(), rows, "sheet emptied");
                result.log(format!("✅ Sheet '{}' emptied", sheet.get_name()));
                cleared += 1;
            }
        }

        save(&workbook, path, config)?;
        if cleared == 0 {
            result.log("ℹ️ No sheet after TX3");
        }
        Ok(format!("{} sheet(s) after TX3 emptied", cleared))
    })
}

/// Step 5: blank A4:F on the template workbook's first sheet.
pub fn clear_template(config: &AdminConfig) -> TaskResult {
    TaskResult::capture("clear_template", |result| {
        let path = &config.excel.template_file;
        require_file(path)?;
        let mut workbook = Workbook::open(path)?;

        let sheet = workbook
            .sheet_at_mut(0)
            .ok_or_else(|| AdminError::SheetNotFound(format!("first sheet of {}", path.display())))?;
        let cleared = sheet.clear_range(DATA_START_ROW, TEMPLATE_COLUMNS);
        result.log(format!(
            "✅ Template '{}': {} row(s) cleared in A{}:F",
            sheet.get_name(),
            cleared,
            DATA_START_ROW + 1
        ));

        save(&workbook, path, config)?;
        Ok(format!("Template cleared ({} row(s))", cleared))
    })
}
