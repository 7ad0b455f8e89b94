use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tracing::info;

use crate::error::ScrapeError;
use crate::extract::Dataset;

/// Characters XLSX forbids in worksheet names.
static SHEET_NAME_FORBIDDEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\[\]:*?/\\]").expect("sheet-name regex should be valid"));

/// Anything that does not belong in a file-name stamp.
static STAMP_FORBIDDEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9A-Za-z_-]").expect("stamp regex should be valid"));

const SHEET_NAME_MAX: usize = 31;

/// Write one workbook with one worksheet per named dataset: header on the
/// first row, data rows below, columns in header order. Worksheet names are
/// sanitized to XLSX rules; the datasets themselves are written unchanged.
pub fn write_workbook(path: &Path, sheets: &[(&str, &Dataset)]) -> Result<(), ScrapeError> {
    let mut workbook = Workbook::new();
    for (name, ds) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sanitize_sheet_name(name))?;
        for (col, label) in ds.header.iter().enumerate() {
            worksheet.write_string(0, col as u16, label)?;
        }
        for (r, row) in ds.rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                worksheet.write_string((r + 1) as u32, c as u16, value)?;
            }
        }
    }
    workbook.save(path)?;
    info!(path = %path.display(), sheets = sheets.len(), "wrote workbook");
    Ok(())
}

/// File-name stamp for an export: the scraped date from the first data row's
/// DATE column (`/` becomes `-`, spaces become `_`), or today's UTC date when
/// the dataset carries no usable DATE value.
pub fn export_stamp(ds: &Dataset) -> String {
    let raw = ds
        .date_column()
        .and_then(|i| ds.rows.first().and_then(|r| r.get(i)))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Utc::now().format("%d-%m-%Y").to_string());
    let cleaned = raw.replace('/', "-").replace(' ', "_");
    STAMP_FORBIDDEN.replace_all(&cleaned, "_").into_owned()
}

fn sanitize_sheet_name(name: &str) -> String {
    let cleaned = SHEET_NAME_FORBIDDEN.replace_all(name, " ");
    let cleaned = cleaned.trim();
    let capped: String = cleaned.chars().take(SHEET_NAME_MAX).collect();
    if capped.is_empty() {
        "Sheet".to_string()
    } else {
        capped
    }
}
