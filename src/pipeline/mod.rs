use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::PgConfig;
use crate::error::ScrapeError;
use crate::export;
use crate::extract::{self, Dataset};
use crate::fetch;
use crate::store::Store;

pub const NSE_TABLE: &str = "nse";
pub const COMBINED_TABLE: &str = "combined_nse_bse_msei";

pub const NSE_SHEET: &str = "NSE";
pub const COMBINED_SHEET: &str = "Combined NSE-BSE-MSEI";

pub const EXPORT_DIR: &str = "exports";

const PREVIEW_ROWS: usize = 5;

/// One scrape run: fetch the report page, extract and normalize both report
/// tables, append them to storage, and export the pair as one workbook.
///
/// A storage failure is reported and does not abort the run; the export
/// still happens. A sink failure on one table does not block the other.
pub fn scrape_once(cfg: &PgConfig) -> Result<()> {
    let client = fetch::build_client()?;
    let html = fetch::fetch_report_html(&client, fetch::REPORT_URL)?;
    let tables = extract::tables_from_html(&html);
    info!(tables = tables.len(), "report page parsed");
    let (raw_nse, raw_combined) = extract::select_report_tables(tables)?;

    let nse = Dataset::from_raw(&raw_nse);
    let combined = Dataset::from_raw(&raw_combined);
    if nse.is_empty() && combined.is_empty() {
        return Err(ScrapeError::InsufficientData(
            "both report tables came back without data rows".into(),
        )
        .into());
    }
    let stamp = export::export_stamp(&nse);
    info!(date = %stamp, "scraped report");

    match Store::connect(cfg) {
        Ok(mut store) => {
            if let Err(e) = store.sink(NSE_TABLE, &nse) {
                error!(table = NSE_TABLE, "sink failed: {}", e);
            }
            if let Err(e) = store.sink(COMBINED_TABLE, &combined) {
                error!(table = COMBINED_TABLE, "sink failed: {}", e);
            }
        }
        Err(e) => error!("storage connection failed: {}", e),
    }

    let path = export_path("nse_combined_data", &stamp)?;
    export::write_workbook(&path, &[(NSE_SHEET, &nse), (COMBINED_SHEET, &combined)])
        .context("exporting scraped datasets")?;
    Ok(())
}

/// Re-read both storage tables, reduce each to its latest-date rows, preview
/// them in the log, and export the snapshots as a verification workbook.
pub fn verify_once(cfg: &PgConfig) -> Result<()> {
    let mut store = Store::connect(cfg).context("connecting to storage for verification")?;

    let nse = snapshot(&mut store, NSE_TABLE);
    let combined = snapshot(&mut store, COMBINED_TABLE);

    let mut sheets: Vec<(&str, &Dataset)> = Vec::new();
    if let Some(ds) = nse.as_ref() {
        sheets.push((NSE_SHEET, ds));
    }
    if let Some(ds) = combined.as_ref() {
        sheets.push((COMBINED_SHEET, ds));
    }
    if sheets.is_empty() {
        bail!("no snapshot could be read back, nothing to verify");
    }

    let stamp = export::export_stamp(sheets[0].1);
    let path = export_path("db_data_verification", &stamp)?;
    export::write_workbook(&path, &sheets).context("exporting verification workbook")?;
    Ok(())
}

fn snapshot(store: &mut Store, table: &str) -> Option<Dataset> {
    match store.latest_snapshot(table) {
        Ok(ds) => {
            info!(
                table,
                rows = ds.rows.len(),
                "latest snapshot\n{}",
                ds.preview(PREVIEW_ROWS)
            );
            Some(ds)
        }
        Err(e) => {
            warn!(table, "snapshot unavailable: {}", e);
            None
        }
    }
}

fn export_path(prefix: &str, stamp: &str) -> Result<PathBuf> {
    fs::create_dir_all(EXPORT_DIR)
        .with_context(|| format!("creating {} directory", EXPORT_DIR))?;
    Ok(Path::new(EXPORT_DIR).join(format!("{}_{}.xlsx", prefix, stamp)))
}
