use thiserror::Error;

/// Failure conditions of the scrape/verify pipeline. Every one of these is
/// reported and degraded at the phase boundary; none terminates the process.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The report page did not expose enough tables, or an extracted table
    /// had no data rows to work with.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Storage connectivity or query execution failed. A failed sink leaves
    /// the table in an unknown completion state; already-committed inserts
    /// are not rolled back.
    #[error("storage failure: {0}")]
    Storage(#[from] postgres::Error),

    /// Verification found nothing to read back, or the stored table has no
    /// DATE column to select a snapshot by.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// The export workbook could not be produced or written.
    #[error("export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}
