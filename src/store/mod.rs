use postgres::types::ToSql;
use postgres::{Client, NoTls};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::config::PgConfig;
use crate::error::ScrapeError;
use crate::extract::{Dataset, DATE_COLUMN};

/// Connection to the report store. Tables are created lazily on first sink,
/// every column typed as free text, and never altered afterwards.
pub struct Store {
    client: Client,
}

impl Store {
    pub fn connect(cfg: &PgConfig) -> Result<Store, ScrapeError> {
        let client = postgres::Config::new()
            .host(&cfg.host)
            .port(cfg.port)
            .dbname(&cfg.database)
            .user(&cfg.user)
            .password(&cfg.password)
            .connect(NoTls)?;
        Ok(Store { client })
    }

    /// Append every row of `ds` to `table`, creating the table from the
    /// header on first contact. Writes are append-only: re-sinking the same
    /// day's data duplicates it, and the latest-snapshot read compensates.
    ///
    /// A failure part-way through leaves whatever inserts already committed;
    /// callers must treat the table as being in an unknown completion state
    /// and verify by reading back rather than trusting this return value.
    pub fn sink(&mut self, table: &str, ds: &Dataset) -> Result<(), ScrapeError> {
        if ds.is_empty() {
            warn!(table, "empty dataset, nothing to sink");
            return Ok(());
        }
        self.client.batch_execute(&create_table_sql(table, &ds.header))?;
        let stmt = self.client.prepare(&insert_sql(table, &ds.header))?;
        for row in &ds.rows {
            let params: Vec<&(dyn ToSql + Sync)> =
                row.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
            self.client.execute(&stmt, &params)?;
        }
        info!(table, rows = ds.rows.len(), "sunk dataset");
        Ok(())
    }

    /// Read the full current contents of `table` back into a Dataset. Column
    /// names come from the table definition; every value is read as text.
    pub fn read_all(&mut self, table: &str) -> Result<Dataset, ScrapeError> {
        let stmt = self
            .client
            .prepare(&format!("SELECT * FROM {}", quote_ident(table)))?;
        let header: Vec<String> = stmt.columns().iter().map(|c| c.name().to_string()).collect();
        let rows = self
            .client
            .query(&stmt, &[])?
            .iter()
            .map(|row| {
                (0..row.len())
                    .map(|i| row.get::<_, Option<String>>(i).unwrap_or_default())
                    .collect()
            })
            .collect();
        Ok(Dataset { header, rows })
    }

    /// The latest logical snapshot of `table`: rows carrying the maximum
    /// DATE value, exact duplicates removed.
    pub fn latest_snapshot(&mut self, table: &str) -> Result<Dataset, ScrapeError> {
        let all = self.read_all(table)?;
        reduce_to_latest(&all)
    }
}

/// Reduce a stored table to the rows of its most recent date and drop exact
/// full-row duplicates, keeping first-occurrence order.
///
/// "Most recent" is the string-lexical maximum of the DATE column, as stored.
/// The report formats the column uniformly (`DD-Mon-YYYY`), which this
/// ordering relies on; mixed formats would pick a wrong snapshot.
pub fn reduce_to_latest(ds: &Dataset) -> Result<Dataset, ScrapeError> {
    let date_idx = ds.date_column().ok_or_else(|| {
        ScrapeError::DataUnavailable(format!("no {} column in stored table", DATE_COLUMN))
    })?;
    let key = ds
        .rows
        .iter()
        .filter_map(|r| r.get(date_idx))
        .max()
        .ok_or_else(|| ScrapeError::DataUnavailable("stored table has no rows".into()))?
        .clone();

    let mut seen: HashSet<&Vec<String>> = HashSet::new();
    let rows = ds
        .rows
        .iter()
        .filter(|r| r.get(date_idx) == Some(&key))
        .filter(|r| seen.insert(*r))
        .cloned()
        .collect();
    Ok(Dataset {
        header: ds.header.clone(),
        rows,
    })
}

/// Double embedded quotes; identifiers are used verbatim otherwise.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn create_table_sql(table: &str, header: &[String]) -> String {
    let cols = header
        .iter()
        .map(|c| format!("{} TEXT", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {} ({});", quote_ident(table), cols)
}

fn insert_sql(table: &str, header: &[String]) -> String {
    let cols = header
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=header.len())
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        quote_ident(table),
        cols,
        placeholders
    )
}
