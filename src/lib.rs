//! Scraper for the NSE FII/DII daily trading activity report: extracts the
//! NSE-only and combined NSE+BSE+MSEI tables from the report page,
//! normalizes them into rectangular datasets, appends them to Postgres, and
//! exports/verifies multi-sheet XLSX snapshots.

pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod store;
