use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::warn;

use crate::error::ScrapeError;

/// Name of the column the snapshot reader keys on and the export stamp is
/// taken from. The report renders it verbatim as `DATE`.
pub const DATE_COLUMN: &str = "DATE";

static TABLE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("CSS selector for tables should be valid"));
static ROW_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("CSS selector for rows should be valid"));
static CELL_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("CSS selector for cells should be valid"));

/// A table exactly as the page renders it: rows of cell text, header cells
/// and data cells indistinguishable, row lengths not guaranteed equal.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

/// Rectangular header-plus-rows table, the pipeline's canonical unit.
/// Every row has exactly `header.len()` values once built via [`Dataset::from_raw`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Build a Dataset from a raw table: first row becomes the header, the
    /// rest become data rows, and everything (header included) is right-padded
    /// with empty strings to the widest row observed.
    ///
    /// Fewer than two raw rows means there is nothing beyond a header, which
    /// the pipeline treats as "insufficient data", not an error: the result
    /// is an empty Dataset.
    pub fn from_raw(raw: &RawTable) -> Dataset {
        if raw.rows.len() < 2 {
            return Dataset::default();
        }
        let max_cols = raw.rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut padded = raw.rows.iter().map(|r| {
            let mut row: Vec<String> = r.iter().map(|c| c.trim().to_string()).collect();
            row.resize(max_cols, String::new());
            row
        });
        let header = match padded.next() {
            Some(first) => disambiguate_header(first),
            None => return Dataset::default(),
        };
        Dataset {
            header,
            rows: padded.collect(),
        }
    }

    /// An empty Dataset has no header and no rows.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty()
    }

    /// Position of the DATE column, if the header carries one.
    pub fn date_column(&self) -> Option<usize> {
        self.header.iter().position(|h| h == DATE_COLUMN)
    }

    /// Render the header and up to `limit` rows as aligned text, for log
    /// previews of a snapshot.
    pub fn preview(&self, limit: usize) -> String {
        let rows: Vec<&Vec<String>> = self.rows.iter().take(limit).collect();
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }
        let render = |cells: &[String]| {
            cells
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let width = widths.get(i).copied().unwrap_or(0);
                    format!("{:<width$}", c, width = width)
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };
        let mut out = render(&self.header);
        for row in rows {
            out.push('\n');
            out.push_str(&render(row));
        }
        out
    }
}

/// Repeated header names are disambiguated by positional suffixing
/// (`X`, `X_2`, `X_3`, ...) so no column is silently dropped downstream.
fn disambiguate_header(names: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                name
            } else {
                let renamed = format!("{}_{}", name, count);
                warn!(column = %name, renamed = %renamed, "duplicate header name");
                renamed
            }
        })
        .collect()
}

/// Harvest every `<table>` on the page into a [`RawTable`]: one entry per
/// `<tr>`, one cell per `<th>`/`<td>` in document order, cell text collapsed
/// to single-spaced trimmed strings.
pub fn tables_from_html(html: &str) -> Vec<RawTable> {
    let doc = Html::parse_document(html);
    doc.select(&TABLE_SEL)
        .map(|table| RawTable {
            rows: table
                .select(&ROW_SEL)
                .map(|tr| tr.select(&CELL_SEL).map(cell_text).collect())
                .collect(),
        })
        .collect()
}

fn cell_text(cell: ElementRef) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The report page carries the NSE-only figures in its second table and the
/// combined NSE+BSE+MSEI figures in its third; the first is ignored. Fewer
/// than three tables means the page has not rendered its data.
pub fn select_report_tables(mut tables: Vec<RawTable>) -> Result<(RawTable, RawTable), ScrapeError> {
    if tables.len() < 3 {
        return Err(ScrapeError::InsufficientData(format!(
            "only {} tables found, expected at least 3",
            tables.len()
        )));
    }
    let combined = tables.swap_remove(2);
    let nse = tables.swap_remove(1);
    Ok((nse, combined))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[&[&str]]) -> RawTable {
        RawTable {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn fewer_than_two_rows_yields_empty_dataset() {
        assert!(Dataset::from_raw(&raw(&[])).is_empty());
        assert!(Dataset::from_raw(&raw(&[&["DATE", "FII", "DII"]])).is_empty());
    }

    #[test]
    fn ragged_rows_pad_to_widest_row() {
        // lengths 3, 5, 4: everything, header included, must come out at 5
        let ds = Dataset::from_raw(&raw(&[
            &["DATE", "FII", "DII"],
            &["01-01-2024", "100", "200", "300", "400"],
            &["02-01-2024", "110", "210", "310"],
        ]));
        assert_eq!(ds.header.len(), 5);
        assert_eq!(ds.header, vec!["DATE", "FII", "DII", "", ""]);
        for row in &ds.rows {
            assert_eq!(row.len(), 5);
        }
        assert_eq!(ds.rows[1], vec!["02-01-2024", "110", "210", "310", ""]);
    }

    #[test]
    fn short_data_rows_pad_to_header_width() {
        let ds = Dataset::from_raw(&raw(&[
            &["DATE", "FII", "DII"],
            &["01-01-2024"],
        ]));
        assert_eq!(ds.rows, vec![vec!["01-01-2024", "", ""]]);
    }

    #[test]
    fn cell_text_is_trimmed() {
        let ds = Dataset::from_raw(&raw(&[
            &[" DATE ", "FII"],
            &["  01-01-2024", "100  "],
        ]));
        assert_eq!(ds.header, vec!["DATE", "FII"]);
        assert_eq!(ds.rows[0], vec!["01-01-2024", "100"]);
    }

    #[test]
    fn duplicate_header_names_get_positional_suffixes() {
        let ds = Dataset::from_raw(&raw(&[
            &["DATE", "NET", "NET", "NET"],
            &["01-01-2024", "1", "2", "3"],
        ]));
        assert_eq!(ds.header, vec!["DATE", "NET", "NET_2", "NET_3"]);
    }

    #[test]
    fn html_tables_are_harvested_in_document_order() {
        let html = r#"
            <html><body>
              <table><tr><th>X</th></tr><tr><td>1</td></tr></table>
              <table>
                <tr><th>DATE</th><th>FII</th><th>DII</th></tr>
                <tr><td> 01-01-2024 </td><td>1,234.50</td><td>-567.80</td></tr>
              </table>
            </body></html>"#;
        let tables = tables_from_html(html);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows, vec![vec!["X"], vec!["1"]]);
        assert_eq!(
            tables[1].rows[1],
            vec!["01-01-2024", "1,234.50", "-567.80"]
        );
    }

    #[test]
    fn cell_text_collapses_nested_whitespace() {
        let html = "<table><tr><td> Gross \n  <b>Purchase</b> </td></tr></table>";
        let tables = tables_from_html(html);
        assert_eq!(tables[0].rows[0], vec!["Gross Purchase"]);
    }

    #[test]
    fn report_selection_needs_three_tables() {
        let err = select_report_tables(vec![raw(&[]), raw(&[])]).unwrap_err();
        assert!(matches!(err, ScrapeError::InsufficientData(_)));
    }

    #[test]
    fn report_selection_picks_second_and_third_tables() {
        let tables = vec![
            raw(&[&["ignored"]]),
            raw(&[&["nse"]]),
            raw(&[&["combined"]]),
        ];
        let (nse, combined) = select_report_tables(tables).unwrap();
        assert_eq!(nse.rows[0], vec!["nse"]);
        assert_eq!(combined.rows[0], vec!["combined"]);
    }

    #[test]
    fn preview_aligns_columns_and_caps_rows() {
        let ds = Dataset::from_raw(&raw(&[
            &["DATE", "FII"],
            &["01-01-2024", "1"],
            &["02-01-2024", "2"],
            &["03-01-2024", "3"],
        ]));
        let text = ds.preview(2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "DATE        FII");
        assert_eq!(lines[1], "01-01-2024  1");
    }
}
