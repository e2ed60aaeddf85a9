// =============================================================================
// CSV ingestion — uploaded price files
// =============================================================================
//
// Reads a headered CSV into a `RawTable`. Type inference is limited to what a
// CSV reader can tell without domain knowledge: blanks, plain numbers and
// text. Everything else (currency symbols, separators) is left to the
// Numeric Cleaner.
//
// When a date column is designated, its values become the row index. Rows
// whose date cannot be parsed are dropped and the remaining rows are sorted
// chronologically.
// =============================================================================

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use tracing::{debug, info, warn};

use crate::table::{positional_index, ColumnLabel, RawCell, RawColumn, RawTable, RowKey};

/// Datetime layouts tried, in order, for the date column.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Date-only layouts tried after the datetime layouts.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%Y/%m/%d"];

/// Upload file kinds recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Csv,
    Excel,
    Unsupported,
}

impl UploadKind {
    pub fn from_file_name(file_name: &str) -> Self {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Self::Csv
        } else if lower.ends_with(".xls") || lower.ends_with(".xlsx") {
            Self::Excel
        } else {
            Self::Unsupported
        }
    }
}

/// Label for an uploaded dataset: the caller's name, else the file stem.
pub fn dataset_label(name: Option<&str>, file_name: &str) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n.to_string(),
        None => file_name
            .rsplit_once('.')
            .map_or(file_name, |(stem, _)| stem)
            .to_string(),
    }
}

/// Parse a date or datetime cell.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(ts);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Read CSV bytes into a raw table, optionally indexed by `date_column`.
pub fn load_csv(bytes: &[u8], date_column: Option<&str>) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .context("failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records: Vec<Vec<String>> = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read CSV record {line}"))?;
        records.push(record.iter().map(str::to_string).collect());
    }

    if records.is_empty() {
        bail!("uploaded file contains no data rows");
    }
    debug!(columns = headers.len(), rows = records.len(), "CSV parsed");

    let date_position = match date_column {
        Some(name) => {
            let position = headers.iter().position(|h| h == name);
            if position.is_none() {
                warn!(date_column = %name, "date column not found, keeping positional index");
            }
            position
        }
        None => None,
    };

    let Some(date_col) = date_position else {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(col, h)| {
                let cells = records.iter().map(|r| cell_at(r, col)).collect();
                RawColumn::new(ColumnLabel::flat(h.as_str()), cells)
            })
            .collect();
        return Ok(RawTable::new(positional_index(records.len()), columns));
    };

    let mut dated: Vec<(NaiveDateTime, &Vec<String>)> = records
        .iter()
        .filter_map(|r| r.get(date_col).and_then(|d| parse_date(d)).map(|ts| (ts, r)))
        .collect();

    let dropped = records.len() - dated.len();
    if dropped > 0 {
        warn!(dropped, "rows with unparseable dates dropped");
    }
    if dated.is_empty() {
        bail!("no row has a parseable date in column {:?}", headers[date_col]);
    }
    dated.sort_by_key(|(ts, _)| *ts);

    let index = dated.iter().map(|(ts, _)| RowKey::Timestamp(*ts)).collect();
    let columns = headers
        .iter()
        .enumerate()
        .filter(|(col, _)| *col != date_col)
        .map(|(col, h)| {
            let cells = dated.iter().map(|(_, r)| cell_at(r, col)).collect();
            RawColumn::new(ColumnLabel::flat(h.as_str()), cells)
        })
        .collect();

    info!(rows = dated.len(), dropped, "CSV loaded with date index");
    Ok(RawTable::new(index, columns))
}

fn cell_at(record: &[String], col: usize) -> RawCell {
    record.get(col).map_or(RawCell::Empty, |s| RawCell::from_text(s))
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date,Open,High,Low,Close,Volume
2024-01-03,11,12,9.5,10,\"1,500\"
2024-01-01,10,12,9,11,1000
not a date,1,1,1,1,1
2024-01-02,12,13,10,$12.50,
";

    #[test]
    fn upload_kind_by_extension() {
        assert_eq!(UploadKind::from_file_name("aapl.CSV"), UploadKind::Csv);
        assert_eq!(UploadKind::from_file_name("aapl.xlsx"), UploadKind::Excel);
        assert_eq!(UploadKind::from_file_name("aapl.json"), UploadKind::Unsupported);
    }

    #[test]
    fn label_defaults_to_file_stem() {
        assert_eq!(dataset_label(None, "prices.2024.csv"), "prices.2024");
        assert_eq!(dataset_label(Some("  "), "aapl.csv"), "aapl");
        assert_eq!(dataset_label(Some("Apple"), "aapl.csv"), "Apple");
    }

    #[test]
    fn parses_common_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date("2024-03-05"), Some(expected));
        assert_eq!(parse_date("03/05/2024"), Some(expected));
        assert_eq!(parse_date("05.03.2024"), Some(expected));
        assert_eq!(parse_date("2024-03-05T00:00:00Z"), Some(expected));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn date_column_becomes_sorted_index() {
        let table = load_csv(SAMPLE.as_bytes(), Some("Date")).unwrap();
        assert_eq!(table.row_count(), 3);
        let keys: Vec<String> = table.index.iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);

        let labels: Vec<&str> = table.columns.iter().map(|c| c.label.primary()).collect();
        assert_eq!(labels, vec!["Open", "High", "Low", "Close", "Volume"]);

        let close = &table.columns[3].cells;
        assert_eq!(close[0], RawCell::Number(11.0));
        assert_eq!(close[1], RawCell::Text("$12.50".into()));
        let volume = &table.columns[4].cells;
        assert_eq!(volume[1], RawCell::Empty);
        assert_eq!(volume[2], RawCell::Text("1,500".into()));
    }

    #[test]
    fn missing_date_column_keeps_positional_index() {
        let table = load_csv(SAMPLE.as_bytes(), Some("Timestamp")).unwrap();
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.index[0], RowKey::Position(0));
        assert_eq!(table.columns.len(), 6);
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(load_csv(b"Date,Open\n", Some("Date")).is_err());
    }
}
