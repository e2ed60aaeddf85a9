// =============================================================================
// Tabular data model — raw, cleaned and validated price tables
// =============================================================================
//
// A dataset moves through three shapes:
//
//   RawTable      arbitrary cells under (possibly composite) column labels
//   NumericTable  flat labels, every cell numeric-or-missing
//   PriceTable    validated Open/High/Low/Close plus pass-through columns
//
// Every shape carries the same row index. Rows are never reordered after a
// table is built; the loader is responsible for chronological order.
// =============================================================================

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

use crate::types::PriceField;

// =============================================================================
// Row index
// =============================================================================

/// Key of a single row. Positional keys are used when the caller did not
/// designate a date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum RowKey {
    Position(usize),
    Timestamp(NaiveDateTime),
}

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Position(i) => write!(f, "{i}"),
            Self::Timestamp(ts) => {
                if ts.num_seconds_from_midnight() == 0 && ts.nanosecond() == 0 {
                    write!(f, "{}", ts.date())
                } else {
                    write!(f, "{ts}")
                }
            }
        }
    }
}

/// Build a positional index `0..len`.
pub fn positional_index(len: usize) -> Vec<RowKey> {
    (0..len).map(RowKey::Position).collect()
}

// =============================================================================
// Raw input
// =============================================================================

/// Column label with one or more levels. Level 0 is the primary label
/// (e.g. `Close` in `("Close", "AAPL")`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnLabel {
    levels: Vec<String>,
}

impl ColumnLabel {
    pub fn flat(name: impl Into<String>) -> Self {
        Self {
            levels: vec![name.into()],
        }
    }

    /// Composite label. An empty `levels` collapses to a single empty name.
    pub fn composite<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let levels: Vec<String> = levels.into_iter().map(Into::into).collect();
        if levels.is_empty() {
            Self::flat("")
        } else {
            Self { levels }
        }
    }

    pub fn primary(&self) -> &str {
        &self.levels[0]
    }

    pub fn is_composite(&self) -> bool {
        self.levels.len() > 1
    }
}

impl std::fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_composite() {
            write!(f, "({})", self.levels.join(", "))
        } else {
            f.write_str(self.primary())
        }
    }
}

/// An input value prior to cleaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawCell {
    Empty,
    Number(f64),
    Text(String),
}

impl RawCell {
    /// Classify a textual cell the way a CSV reader would: blanks are empty,
    /// plain numbers are numeric, everything else stays text.
    pub fn from_text(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else if let Ok(v) = trimmed.parse::<f64>() {
            Self::Number(v)
        } else {
            Self::Text(trimmed.to_string())
        }
    }
}

impl From<f64> for RawCell {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Option<f64>> for RawCell {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::Empty, Self::Number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawColumn {
    pub label: ColumnLabel,
    pub cells: Vec<RawCell>,
}

impl RawColumn {
    pub fn new(label: ColumnLabel, cells: Vec<RawCell>) -> Self {
        Self { label, cells }
    }
}

/// Heterogeneous input table as handed over by an ingestion source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawTable {
    pub index: Vec<RowKey>,
    pub columns: Vec<RawColumn>,
}

impl RawTable {
    pub fn new(index: Vec<RowKey>, columns: Vec<RawColumn>) -> Self {
        Self { index, columns }
    }

    /// Table with a positional index sized after the longest column.
    pub fn with_positional_index(columns: Vec<RawColumn>) -> Self {
        let len = columns.iter().map(|c| c.cells.len()).max().unwrap_or(0);
        Self {
            index: positional_index(len),
            columns,
        }
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }
}

// =============================================================================
// Cleaned table
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl NumericColumn {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Flat-labelled table whose cells are numeric or missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericTable {
    pub index: Vec<RowKey>,
    pub columns: Vec<NumericColumn>,
}

impl NumericTable {
    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    /// First column with exactly this name.
    pub fn column(&self, name: &str) -> Option<&NumericColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

// =============================================================================
// Validated table
// =============================================================================

/// A validated price series: chronological, unique index and finite
/// Open/High/Low/Close at every row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTable {
    pub index: Vec<RowKey>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    /// Columns other than the price fields, passed through from the input.
    pub extra: Vec<NumericColumn>,
}

impl PriceTable {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn field(&self, field: PriceField) -> &[f64] {
        match field {
            PriceField::Open => &self.open,
            PriceField::High => &self.high,
            PriceField::Low => &self.low,
            PriceField::Close => &self.close,
        }
    }

    pub fn extra_column(&self, name: &str) -> Option<&NumericColumn> {
        self.extra.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = [
            PriceField::Open,
            PriceField::High,
            PriceField::Low,
            PriceField::Close,
        ]
        .iter()
        .map(|f| f.as_str().to_string())
        .collect();
        names.extend(self.extra.iter().map(|c| c.name.clone()));
        names
    }

    /// The first `n` rows as JSON-friendly records (used for previews).
    pub fn head(&self, n: usize) -> Vec<serde_json::Value> {
        (0..self.len().min(n))
            .map(|i| {
                let mut row = serde_json::Map::new();
                row.insert("index".into(), serde_json::json!(self.index[i]));
                row.insert("Open".into(), serde_json::json!(self.open[i]));
                row.insert("High".into(), serde_json::json!(self.high[i]));
                row.insert("Low".into(), serde_json::json!(self.low[i]));
                row.insert("Close".into(), serde_json::json!(self.close[i]));
                for col in &self.extra {
                    row.insert(col.name.clone(), serde_json::json!(col.values[i]));
                }
                serde_json::Value::Object(row)
            })
            .collect()
    }
}

impl From<PriceTable> for NumericTable {
    fn from(table: PriceTable) -> Self {
        let wrap = |v: Vec<f64>| v.into_iter().map(Some).collect::<Vec<_>>();
        let mut columns = vec![
            NumericColumn::new("Open", wrap(table.open)),
            NumericColumn::new("High", wrap(table.high)),
            NumericColumn::new("Low", wrap(table.low)),
            NumericColumn::new("Close", wrap(table.close)),
        ];
        columns.extend(table.extra);
        Self {
            index: table.index,
            columns,
        }
    }
}
