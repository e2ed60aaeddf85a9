// =============================================================================
// Schema Validator
// =============================================================================
//
// Turns a cleaned `NumericTable` into a `PriceTable` or a `ValidationError`.
//
// Order of checks:
//   1. every column matches the index length
//   2. Open / High / Low present by exact name (all missing ones reported)
//   3. at least one close-like column present (see `CLOSE_CANDIDATES`)
//   4. non-empty, strictly increasing index
//   5. per row: finite Open/High/Low and a finite close-like value
//
// The close value of a row is the first non-missing candidate in priority
// order, so an `Adj Close` can stand in for a blank `Close`. Only when every
// candidate is missing is the row rejected. Validation stops at the first
// invalid row; rows are never dropped.
// =============================================================================

use tracing::{debug, info};

use crate::error::ValidationError;
use crate::table::{NumericColumn, NumericTable, PriceTable};

/// Fields that must exist by exact name.
pub const REQUIRED_COLUMNS: &[&str] = &["Open", "High", "Low"];

/// Canonical name of the close-like field in a validated table.
pub const CANONICAL_CLOSE: &str = "Close";

/// Accepted close-like column names in priority order.
pub const CLOSE_CANDIDATES: &[&str] = &["Close", "Adj Close", "AdjClose", "Price"];

pub fn validate(table: &NumericTable) -> Result<PriceTable, ValidationError> {
    let rows = table.row_count();

    for column in &table.columns {
        if column.values.len() != rows {
            return Err(ValidationError::RaggedColumn {
                column: column.name.clone(),
                expected: rows,
                actual: column.values.len(),
            });
        }
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !table.has_column(name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns(missing));
    }

    let close_positions: Vec<usize> = CLOSE_CANDIDATES
        .iter()
        .filter_map(|name| column_position(table, name))
        .collect();
    let close_columns: Vec<&NumericColumn> =
        close_positions.iter().map(|&i| &table.columns[i]).collect();
    if close_columns.is_empty() {
        return Err(ValidationError::NoCloseColumn {
            candidates: CLOSE_CANDIDATES.iter().map(|s| s.to_string()).collect(),
        });
    }
    if close_columns[0].name != CANONICAL_CLOSE {
        info!(
            alias = %close_columns[0].name,
            canonical = CANONICAL_CLOSE,
            "resolved close-like column from alias"
        );
    }

    if rows == 0 {
        return Err(ValidationError::Empty);
    }

    for (row, pair) in table.index.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(ValidationError::UnorderedIndex {
                row: row + 1,
                key: pair[1].to_string(),
            });
        }
    }

    let open = required_values(table, "Open");
    let high = required_values(table, "High");
    let low = required_values(table, "Low");

    let mut validated = PriceTable {
        index: table.index.clone(),
        open: Vec::with_capacity(rows),
        high: Vec::with_capacity(rows),
        low: Vec::with_capacity(rows),
        close: Vec::with_capacity(rows),
        extra: Vec::new(),
    };

    let mut filled_from_fallback = 0usize;
    for row in 0..rows {
        let source = close_source(&close_columns, row);
        if source.is_some_and(|i| i > 0) {
            filled_from_fallback += 1;
        }
        let close = source.and_then(|i| close_columns[i].values[row]);
        let row_values = [
            ("Open", open[row]),
            ("High", high[row]),
            ("Low", low[row]),
            (CANONICAL_CLOSE, close),
        ];

        let fields: Vec<String> = row_values
            .iter()
            .filter(|(_, v)| !v.is_some_and(f64::is_finite))
            .map(|(name, _)| name.to_string())
            .collect();
        if !fields.is_empty() {
            return Err(ValidationError::InvalidRow {
                row,
                key: table.index[row].to_string(),
                fields,
            });
        }

        // All four are finite at this point.
        let [o, h, l, c] = row_values.map(|(_, v)| v.unwrap_or_default());
        validated.open.push(o);
        validated.high.push(h);
        validated.low.push(l);
        validated.close.push(c);
    }

    if filled_from_fallback > 0 {
        debug!(
            rows = filled_from_fallback,
            primary = %close_columns[0].name,
            "close values filled from fallback columns"
        );
    }

    let consumed: Vec<usize> = REQUIRED_COLUMNS
        .iter()
        .filter_map(|name| column_position(table, name))
        .chain(close_positions)
        .collect();
    validated.extra = table
        .columns
        .iter()
        .enumerate()
        .filter(|(i, _)| !consumed.contains(i))
        .map(|(_, c)| c.clone())
        .collect();

    debug!(
        rows,
        extra_columns = validated.extra.len(),
        "table validated"
    );
    Ok(validated)
}

/// Values of a required column. Presence is checked before this is called.
fn required_values<'a>(table: &'a NumericTable, name: &str) -> &'a [Option<f64>] {
    table.column(name).map_or(&[], |c| c.values.as_slice())
}

/// Position (within `candidates`) of the column supplying the close of `row`.
fn close_source(candidates: &[&NumericColumn], row: usize) -> Option<usize> {
    candidates.iter().position(|c| c.values[row].is_some())
}

fn column_position(table: &NumericTable, name: &str) -> Option<usize> {
    table.columns.iter().position(|c| c.name == name)
}
