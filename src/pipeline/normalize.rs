// =============================================================================
// Column Normalizer
// =============================================================================
//
// Flattens multi-level column labels (e.g. `("Close", "AAPL")` as produced by
// ticker data providers) down to their primary level. Column order and cell
// content are untouched; flat tables pass through unchanged.

use tracing::debug;

use crate::table::{ColumnLabel, RawTable};

pub fn flatten_columns(mut table: RawTable) -> RawTable {
    let composite = table.columns.iter().filter(|c| c.label.is_composite()).count();
    if composite == 0 {
        return table;
    }

    for column in &mut table.columns {
        if column.label.is_composite() {
            column.label = ColumnLabel::flat(column.label.primary());
        }
    }

    debug!(columns = composite, "flattened composite column labels");
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{RawCell, RawColumn};

    fn column(label: ColumnLabel, v: f64) -> RawColumn {
        RawColumn::new(label, vec![RawCell::Number(v)])
    }

    #[test]
    fn composite_close_becomes_flat_close() {
        let table = RawTable::with_positional_index(vec![column(
            ColumnLabel::composite(["Close", "AAPL"]),
            187.5,
        )]);
        let flat = flatten_columns(table);
        assert_eq!(flat.columns[0].label, ColumnLabel::flat("Close"));
        assert_eq!(flat.columns[0].cells, vec![RawCell::Number(187.5)]);
    }

    #[test]
    fn preserves_column_order() {
        let table = RawTable::with_positional_index(vec![
            column(ColumnLabel::composite(["Open", "MSFT"]), 1.0),
            column(ColumnLabel::flat("Note"), 2.0),
            column(ColumnLabel::composite(["Low", "MSFT"]), 3.0),
        ]);
        let names: Vec<String> = flatten_columns(table)
            .columns
            .iter()
            .map(|c| c.label.to_string())
            .collect();
        assert_eq!(names, vec!["Open", "Note", "Low"]);
    }

    #[test]
    fn flat_table_passes_through() {
        let table = RawTable::with_positional_index(vec![column(ColumnLabel::flat("High"), 4.0)]);
        assert_eq!(flatten_columns(table.clone()), table);
    }
}
