// =============================================================================
// Preparation Pipeline
// =============================================================================
//
// raw table -> Column Normalizer -> Numeric Cleaner -> Schema Validator
//
// Cell-level coercion failures are recovered locally and surfaced as
// warnings; anything that leaves the table structurally unsound fails the
// whole run.

pub mod cleaner;
pub mod normalize;
pub mod validation;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{CoercionWarning, ValidationError};
use crate::table::{PriceTable, RawTable};

pub use cleaner::{clean_column, clean_table, parse_decorated, ParsedCell};
pub use normalize::flatten_columns;
pub use validation::{validate, CANONICAL_CLOSE, CLOSE_CANDIDATES, REQUIRED_COLUMNS};

/// Verbosity knobs handed to the pipeline at construction.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Log table previews at `debug` level.
    pub debug_previews: bool,
    pub preview_rows: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            debug_previews: false,
            preview_rows: 5,
        }
    }
}

/// A validated table together with the non-fatal warnings raised on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedDataset {
    pub table: PriceTable,
    pub warnings: Vec<CoercionWarning>,
}

#[derive(Debug, Clone, Default)]
pub struct DataPipeline {
    options: PipelineOptions,
}

impl DataPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn run(&self, raw: RawTable) -> Result<PreparedDataset, ValidationError> {
        if self.options.debug_previews {
            self.preview_raw(&raw);
        }

        let flat = flatten_columns(raw);
        let (numeric, warnings) = clean_table(flat);

        let table = match validate(&numeric) {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "dataset rejected by validation");
                return Err(e);
            }
        };

        if self.options.debug_previews {
            for row in table.head(self.options.preview_rows) {
                debug!(row = %row, "validated preview");
            }
        }

        info!(
            rows = table.len(),
            warnings = warnings.len(),
            "dataset prepared"
        );
        Ok(PreparedDataset { table, warnings })
    }

    fn preview_raw(&self, raw: &RawTable) {
        let labels: Vec<String> = raw.columns.iter().map(|c| c.label.to_string()).collect();
        debug!(columns = ?labels, rows = raw.row_count(), "raw uploaded data");
        for row in 0..raw.row_count().min(self.options.preview_rows) {
            let cells: Vec<_> = raw.columns.iter().map(|c| c.cells.get(row)).collect();
            debug!(key = %raw.index[row], cells = ?cells, "raw preview");
        }
    }
}
