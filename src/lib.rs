// =============================================================================
// Stock Analyzer — library root
// =============================================================================
//
// Data preparation (normalize -> clean -> validate) and the technical
// indicator engine, plus the ingestion sources and HTTP surface used by the
// dashboard binary.
// =============================================================================

pub mod api;
pub mod app_state;
pub mod charts;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod pipeline;
pub mod runtime_config;
pub mod table;
pub mod types;

pub use error::{CoercionWarning, ConfigurationError, IndicatorError, ValidationError};
pub use indicators::{compute, IndicatorRequest, IndicatorSeries};
pub use pipeline::{DataPipeline, PipelineOptions, PreparedDataset};
pub use table::{ColumnLabel, NumericTable, PriceTable, RawCell, RawColumn, RawTable, RowKey};
