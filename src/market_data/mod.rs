pub mod csv_loader;
pub mod provider;

// Re-export the ingestion entry points (e.g. `use crate::market_data::load_csv`).
pub use csv_loader::{dataset_label, load_csv, UploadKind};
pub use provider::ChartProviderClient;
