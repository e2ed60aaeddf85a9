// =============================================================================
// Central Application State — Stock Analyzer
// =============================================================================
//
// Holds the configuration, the provider client and the dataset currently
// loaded into the dashboard. Only one dataset is loaded at a time; loading a
// new one replaces the previous one.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for the configuration and the loaded dataset.
//   - Loaded datasets are shared as `Arc` so analysis runs outside the lock.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use crate::error::CoercionWarning;
use crate::market_data::ChartProviderClient;
use crate::pipeline::{DataPipeline, PreparedDataset};
use crate::runtime_config::AnalyzerConfig;
use crate::table::PriceTable;
use crate::types::DatasetSource;

// =============================================================================
// Loaded dataset
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoadedDataset {
    pub id: String,
    pub name: String,
    pub source: DatasetSource,
    pub loaded_at: DateTime<Utc>,
    pub table: PriceTable,
    pub warnings: Vec<CoercionWarning>,
}

impl LoadedDataset {
    pub fn new(name: impl Into<String>, source: DatasetSource, prepared: PreparedDataset) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            source,
            loaded_at: Utc::now(),
            table: prepared.table,
            warnings: prepared.warnings,
        }
    }
}

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across request handlers via `Arc<AppState>`.
pub struct AppState {
    /// Incremented whenever the loaded dataset changes.
    pub state_version: AtomicU64,

    pub config: Arc<RwLock<AnalyzerConfig>>,

    pub provider: ChartProviderClient,

    dataset: RwLock<Option<Arc<LoadedDataset>>>,

    /// Instant when the server was started. Used for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        let provider = ChartProviderClient::new(config.provider_base_url.clone())?;
        Ok(Self {
            state_version: AtomicU64::new(1),
            config: Arc::new(RwLock::new(config)),
            provider,
            dataset: RwLock::new(None),
            start_time: std::time::Instant::now(),
        })
    }

    /// A pipeline configured from the current settings.
    pub fn pipeline(&self) -> DataPipeline {
        DataPipeline::new(self.config.read().pipeline_options())
    }

    pub fn current_dataset(&self) -> Option<Arc<LoadedDataset>> {
        self.dataset.read().clone()
    }

    /// Replace the loaded dataset and return it.
    pub fn set_dataset(&self, dataset: LoadedDataset) -> Arc<LoadedDataset> {
        let dataset = Arc::new(dataset);
        info!(
            id = %dataset.id,
            name = %dataset.name,
            source = %dataset.source,
            rows = dataset.table.len(),
            "dataset loaded"
        );
        *self.dataset.write() = Some(dataset.clone());
        self.increment_version();
        dataset
    }

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
