// =============================================================================
// Runtime Configuration — analyzer settings loaded from JSON
// =============================================================================
//
// Every tunable lives here: verbosity, server/provider endpoints, and the
// practical parameter ranges the dashboard allows for each indicator. All
// fields carry `#[serde(default)]` so that older or partial files keep
// loading.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigurationError;
use crate::indicators::IndicatorRequest;
use crate::pipeline::PipelineOptions;
use crate::types::MovingAverageKind;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_preview_rows() -> usize {
    5
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_provider_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_date_column() -> String {
    "Date".to_string()
}

// =============================================================================
// ParameterLimits
// =============================================================================

/// Inclusive `min..=max` bounds for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub min: usize,
    pub max: usize,
}

impl Range {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    fn check(self, name: &'static str, value: usize) -> Result<(), ConfigurationError> {
        if value < self.min || value > self.max {
            Err(ConfigurationError::OutOfRange {
                name,
                value,
                min: self.min,
                max: self.max,
            })
        } else {
            Ok(())
        }
    }
}

/// Practical ranges offered by the analysis page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterLimits {
    #[serde(default = "ParameterLimits::default_ma_window")]
    pub ma_window: Range,
    #[serde(default = "ParameterLimits::default_rsi_period")]
    pub rsi_period: Range,
    #[serde(default = "ParameterLimits::default_macd_short")]
    pub macd_short: Range,
    #[serde(default = "ParameterLimits::default_macd_long")]
    pub macd_long: Range,
    #[serde(default = "ParameterLimits::default_macd_signal")]
    pub macd_signal: Range,
}

impl ParameterLimits {
    fn default_ma_window() -> Range {
        Range::new(5, 200)
    }

    fn default_rsi_period() -> Range {
        Range::new(5, 50)
    }

    fn default_macd_short() -> Range {
        Range::new(5, 50)
    }

    fn default_macd_long() -> Range {
        Range::new(5, 200)
    }

    fn default_macd_signal() -> Range {
        Range::new(5, 50)
    }

    /// Check a request against these ranges. Positivity is checked by the
    /// engine itself.
    pub fn check(&self, request: &IndicatorRequest) -> Result<(), ConfigurationError> {
        match *request {
            IndicatorRequest::MovingAverage { window, .. } => self.ma_window.check("window", window),
            IndicatorRequest::Rsi { period } => self.rsi_period.check("period", period),
            IndicatorRequest::Macd {
                short_window,
                long_window,
                signal_window,
            } => {
                self.macd_short.check("short_window", short_window)?;
                self.macd_long.check("long_window", long_window)?;
                self.macd_signal.check("signal_window", signal_window)
            }
        }
    }
}

impl Default for ParameterLimits {
    fn default() -> Self {
        Self {
            ma_window: Self::default_ma_window(),
            rsi_period: Self::default_rsi_period(),
            macd_short: Self::default_macd_short(),
            macd_long: Self::default_macd_long(),
            macd_signal: Self::default_macd_signal(),
        }
    }
}

// =============================================================================
// IndicatorDefaults
// =============================================================================

/// Initial values shown by the analysis page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorDefaults {
    pub ma_kind: MovingAverageKind,
    pub ma_window: usize,
    pub rsi_period: usize,
    pub macd_short: usize,
    pub macd_long: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorDefaults {
    fn default() -> Self {
        Self {
            ma_kind: MovingAverageKind::Sma,
            ma_window: 20,
            rsi_period: 14,
            macd_short: 12,
            macd_long: 26,
            macd_signal: 9,
        }
    }
}

impl IndicatorDefaults {
    pub fn requests(&self) -> [IndicatorRequest; 3] {
        [
            IndicatorRequest::MovingAverage {
                kind: self.ma_kind,
                window: self.ma_window,
            },
            IndicatorRequest::Rsi {
                period: self.rsi_period,
            },
            IndicatorRequest::Macd {
                short_window: self.macd_short,
                long_window: self.macd_long,
                signal_window: self.macd_signal,
            },
        ]
    }
}

// =============================================================================
// AnalyzerConfig
// =============================================================================

/// Top-level configuration for the analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Log raw and validated table previews while preparing datasets.
    #[serde(default)]
    pub debug: bool,

    /// Rows shown in previews (logs and the dataset endpoint).
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base URL of the chart data provider.
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,

    /// Date column assumed for uploads that do not name one.
    #[serde(default = "default_date_column")]
    pub default_date_column: String,

    #[serde(default)]
    pub limits: ParameterLimits,

    #[serde(default)]
    pub defaults: IndicatorDefaults,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            debug: false,
            preview_rows: default_preview_rows(),
            bind_addr: default_bind_addr(),
            provider_base_url: default_provider_base_url(),
            default_date_column: default_date_column(),
            limits: ParameterLimits::default(),
            defaults: IndicatorDefaults::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analyzer config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse analyzer config from {}", path.display()))?;

        info!(
            path = %path.display(),
            debug = config.debug,
            bind_addr = %config.bind_addr,
            "analyzer config loaded"
        );

        Ok(config)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            debug_previews: self.debug,
            preview_rows: self.preview_rows,
        }
    }
}
