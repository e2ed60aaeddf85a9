// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators offered by the
// analysis page. The per-indicator modules operate on plain slices; this
// module adds the request model and the engine entry point that reads the
// close series of a validated `PriceTable` and returns freshly allocated,
// index-aligned series with `None` for warm-up positions.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigurationError, IndicatorError};
use crate::table::PriceTable;
use crate::types::MovingAverageKind;

// =============================================================================
// Request / response model
// =============================================================================

/// One analysis request as accepted from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndicatorRequest {
    MovingAverage {
        #[serde(default)]
        kind: MovingAverageKind,
        window: usize,
    },
    Rsi {
        period: usize,
    },
    Macd {
        short_window: usize,
        long_window: usize,
        signal_window: usize,
    },
}

impl IndicatorRequest {
    /// Reject non-positive windows before any computation starts.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            Self::MovingAverage { window, .. } => positive("window", window),
            Self::Rsi { period } => positive("period", period),
            Self::Macd {
                short_window,
                long_window,
                signal_window,
            } => {
                positive("short_window", short_window)?;
                positive("long_window", long_window)?;
                positive("signal_window", signal_window)
            }
        }
    }
}

fn positive(name: &'static str, value: usize) -> Result<(), ConfigurationError> {
    if value == 0 {
        Err(ConfigurationError::NonPositive { name, value })
    } else {
        Ok(())
    }
}

/// A named indicator series aligned index-for-index with its source table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    fn defined(name: String, values: Vec<f64>) -> Self {
        Self {
            name,
            values: values.into_iter().map(Some).collect(),
        }
    }
}

// =============================================================================
// Engine entry point
// =============================================================================

/// Compute the series for `request` over the close field of `table`.
///
/// Moving averages and RSI return one series; MACD returns the MACD line
/// followed by its signal line.
pub fn compute(
    table: &PriceTable,
    request: &IndicatorRequest,
) -> Result<Vec<IndicatorSeries>, IndicatorError> {
    request.validate()?;

    if let Some(position) = table.close.iter().position(|v| !v.is_finite()) {
        return Err(IndicatorError::NonNumericClose { position });
    }
    let closes = &table.close;

    let series = match *request {
        IndicatorRequest::MovingAverage {
            kind: MovingAverageKind::Sma,
            window,
        } => vec![IndicatorSeries {
            name: format!("SMA_{window}"),
            values: sma::sma_of(closes, window),
        }],
        IndicatorRequest::MovingAverage {
            kind: MovingAverageKind::Ema,
            window,
        } => vec![IndicatorSeries::defined(
            format!("EMA_{window}"),
            ema::calculate_ema(closes, window),
        )],
        IndicatorRequest::Rsi { period } => vec![IndicatorSeries {
            name: format!("RSI ({period})"),
            values: rsi::calculate_rsi(closes, period),
        }],
        IndicatorRequest::Macd {
            short_window,
            long_window,
            signal_window,
        } => {
            if short_window >= long_window {
                warn!(
                    short_window,
                    long_window, "MACD short window is not below the long window"
                );
            }
            let lines = macd::calculate_macd(closes, short_window, long_window, signal_window);
            vec![
                IndicatorSeries::defined(format!("MACD ({short_window}-{long_window})"), lines.macd),
                IndicatorSeries::defined(format!("Signal ({signal_window})"), lines.signal),
            ]
        }
    };

    debug!(request = ?request, rows = closes.len(), "indicator computed");
    Ok(series)
}
