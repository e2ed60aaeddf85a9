// =============================================================================
// Shared types used across the stock analyzer
// =============================================================================

use serde::{Deserialize, Serialize};

/// Which moving-average flavour an analysis request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovingAverageKind {
    #[serde(rename = "SMA")]
    Sma,
    #[serde(rename = "EMA")]
    Ema,
}

impl Default for MovingAverageKind {
    fn default() -> Self {
        Self::Sma
    }
}

impl std::fmt::Display for MovingAverageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sma => write!(f, "SMA"),
            Self::Ema => write!(f, "EMA"),
        }
    }
}

/// Where the currently loaded dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetSource {
    Upload,
    Ticker,
}

impl std::fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upload => write!(f, "Upload"),
            Self::Ticker => write!(f, "Ticker"),
        }
    }
}

/// One of the four canonical price fields of a validated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

impl Default for PriceField {
    fn default() -> Self {
        Self::Close
    }
}

impl PriceField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::High => "High",
            Self::Low => "Low",
            Self::Close => "Close",
        }
    }
}

impl std::fmt::Display for PriceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
