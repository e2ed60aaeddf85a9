// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
// MACD   = EMA(short) - EMA(long)      on the close series
// Signal = EMA(signal) of the MACD line
//
// Both lines are defined at every position. Window ordering is not enforced:
// a short window above the long window simply inverts the sign of the line.

use super::ema::calculate_ema;

/// MACD line and its signal line, aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

pub fn calculate_macd(
    closes: &[f64],
    short_window: usize,
    long_window: usize,
    signal_window: usize,
) -> MacdLines {
    let short = calculate_ema(closes, short_window);
    let long = calculate_ema(closes, long_window);
    let macd: Vec<f64> = short.iter().zip(&long).map(|(s, l)| s - l).collect();
    let signal = calculate_ema(&macd, signal_window);
    MacdLines { macd, signal }
}
