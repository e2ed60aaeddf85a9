// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// SMA_i = mean(values[i - window + 1 ..= i])
//
// The first `window - 1` positions have insufficient history and are left
// undefined. Undefined inputs propagate: a window containing an undefined
// value is itself undefined.
// =============================================================================

/// Rolling arithmetic mean over `window` observations.
///
/// The output has the same length as `values`. `window == 0` yields an
/// all-undefined series.
pub fn calculate_sma(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return result;
    }

    for (offset, slice) in values.windows(window).enumerate() {
        let sum: Option<f64> = slice.iter().copied().sum();
        result[offset + window - 1] = sum.map(|s| s / window as f64);
    }
    result
}

/// Convenience wrapper for fully defined inputs such as a close series.
pub fn sma_of(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let defined: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    calculate_sma(&defined, window)
}
