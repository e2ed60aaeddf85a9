// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   alpha  = 2 / (window + 1)
//   EMA_0  = value_0
//   EMA_t  = alpha * value_t + (1 - alpha) * EMA_{t-1}
//
// The recursion is seeded with the first value itself, so every position is
// defined. Early values are less meaningful but are reported as-is.
// =============================================================================

/// Smoothing factor for a span of `window` observations.
pub fn smoothing_factor(window: usize) -> f64 {
    2.0 / (window as f64 + 1.0)
}

/// Compute the EMA series for `values` with span `window`.
///
/// Returns one value per input. An empty input yields an empty vec;
/// `window == 0` yields `alpha = 2`, which callers reject beforehand.
pub fn calculate_ema(values: &[f64], window: usize) -> Vec<f64> {
    let Some(&seed) = values.first() else {
        return Vec::new();
    };

    let alpha = smoothing_factor(window);
    let mut result = Vec::with_capacity(values.len());
    result.push(seed);

    let mut prev = seed;
    for &value in &values[1..] {
        let ema = alpha * value + (1.0 - alpha) * prev;
        result.push(ema);
        prev = ema;
    }
    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_seed_is_first_value() {
        let closes = [42.5, 40.0, 41.0];
        let ema = calculate_ema(&closes, 10);
        assert_eq!(ema.len(), closes.len());
        assert_eq!(ema[0], 42.5);
    }

    #[test]
    fn ema_known_values() {
        // alpha = 2 / (3 + 1) = 0.5
        let ema = calculate_ema(&[10.0, 20.0, 30.0, 20.0], 3);
        let expected = [10.0, 15.0, 22.5, 21.25];
        for (a, b) in ema.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-10, "got {a}, expected {b}");
        }
    }

    #[test]
    fn ema_matches_recursion() {
        let closes: Vec<f64> = (1..=30).map(|x| (x as f64).sin() * 10.0 + 100.0).collect();
        let ema = calculate_ema(&closes, 12);
        let alpha = 2.0 / 13.0;
        let mut expected = closes[0];
        for (i, &c) in closes.iter().enumerate().skip(1) {
            expected = alpha * c + (1.0 - alpha) * expected;
            assert!((ema[i] - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn ema_window_one_tracks_input() {
        let closes = [5.0, 7.0, 6.0];
        assert_eq!(calculate_ema(&closes, 1), closes.to_vec());
    }

    #[test]
    fn ema_flat_series_stays_flat() {
        let ema = calculate_ema(&[100.0; 20], 9);
        assert!(ema.iter().all(|v| (v - 100.0).abs() < 1e-10));
    }
}
