// =============================================================================
// Relative Strength Index (RSI) — simple-average variant
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes.
//
// Step 1 — delta_i = close_i - close_{i-1}   (undefined at i = 0)
// Step 2 — gain = max(delta, 0), loss = max(-delta, 0)
// Step 3 — avg_gain / avg_loss = SMA(period) of gain / loss
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// When avg_loss is exactly zero RS is taken as +inf and RSI is 100, even if
// avg_gain is also zero. The first `period` positions are undefined.
// =============================================================================

use super::sma::calculate_sma;

/// Compute the RSI series for `closes` over `period` steps.
///
/// The output is aligned with `closes`; warm-up positions are `None`.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());

    for i in 0..closes.len() {
        if i == 0 {
            gains.push(None);
            losses.push(None);
            continue;
        }
        let delta = closes[i] - closes[i - 1];
        gains.push(Some(delta.max(0.0)));
        losses.push(Some((-delta).max(0.0)));
    }

    let avg_gain = calculate_sma(&gains, period);
    let avg_loss = calculate_sma(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(g, l)| Some(rsi_from_averages(g?, l?)))
        .collect()
}

/// Convert average gain / average loss into an RSI value in [0, 100].
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_empty_input() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_first_period_positions_undefined() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let rsi = calculate_rsi(&closes, 14);
        assert_eq!(rsi.len(), closes.len());
        assert!(rsi[..14].iter().all(Option::is_none));
        assert!(rsi[14..].iter().all(Option::is_some));
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        for v in calculate_rsi(&closes, 14).into_iter().flatten() {
            assert!((v - 100.0).abs() < 1e-10, "expected 100.0, got {v}");
        }
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        for v in calculate_rsi(&closes, 14).into_iter().flatten() {
            assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
        }
    }

    #[test]
    fn rsi_flat_market_is_100() {
        // avg_loss == 0 => limiting case, regardless of avg_gain.
        let rsi = calculate_rsi(&[100.0; 30], 14);
        for v in rsi.into_iter().flatten() {
            assert!((v - 100.0).abs() < 1e-10);
        }
    }

    #[test]
    fn rsi_known_value() {
        // deltas: +2, -1, +1 => avg_gain = 1, avg_loss = 1/3 => RS = 3 => RSI = 75
        let rsi = calculate_rsi(&[10.0, 12.0, 11.0, 12.0], 3);
        assert_eq!(&rsi[..3], &[None, None, None]);
        assert!((rsi[3].unwrap() - 75.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_range_check() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        for v in calculate_rsi(&closes, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
        }
    }

    #[test]
    fn rsi_from_averages_limits() {
        assert_eq!(rsi_from_averages(0.0, 0.0), 100.0);
        assert_eq!(rsi_from_averages(2.0, 0.0), 100.0);
        assert_eq!(rsi_from_averages(0.0, 2.0), 0.0);
        assert!((rsi_from_averages(1.0, 1.0) - 50.0).abs() < 1e-10);
    }
}
