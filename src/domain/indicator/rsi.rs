//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss:
//! - First average: simple mean of the first n price changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! RS = avg_gain / avg_loss, with RS = 100 when avg_loss == 0.
//! RSI = 100 - 100 / (1 + RS), which keeps the output inside [0, 100].
//!
//! Warmup: the first n entries are NaN (n changes need n+1 prices).

pub fn calculate_rsi(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }

    let n = period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..=period {
        let change = values[i] - values[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= n;
    avg_loss /= n;
    out[period] = rsi_from_averages(avg_gain, avg_loss);

    for i in (period + 1)..values.len() {
        let change = values[i] - values[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = (avg_gain * (n - 1.0) + gain) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss) / n;
        out[i] = rsi_from_averages(avg_gain, avg_loss);
    }

    out
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss == 0.0 {
        100.0
    } else {
        avg_gain / avg_loss
    };
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_empty() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_warmup_period() {
        let values: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let out = calculate_rsi(&values, 14);

        assert_eq!(out.len(), 15);
        for (i, v) in out.iter().enumerate().take(14) {
            assert!(v.is_nan(), "index {} should be warm-up", i);
        }
        assert!(!out[14].is_nan());
    }

    #[test]
    fn rsi_all_gains_uses_rs_100() {
        let values: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let out = calculate_rsi(&values, 14);
        let expected = 100.0 - 100.0 / 101.0;
        assert!((out[14] - expected).abs() < 1e-9);
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let values: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let out = calculate_rsi(&values, 14);
        assert!(out[14].abs() < 1e-12);
    }

    #[test]
    fn rsi_balanced_moves_is_fifty() {
        // +1, -1, +1, -1: equal average gain and loss
        let out = calculate_rsi(&[10.0, 11.0, 10.0, 11.0, 10.0], 4);
        assert!((out[4] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_wilder_smoothing_step() {
        // changes: +2, -1 | +3
        let out = calculate_rsi(&[10.0, 12.0, 11.0, 14.0], 2);
        let gain = (1.0 * 1.0 + 3.0) / 2.0;
        let loss = (0.5 * 1.0 + 0.0) / 2.0;
        let expected = 100.0 - 100.0 / (1.0 + gain / loss);
        assert!((out[3] - expected).abs() < 1e-9);
    }

    #[test]
    fn rsi_in_range() {
        let values: Vec<f64> = (1..=60)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        for v in calculate_rsi(&values, 14).iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(v), "RSI {} out of range", v);
        }
    }

    #[test]
    fn rsi_zero_period() {
        let out = calculate_rsi(&[100.0, 101.0], 0);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_nan()));
    }
}
