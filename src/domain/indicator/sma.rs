//! Simple Moving Average.
//!
//! SMA[i] = mean(x[i-n+1..=i]). Warmup: first (n-1) entries are NaN.
//! Maintained with a rolling sum so each step is O(1).

pub fn calculate_sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let n = period as f64;
    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = sum / n;

    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = sum / n;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_basic() {
        let out = calculate_sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 5);
        assert_eq!(out.len(), 5);
        for v in &out[..4] {
            assert!(v.is_nan());
        }
        assert!((out[4] - 30.0).abs() < 1e-12);
    }

    #[test]
    fn sma_rolls_forward() {
        let out = calculate_sma(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);
        assert!((out[2] - 2.0).abs() < 1e-12);
        assert!((out[3] - 3.0).abs() < 1e-12);
        assert!((out[5] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn sma_matches_naive_window_mean() {
        let values: Vec<f64> = (0..200)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 5.0)
            .collect();
        let out = calculate_sma(&values, 14);
        for i in 13..values.len() {
            let naive: f64 = values[i + 1 - 14..=i].iter().sum::<f64>() / 14.0;
            assert!((out[i] - naive).abs() < 1e-9, "mismatch at {}", i);
        }
    }

    #[test]
    fn sma_period_longer_than_series() {
        let out = calculate_sma(&[1.0, 2.0], 5);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sma_period_0() {
        let out = calculate_sma(&[1.0, 2.0], 0);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sma_empty() {
        assert!(calculate_sma(&[], 3).is_empty());
    }
}
