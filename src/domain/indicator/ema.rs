//! Exponential Moving Average.
//!
//! α = 2/(n+1), seeded with the first raw value, then
//! EMA[i] = (x[i] - EMA[i-1])·α + EMA[i-1].
//! Warmup: the first (n-1) computed values are overwritten with NaN.

pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }
    let Some((&first, rest)) = values.split_first() else {
        return Vec::new();
    };

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = first;
    out.push(ema);

    for &x in rest {
        ema = (x - ema) * alpha + ema;
        out.push(ema);
    }

    for v in out.iter_mut().take(period - 1) {
        *v = f64::NAN;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_warmup() {
        let out = calculate_ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert!(!out[2].is_nan());
        assert!(!out[4].is_nan());
    }

    #[test]
    fn ema_period_1_is_identity() {
        let out = calculate_ema(&[10.0, 20.0, 30.0], 1);
        assert_eq!(out, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn ema_seeded_with_first_value() {
        let alpha = 2.0 / 4.0;
        let e1 = (20.0 - 10.0) * alpha + 10.0;
        let e2 = (30.0 - e1) * alpha + e1;
        let e3 = (40.0 - e2) * alpha + e2;

        let out = calculate_ema(&[10.0, 20.0, 30.0, 40.0], 3);
        assert!((out[2] - e2).abs() < 1e-12);
        assert!((out[3] - e3).abs() < 1e-12);
    }

    #[test]
    fn ema_equal_prices() {
        let out = calculate_ema(&[100.0; 6], 3);
        for v in &out[2..] {
            assert!((v - 100.0).abs() < 1e-12);
        }
    }

    #[test]
    fn ema_short_series_all_warmup() {
        let out = calculate_ema(&[1.0, 2.0], 5);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn ema_empty() {
        assert!(calculate_ema(&[], 3).is_empty());
    }

    #[test]
    fn ema_period_0() {
        let out = calculate_ema(&[10.0, 20.0], 0);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_nan()));
    }
}
