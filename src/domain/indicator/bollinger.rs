//! Bollinger Bands.
//!
//! - Middle: mean of the trailing n values (SMA)
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the population standard deviation of the window (divides by N).
//! Warmup: first (period-1) entries are NaN in all three bands.

use crate::domain::indicator::BollingerBand;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerOutput {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl BollingerOutput {
    pub fn into_band(self, band: BollingerBand) -> Vec<f64> {
        match band {
            BollingerBand::Upper => self.upper,
            BollingerBand::Middle => self.middle,
            BollingerBand::Lower => self.lower,
        }
    }
}

pub fn calculate_bollinger(values: &[f64], period: usize, multiplier: f64) -> BollingerOutput {
    let len = values.len();
    let mut out = BollingerOutput {
        upper: vec![f64::NAN; len],
        middle: vec![f64::NAN; len],
        lower: vec![f64::NAN; len],
    };
    if period == 0 || len < period {
        return out;
    }

    let n = period as f64;
    for i in (period - 1)..len {
        let window = &values[i + 1 - period..=i];
        let middle = window.iter().sum::<f64>() / n;
        let variance = window.iter().map(|v| (v - middle).powi(2)).sum::<f64>() / n;
        let band = multiplier * variance.sqrt();

        out.middle[i] = middle;
        out.upper[i] = middle + band;
        out.lower[i] = middle - band;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_warmup() {
        let out = calculate_bollinger(&[1.0, 2.0, 3.0, 4.0], 3, 2.0);
        assert!(out.middle[1].is_nan());
        assert!(out.upper[1].is_nan());
        assert!(!out.middle[2].is_nan());
    }

    #[test]
    fn bollinger_known_values() {
        // window [2, 4, 6]: mean 4, population variance 8/3
        let out = calculate_bollinger(&[2.0, 4.0, 6.0], 3, 2.0);
        let sd = (8.0_f64 / 3.0).sqrt();
        assert!((out.middle[2] - 4.0).abs() < 1e-12);
        assert!((out.upper[2] - (4.0 + 2.0 * sd)).abs() < 1e-12);
        assert!((out.lower[2] - (4.0 - 2.0 * sd)).abs() < 1e-12);
    }

    #[test]
    fn bollinger_flat_series_collapses_bands() {
        let out = calculate_bollinger(&[10.0; 5], 3, 2.0);
        for i in 2..5 {
            assert_eq!(out.upper[i], out.middle[i]);
            assert_eq!(out.lower[i], out.middle[i]);
        }
    }

    #[test]
    fn bollinger_band_ordering() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.7).cos() * 4.0).collect();
        let out = calculate_bollinger(&values, DEFAULT_PERIOD, DEFAULT_MULTIPLIER);
        for i in 19..60 {
            assert!(out.upper[i] >= out.middle[i]);
            assert!(out.middle[i] >= out.lower[i]);
        }
    }

    #[test]
    fn bollinger_middle_matches_sma() {
        use crate::domain::indicator::calculate_sma;
        let values: Vec<f64> = (0..40).map(|i| 50.0 + (i % 6) as f64).collect();
        let out = calculate_bollinger(&values, 5, 2.0);
        let sma = calculate_sma(&values, 5);
        for i in 4..40 {
            assert!((out.middle[i] - sma[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn bollinger_period_0() {
        let out = calculate_bollinger(&[1.0, 2.0], 0, 2.0);
        assert_eq!(out.upper.len(), 2);
        assert!(out.upper.iter().all(|v| v.is_nan()));
    }
}
