//! Average True Range.
//!
//! TR[0] = high - low; TR[i] = max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR = EMA(period) of the true range series, so it shares the EMA warm-up.

use crate::domain::candle::Candle;
use crate::domain::indicator::calculate_ema;

pub fn calculate_atr(candles: &[Candle], period: usize) -> Vec<f64> {
    let true_ranges: Vec<f64> = candles
        .iter()
        .enumerate()
        .map(|(i, c)| match i {
            0 => c.high - c.low,
            _ => c.true_range(candles[i - 1].close),
        })
        .collect();

    calculate_ema(&true_ranges, period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_candle(day: i64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::days(day),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn atr_period_1_is_true_range() {
        let candles = vec![
            make_candle(0, 12.0, 8.0, 10.0),
            make_candle(1, 15.0, 11.0, 14.0),
            make_candle(2, 13.0, 12.0, 12.5),
        ];
        let out = calculate_atr(&candles, 1);
        // first bar: 12-8; second: |15-10| = 5; third: |12-14| = 2
        assert_eq!(out, vec![4.0, 5.0, 2.0]);
    }

    #[test]
    fn atr_is_ema_of_true_range() {
        let candles: Vec<Candle> = (0..10)
            .map(|i| {
                let base = 100.0 + i as f64;
                make_candle(i, base + 2.0, base - 1.0, base + 0.5)
            })
            .collect();
        let out = calculate_atr(&candles, 3);
        assert!(out[1].is_nan());
        assert!(out[2] > 0.0);
        assert_eq!(out.len(), 10);
    }

    #[test]
    fn atr_single_candle_keeps_length() {
        let out = calculate_atr(&[make_candle(0, 5.0, 3.0, 4.0)], 14);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_nan());
    }

    #[test]
    fn atr_empty() {
        assert!(calculate_atr(&[], 14).is_empty());
    }
}
