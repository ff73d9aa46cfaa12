//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow), defined where both EMAs are.
//! Signal Line = EMA(signal) over the defined suffix of the MACD line, re-aligned.
//! Histogram = MACD Line - Signal Line, defined where both are.

use crate::domain::indicator::{calculate_ema, MacdLine};

#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdOutput {
    pub fn into_line(self, line: MacdLine) -> Vec<f64> {
        match line {
            MacdLine::Macd => self.macd,
            MacdLine::Signal => self.signal,
            MacdLine::Histogram => self.histogram,
        }
    }
}

pub fn calculate_macd(
    values: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdOutput {
    let ema_fast = calculate_ema(values, fast);
    let ema_slow = calculate_ema(values, slow);

    let macd: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| defined_difference(*f, *s))
        .collect();

    let mut signal = vec![f64::NAN; values.len()];
    if let Some(start) = macd.iter().position(|v| !v.is_nan()) {
        let smoothed = calculate_ema(&macd[start..], signal_period);
        signal[start..].copy_from_slice(&smoothed);
    }

    let histogram = macd
        .iter()
        .zip(&signal)
        .map(|(m, s)| defined_difference(*m, *s))
        .collect();

    MacdOutput {
        macd,
        signal,
        histogram,
    }
}

fn defined_difference(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a - b
    }
}
