//! Technical indicator library.
//!
//! Every calculation returns a `Vec<f64>` exactly as long as its input, with
//! `f64::NAN` marking warm-up positions that are not yet defined:
//! - `IndicatorConfig`: indicator identity + parameters (serves as cache key)
//! - `compute_indicator`: dispatch from a config to its series
//! - `IndicatorCache`: caller-owned memoisation over one candle slice

pub mod atr;
pub mod bollinger;
pub mod cache;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::calculate_atr;
pub use bollinger::{calculate_bollinger, BollingerOutput};
pub use cache::IndicatorCache;
pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdOutput};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use crate::domain::candle::{closes, Candle};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PriceSource {
    Open,
    High,
    Low,
    Close,
}

impl PriceSource {
    pub fn of(self, candle: &Candle) -> f64 {
        match self {
            PriceSource::Open => candle.open,
            PriceSource::High => candle.high,
            PriceSource::Low => candle.low,
            PriceSource::Close => candle.close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MacdLine {
    #[default]
    Macd,
    Signal,
    Histogram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

/// A Bollinger σ multiplier keyed by its bit pattern, so configs stay
/// `Eq + Hash` without losing precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Multiplier(u64);

impl Multiplier {
    pub fn new(value: f64) -> Self {
        // fold -0.0 into 0.0 so equal multipliers share one key
        Self((value + 0.0).to_bits())
    }

    pub fn get(self) -> f64 {
        f64::from_bits(self.0)
    }
}

/// A derived series description; also the indicator cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndicatorConfig {
    Price(PriceSource),
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
        line: MacdLine,
    },
    Bollinger {
        period: usize,
        multiplier: Multiplier,
        band: BollingerBand,
    },
    Atr(usize),
    Volume,
}

impl IndicatorConfig {
    /// The multiplier is kept exactly as given. Negative values are rejected by
    /// the condition parser, not here.
    pub fn bollinger(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        IndicatorConfig::Bollinger {
            period,
            multiplier: Multiplier::new(multiplier),
            band,
        }
    }

    pub fn macd(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        IndicatorConfig::Macd {
            fast,
            slow,
            signal,
            line,
        }
    }
}

impl fmt::Display for IndicatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorConfig::Price(PriceSource::Open) => write!(f, "open"),
            IndicatorConfig::Price(PriceSource::High) => write!(f, "high"),
            IndicatorConfig::Price(PriceSource::Low) => write!(f, "low"),
            IndicatorConfig::Price(PriceSource::Close) => write!(f, "close"),
            IndicatorConfig::Volume => write!(f, "volume"),
            IndicatorConfig::Sma(period) => write!(f, "SMA({})", period),
            IndicatorConfig::Ema(period) => write!(f, "EMA({})", period),
            IndicatorConfig::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorConfig::Atr(period) => write!(f, "ATR({})", period),
            IndicatorConfig::Macd {
                fast,
                slow,
                signal,
                line,
            } => {
                let name = match line {
                    MacdLine::Macd => "MACD",
                    MacdLine::Signal => "MACD_SIGNAL",
                    MacdLine::Histogram => "MACD_HISTOGRAM",
                };
                write!(f, "{}({},{},{})", name, fast, slow, signal)
            }
            IndicatorConfig::Bollinger {
                period,
                multiplier,
                band,
            } => {
                let name = match band {
                    BollingerBand::Upper => "BOLLINGER_UPPER",
                    BollingerBand::Middle => "BOLLINGER_MIDDLE",
                    BollingerBand::Lower => "BOLLINGER_LOWER",
                };
                write!(f, "{}({},{})", name, period, multiplier.get())
            }
        }
    }
}

/// Compute the series described by `config` over `candles`.
pub fn compute_indicator(candles: &[Candle], config: &IndicatorConfig) -> Vec<f64> {
    match *config {
        IndicatorConfig::Price(source) => candles.iter().map(|c| source.of(c)).collect(),
        IndicatorConfig::Volume => candles.iter().map(|c| c.volume).collect(),
        IndicatorConfig::Sma(period) => calculate_sma(&closes(candles), period),
        IndicatorConfig::Ema(period) => calculate_ema(&closes(candles), period),
        IndicatorConfig::Rsi(period) => calculate_rsi(&closes(candles), period),
        IndicatorConfig::Atr(period) => calculate_atr(candles, period),
        IndicatorConfig::Macd {
            fast,
            slow,
            signal,
            line,
        } => calculate_macd(&closes(candles), fast, slow, signal).into_line(line),
        IndicatorConfig::Bollinger {
            period,
            multiplier,
            band,
        } => calculate_bollinger(&closes(candles), period, multiplier.get()).into_band(band),
    }
}
