//! Caller-owned indicator cache.
//!
//! The cache borrows one candle slice for its whole lifetime, so the borrow
//! itself is the series identity and entries are keyed by `IndicatorConfig`
//! alone. There is no process-wide state: drop the cache to release it.

use crate::domain::candle::Candle;
use crate::domain::indicator::{compute_indicator, IndicatorConfig};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct IndicatorCache<'a> {
    candles: &'a [Candle],
    series: HashMap<IndicatorConfig, Arc<[f64]>>,
}

impl<'a> IndicatorCache<'a> {
    pub fn new(candles: &'a [Candle]) -> Self {
        Self {
            candles,
            series: HashMap::new(),
        }
    }

    pub fn candles(&self) -> &'a [Candle] {
        self.candles
    }

    /// Return the full series for `config`, computing it on first use.
    pub fn get(&mut self, config: &IndicatorConfig) -> Arc<[f64]> {
        let candles = self.candles;
        let series = self.series.entry(*config).or_insert_with(|| {
            tracing::trace!(indicator = %config, bars = candles.len(), "computing indicator");
            compute_indicator(candles, config).into()
        });
        Arc::clone(series)
    }

    /// Value of `config` at `index`, or NaN when out of range.
    pub fn value_at(&mut self, config: &IndicatorConfig, index: usize) -> f64 {
        self.get(config).get(index).copied().unwrap_or(f64::NAN)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn clear(&mut self) {
        self.series.clear();
    }
}
