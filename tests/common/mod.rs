#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
pub use quantcore::domain::candle::Candle;
pub use quantcore::domain::equity::EquityPoint;
use quantcore::domain::error::QuantError;
pub use quantcore::domain::trade::{Execution, RoundTripTrade, TradeSide};
use quantcore::ports::data_port::DataPort;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// In-memory data port. Unknown names answer `NoData`, like the CSV adapter.
pub struct MockDataPort {
    pub candles: HashMap<String, Vec<Candle>>,
    pub equity: HashMap<String, Vec<EquityPoint>>,
    pub trades: HashMap<String, Vec<RoundTripTrade>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            candles: HashMap::new(),
            equity: HashMap::new(),
            trades: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.candles.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_run(
        mut self,
        run: &str,
        curve: Vec<EquityPoint>,
        trades: Vec<RoundTripTrade>,
    ) -> Self {
        self.equity.insert(run.to_string(), curve);
        self.trades.insert(run.to_string(), trades);
        self
    }

    pub fn with_error(mut self, name: &str, reason: &str) -> Self {
        self.errors.insert(name.to_string(), reason.to_string());
        self
    }

    fn check(&self, name: &str) -> Result<(), QuantError> {
        match self.errors.get(name) {
            Some(reason) => Err(QuantError::Data {
                source_name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn lookup<T: Clone>(map: &HashMap<String, Vec<T>>, name: &str) -> Result<Vec<T>, QuantError> {
    map.get(name).cloned().ok_or_else(|| QuantError::NoData {
        name: name.to_string(),
    })
}

impl DataPort for MockDataPort {
    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, QuantError> {
        self.check(symbol)?;
        lookup(&self.candles, symbol)
    }

    fn fetch_equity_curve(&self, run: &str) -> Result<Vec<EquityPoint>, QuantError> {
        self.check(run)?;
        lookup(&self.equity, run)
    }

    fn fetch_trades(&self, run: &str) -> Result<Vec<RoundTripTrade>, QuantError> {
        self.check(run)?;
        lookup(&self.trades, run)
    }

    fn list_symbols(&self) -> Result<Vec<String>, QuantError> {
        let mut symbols: Vec<String> = self.candles.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

/// Daily candles with a two-point high/low range around each close.
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            timestamp: day(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000.0,
        })
        .collect()
}

pub fn make_equity_curve(values: &[f64]) -> Vec<EquityPoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, &equity)| EquityPoint {
            timestamp: day(i as i64),
            equity,
            cash: equity,
            position_value: 0.0,
            drawdown: 0.0,
        })
        .collect()
}

/// A long round trip of 10 units with no fees, closed on `exit_day`.
pub fn make_trade(entry_day: i64, exit_day: i64, entry_price: f64, exit_price: f64) -> RoundTripTrade {
    let leg = |price: f64, at: i64| Execution {
        price,
        quantity: 10.0,
        fee: 0.0,
        executed_at: day(at),
    };
    RoundTripTrade::from_executions(
        "TEST",
        TradeSide::Long,
        leg(entry_price, entry_day),
        leg(exit_price, exit_day),
        (exit_day - entry_day).max(0) as usize,
    )
}

/// Seeded i.i.d. normal returns via Box–Muller.
pub fn gaussian_returns(n: usize, mu: f64, sigma: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u1 = 1.0 - rng.random::<f64>();
            let u2 = rng.random::<f64>();
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            mu + sigma * z
        })
        .collect()
}

/// Equity curve compounding `returns` from `start`.
pub fn curve_from_returns(start: f64, returns: &[f64]) -> Vec<EquityPoint> {
    let mut values = Vec::with_capacity(returns.len() + 1);
    values.push(start);
    for r in returns {
        let last = *values.last().unwrap();
        values.push(last * (1.0 + r));
    }
    make_equity_curve(&values)
}
