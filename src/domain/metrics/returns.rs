//! Return series and risk-adjusted ratios.

use std::collections::BTreeMap;

use chrono::Datelike;

use super::TRADING_DAYS_PER_YEAR;
use crate::domain::equity::EquityPoint;
use crate::domain::stats::{mean, std_dev};
use crate::domain::trade::RoundTripTrade;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    pub return_pct: f64,
    pub trade_count: usize,
}

/// Total return in percent. A non-positive initial capital yields 0.
pub fn total_return(initial_capital: f64, final_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    (final_capital - initial_capital) / initial_capital * 100.0
}

/// Compound annual growth rate in percent, treating each sample as one trading day.
pub fn annualized_return(total_return_pct: f64, trading_days: usize) -> f64 {
    if trading_days == 0 {
        return 0.0;
    }
    let years = trading_days as f64 / TRADING_DAYS_PER_YEAR;
    let multiplier = 1.0 + total_return_pct / 100.0;
    if multiplier <= 0.0 {
        return -100.0;
    }
    (multiplier.powf(1.0 / years) - 1.0) * 100.0
}

/// Simple period-over-period returns as fractions. Steps from a non-positive equity are skipped.
pub fn daily_returns(curve: &[EquityPoint]) -> Vec<f64> {
    curve
        .windows(2)
        .filter(|w| w[0].equity > 0.0)
        .map(|w| (w[1].equity - w[0].equity) / w[0].equity)
        .collect()
}

pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let sd = std_dev(returns);
    if sd == 0.0 {
        return 0.0;
    }
    let annual_mean = mean(returns) * TRADING_DAYS_PER_YEAR;
    (annual_mean - risk_free_rate) / (sd * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Like Sharpe but the denominator only sees losing periods.
/// Returns `+∞` when there is no observed downside.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let negatives: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if negatives.is_empty() {
        return f64::INFINITY;
    }
    let downside = std_dev(&negatives);
    if downside == 0.0 {
        return f64::INFINITY;
    }
    let annual_mean = mean(returns) * TRADING_DAYS_PER_YEAR;
    (annual_mean - risk_free_rate) / (downside * TRADING_DAYS_PER_YEAR.sqrt())
}

pub fn calmar_ratio(annualized_return_pct: f64, max_drawdown_pct: f64) -> f64 {
    if max_drawdown_pct == 0.0 {
        return f64::INFINITY;
    }
    annualized_return_pct / max_drawdown_pct.abs()
}

/// Annualized excess return over a benchmark divided by the tracking error.
pub fn information_ratio(portfolio: &[f64], benchmark: &[f64]) -> f64 {
    if portfolio.len() != benchmark.len() || portfolio.len() < 2 {
        return 0.0;
    }
    let excess: Vec<f64> = portfolio.iter().zip(benchmark).map(|(p, b)| p - b).collect();
    let tracking_error = std_dev(&excess);
    if tracking_error == 0.0 {
        return 0.0;
    }
    mean(&excess) * TRADING_DAYS_PER_YEAR / (tracking_error * TRADING_DAYS_PER_YEAR.sqrt())
}

struct MonthBucket {
    start_equity: f64,
    end_equity: f64,
    trades: usize,
}

/// Calendar-month returns from first to last equity sample of each month,
/// with closed trades attributed by exit month. Sorted chronologically.
pub fn monthly_returns(curve: &[EquityPoint], trades: &[RoundTripTrade]) -> Vec<MonthlyReturn> {
    if curve.len() < 2 {
        return Vec::new();
    }

    let mut buckets: BTreeMap<(i32, u32), MonthBucket> = BTreeMap::new();
    for point in curve {
        let key = (point.timestamp.year(), point.timestamp.month());
        buckets
            .entry(key)
            .and_modify(|b| b.end_equity = point.equity)
            .or_insert(MonthBucket {
                start_equity: point.equity,
                end_equity: point.equity,
                trades: 0,
            });
    }

    for trade in trades {
        let exited = trade.exited_at();
        if let Some(bucket) = buckets.get_mut(&(exited.year(), exited.month())) {
            bucket.trades += 1;
        }
    }

    buckets
        .into_iter()
        .map(|((year, month), b)| MonthlyReturn {
            year,
            month,
            return_pct: if b.start_equity > 0.0 {
                (b.end_equity - b.start_equity) / b.start_equity * 100.0
            } else {
                0.0
            },
            trade_count: b.trades,
        })
        .collect()
}
