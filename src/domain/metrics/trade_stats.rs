//! Per-trade statistics over closed round trips.

use crate::domain::stats::mean;
use crate::domain::trade::RoundTripTrade;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WinLossSummary {
    pub avg_win: f64,
    /// Magnitude, always non-negative.
    pub avg_loss: f64,
    pub max_win: f64,
    /// Magnitude, always non-negative.
    pub max_loss: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streaks {
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

/// Share of trades with a strictly positive net P&L, in percent.
pub fn win_rate(trades: &[RoundTripTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.net_pnl > 0.0).count();
    wins as f64 / trades.len() as f64 * 100.0
}

/// Gross profit over gross loss. `+∞` when nothing was lost.
pub fn profit_factor(trades: &[RoundTripTrade]) -> f64 {
    let mut gross_profit = 0.0;
    let mut gross_loss = 0.0;
    for trade in trades {
        if trade.net_pnl > 0.0 {
            gross_profit += trade.net_pnl;
        } else if trade.net_pnl < 0.0 {
            gross_loss += trade.net_pnl.abs();
        }
    }
    if gross_loss == 0.0 {
        return f64::INFINITY;
    }
    gross_profit / gross_loss
}

pub fn win_loss_summary(trades: &[RoundTripTrade]) -> WinLossSummary {
    let wins: Vec<f64> = trades
        .iter()
        .map(|t| t.net_pnl)
        .filter(|p| *p > 0.0)
        .collect();
    let losses: Vec<f64> = trades
        .iter()
        .map(|t| t.net_pnl)
        .filter(|p| *p < 0.0)
        .map(f64::abs)
        .collect();

    WinLossSummary {
        avg_win: mean(&wins),
        avg_loss: mean(&losses),
        max_win: wins.iter().copied().fold(0.0, f64::max),
        max_loss: losses.iter().copied().fold(0.0, f64::max),
    }
}

/// Longest runs of winners and losers. Break-even trades leave both counters alone.
pub fn consecutive_streaks(trades: &[RoundTripTrade]) -> Streaks {
    let mut streaks = Streaks::default();
    let mut wins = 0;
    let mut losses = 0;

    for trade in trades {
        if trade.net_pnl > 0.0 {
            wins += 1;
            losses = 0;
            streaks.max_consecutive_wins = streaks.max_consecutive_wins.max(wins);
        } else if trade.net_pnl < 0.0 {
            losses += 1;
            wins = 0;
            streaks.max_consecutive_losses = streaks.max_consecutive_losses.max(losses);
        }
    }
    streaks
}

/// Expected P&L per trade: `p·avg_win − (1−p)·avg_loss`.
pub fn expectancy(trades: &[RoundTripTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let p = win_rate(trades) / 100.0;
    let summary = win_loss_summary(trades);
    p * summary.avg_win - (1.0 - p) * summary.avg_loss
}

pub fn avg_holding_period_days(trades: &[RoundTripTrade]) -> f64 {
    let days: Vec<f64> = trades.iter().map(RoundTripTrade::holding_days).collect();
    mean(&days)
}
