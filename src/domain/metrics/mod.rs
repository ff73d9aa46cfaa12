//! Performance metrics over an equity curve and its closed trades.

pub mod drawdown;
pub mod returns;
pub mod trade_stats;

pub use drawdown::{
    DrawdownAnalysis, DrawdownRecord, analyze_drawdown, avg_drawdown, current_drawdown,
    drawdown_series, extract_drawdown_records, max_drawdown,
};
pub use returns::{
    MonthlyReturn, annualized_return, calmar_ratio, daily_returns, information_ratio,
    monthly_returns, sharpe_ratio, sortino_ratio, total_return,
};
pub use trade_stats::{
    Streaks, WinLossSummary, avg_holding_period_days, consecutive_streaks, expectancy,
    profit_factor, win_loss_summary, win_rate,
};

use crate::domain::equity::EquityPoint;
use crate::domain::stats::{mean, std_dev};
use crate::domain::trade::RoundTripTrade;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// All return figures are percentages; ratios are annualized.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub monthly_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown: f64,
    pub avg_drawdown: f64,
    /// Longest trough-to-recovery span in days.
    pub max_drawdown_duration: i64,
    pub total_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub max_win: f64,
    pub max_loss: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    /// Days.
    pub avg_holding_period: f64,
    pub pnl_std_dev: f64,
    pub avg_trade_return: f64,
    pub expectancy: f64,
}

impl PerformanceMetrics {
    pub fn compute(
        initial_capital: f64,
        final_capital: f64,
        curve: &[EquityPoint],
        trades: &[RoundTripTrade],
        risk_free_rate: f64,
    ) -> Self {
        tracing::debug!(
            points = curve.len(),
            trades = trades.len(),
            "computing performance metrics"
        );

        let total_return = total_return(initial_capital, final_capital);
        let annualized_return = annualized_return(total_return, curve.len());
        let daily = daily_returns(curve);
        let max_drawdown = max_drawdown(curve);

        let max_drawdown_duration = extract_drawdown_records(curve)
            .iter()
            .map(|r| r.recovery_days.unwrap_or(0))
            .max()
            .unwrap_or(0);

        let summary = win_loss_summary(trades);
        let streaks = consecutive_streaks(trades);
        let pnl: Vec<f64> = trades.iter().map(|t| t.net_pnl).collect();

        Self {
            total_return,
            annualized_return,
            monthly_return: annualized_return / 12.0,
            sharpe_ratio: sharpe_ratio(&daily, risk_free_rate),
            sortino_ratio: sortino_ratio(&daily, risk_free_rate),
            calmar_ratio: calmar_ratio(annualized_return, max_drawdown),
            max_drawdown,
            avg_drawdown: avg_drawdown(curve),
            max_drawdown_duration,
            total_trades: trades.len(),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            avg_win: summary.avg_win,
            avg_loss: summary.avg_loss,
            max_win: summary.max_win,
            max_loss: summary.max_loss,
            max_consecutive_wins: streaks.max_consecutive_wins,
            max_consecutive_losses: streaks.max_consecutive_losses,
            avg_holding_period: avg_holding_period_days(trades),
            pnl_std_dev: std_dev(&pnl),
            avg_trade_return: mean(&pnl),
            expectancy: expectancy(trades),
        }
    }
}
