//! Risk engine: VaR, volatility, sizing and the composite risk score.

pub mod sizing;
pub mod var;
pub mod volatility;

pub use sizing::{
    PositionSizeParams, PositionSizeRecommendation, assess_risk_level, half_kelly,
    recommend_position_size, volatility_adjustment,
};
pub use var::{
    CvarResult, MonteCarloConfig, VarMethod, VarParams, VarResult, calculate_cvar, calculate_var,
    historical_var, monte_carlo_var, parametric_var, z_score,
};
pub use volatility::{
    annualized_volatility, beta, correlation_risk, daily_volatility, downside_volatility, hhi,
};

use std::fmt;

use crate::domain::equity::{EquityPoint, equity_values};
use crate::domain::metrics::{
    DEFAULT_RISK_FREE_RATE, DrawdownAnalysis, analyze_drawdown, daily_returns, monthly_returns,
    sharpe_ratio, sortino_ratio,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RiskLevel {
    Minimal,
    Low,
    Moderate,
    High,
    Extreme,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Minimal => "minimal",
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Extreme => "extreme",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite 0..=100 score from four components, each capped at 25 points.
pub fn risk_score(var_pct: f64, max_drawdown_pct: f64, volatility_pct: f64, hhi: f64) -> u32 {
    let var_points = (var_pct * 5.0).min(25.0);
    let drawdown_points = (max_drawdown_pct * 0.83).min(25.0);
    let volatility_points = (volatility_pct * 0.5).min(25.0);
    let concentration_points = (hhi / 400.0).min(25.0);
    let total = var_points + drawdown_points + volatility_points + concentration_points;
    total.round().max(0.0) as u32
}

pub fn risk_level_from_score(score: u32) -> RiskLevel {
    match score {
        0..=20 => RiskLevel::Minimal,
        21..=40 => RiskLevel::Low,
        41..=60 => RiskLevel::Moderate,
        61..=80 => RiskLevel::High,
        _ => RiskLevel::Extreme,
    }
}

/// Portfolio-level limits, all in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskLimits {
    pub daily_loss_pct: f64,
    pub monthly_loss_pct: f64,
    pub max_drawdown_pct: f64,
    pub max_position_pct: f64,
    pub var_pct: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            daily_loss_pct: 3.0,
            monthly_loss_pct: 15.0,
            max_drawdown_pct: 20.0,
            max_position_pct: 25.0,
            var_pct: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LimitBreach {
    pub limit: String,
    pub threshold: f64,
    pub actual: f64,
}

impl fmt::Display for LimitBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.2}% exceeds limit {:.2}%",
            self.limit, self.actual, self.threshold
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskSettings {
    pub var: VarParams,
    pub risk_free_rate: f64,
    /// Defaults to the last equity sample.
    pub portfolio_value: Option<f64>,
    pub limits: RiskLimits,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            var: VarParams::default(),
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            portfolio_value: None,
            limits: RiskLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskReport {
    pub portfolio_value: f64,
    pub var: VarResult,
    pub cvar: CvarResult,
    pub drawdown: DrawdownAnalysis,
    pub daily_volatility: f64,
    pub annualized_volatility: f64,
    pub downside_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Largest single-period loss, percent.
    pub worst_period_loss: f64,
    /// Largest calendar-month loss, percent.
    pub worst_month_loss: f64,
    pub largest_weight: f64,
    pub hhi: f64,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub breaches: Vec<LimitBreach>,
}

impl RiskReport {
    /// Run the whole risk engine over one equity curve. `weights` are the
    /// current position weights in percent; pass an empty slice when flat.
    pub fn compute(curve: &[EquityPoint], weights: &[f64], settings: &RiskSettings) -> Self {
        let values = equity_values(curve);
        let timestamps: Vec<_> = curve.iter().map(|p| p.timestamp).collect();
        let returns = daily_returns(curve);
        let portfolio_value = settings
            .portfolio_value
            .or_else(|| values.last().copied())
            .unwrap_or(0.0);
        tracing::debug!(
            points = curve.len(),
            returns = returns.len(),
            method = %settings.var.method,
            "computing risk report"
        );

        let var = calculate_var(&returns, portfolio_value, &settings.var);
        let cvar = calculate_cvar(
            &returns,
            portfolio_value,
            settings.var.confidence_level,
            settings.var.holding_period,
        );
        let drawdown = analyze_drawdown(&values, &timestamps);
        let annualized = annualized_volatility(&returns);
        let concentration = hhi(weights);
        let score = risk_score(var.percentage, drawdown.max_drawdown, annualized, concentration);

        let worst_period_loss = returns
            .iter()
            .copied()
            .fold(0.0_f64, |worst, r| worst.max(-r * 100.0));
        let worst_month_loss = monthly_returns(curve, &[])
            .iter()
            .fold(0.0_f64, |worst, m| worst.max(-m.return_pct));
        let largest_weight = weights.iter().copied().fold(0.0_f64, f64::max);

        let mut report = Self {
            portfolio_value,
            var,
            cvar,
            drawdown,
            daily_volatility: daily_volatility(&returns),
            annualized_volatility: annualized,
            downside_volatility: downside_volatility(&returns),
            sharpe_ratio: sharpe_ratio(&returns, settings.risk_free_rate),
            sortino_ratio: sortino_ratio(&returns, settings.risk_free_rate),
            worst_period_loss,
            worst_month_loss,
            largest_weight,
            hhi: concentration,
            risk_score: score,
            risk_level: risk_level_from_score(score),
            breaches: Vec::new(),
        };
        report.breaches = report.check_limits(&settings.limits);
        report
    }

    /// Every limit the report exceeds, in a fixed order.
    pub fn check_limits(&self, limits: &RiskLimits) -> Vec<LimitBreach> {
        let checks = [
            ("daily loss", limits.daily_loss_pct, self.worst_period_loss),
            ("monthly loss", limits.monthly_loss_pct, self.worst_month_loss),
            ("max drawdown", limits.max_drawdown_pct, self.drawdown.max_drawdown),
            ("position size", limits.max_position_pct, self.largest_weight),
            ("value at risk", limits.var_pct, self.var.percentage),
        ];
        checks
            .into_iter()
            .filter(|(_, threshold, actual)| actual > threshold)
            .map(|(limit, threshold, actual)| LimitBreach {
                limit: limit.to_string(),
                threshold,
                actual,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn make_equity_curve(values: &[f64]) -> Vec<EquityPoint> {
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

    #[test]
    fn score_components_cap_at_25() {
        assert_eq!(risk_score(0.0, 0.0, 0.0, 0.0), 0);
        assert_eq!(risk_score(100.0, 100.0, 100.0, 10_000.0), 100);
        // 5 + 8.3 + 10 + 2.5 = 25.8
        assert_eq!(risk_score(1.0, 10.0, 20.0, 1_000.0), 26);
    }

    #[test]
    fn score_levels() {
        assert_eq!(risk_level_from_score(0), RiskLevel::Minimal);
        assert_eq!(risk_level_from_score(20), RiskLevel::Minimal);
        assert_eq!(risk_level_from_score(21), RiskLevel::Low);
        assert_eq!(risk_level_from_score(60), RiskLevel::Moderate);
        assert_eq!(risk_level_from_score(80), RiskLevel::High);
        assert_eq!(risk_level_from_score(81), RiskLevel::Extreme);
    }

    #[test]
    fn level_ordering_and_names() {
        assert!(RiskLevel::Minimal < RiskLevel::Extreme);
        assert_eq!(RiskLevel::Moderate.to_string(), "moderate");
    }

    #[test]
    fn report_on_flat_curve() {
        let curve = make_equity_curve(&[100.0, 100.0, 100.0]);
        let report = RiskReport::compute(&curve, &[], &RiskSettings::default());
        assert_eq!(report.portfolio_value, 100.0);
        assert_eq!(report.var.value, 0.0);
        assert_eq!(report.annualized_volatility, 0.0);
        assert_eq!(report.risk_score, 0);
        assert_eq!(report.risk_level, RiskLevel::Minimal);
        assert!(report.breaches.is_empty());
    }

    #[test]
    fn report_flags_breaches() {
        let curve = make_equity_curve(&[100.0, 90.0, 70.0, 75.0]);
        let report = RiskReport::compute(&curve, &[60.0, 40.0], &RiskSettings::default());

        assert_relative_eq!(report.drawdown.max_drawdown, 30.0, epsilon = 1e-9);
        assert_relative_eq!(report.hhi, 5_200.0);
        assert_relative_eq!(report.largest_weight, 60.0);
        let names: Vec<_> = report.breaches.iter().map(|b| b.limit.as_str()).collect();
        assert_eq!(
            names,
            vec!["daily loss", "monthly loss", "max drawdown", "position size", "value at risk"]
        );
        assert!(report.breaches[2].to_string().starts_with("max drawdown 30.00%"));
    }

    #[test]
    fn explicit_portfolio_value_wins() {
        let curve = make_equity_curve(&[100.0, 95.0, 99.0]);
        let settings = RiskSettings {
            portfolio_value: Some(1_000_000.0),
            ..RiskSettings::default()
        };
        let report = RiskReport::compute(&curve, &[], &settings);
        assert_eq!(report.portfolio_value, 1_000_000.0);
        assert_relative_eq!(report.var.value, 50_000.0, epsilon = 1e-6);
    }
}
