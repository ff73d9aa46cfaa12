//! Half-Kelly position sizing with volatility damping and stop-loss budgets.

use super::RiskLevel;

/// Hard ceiling on the recommended allocation, percent of portfolio.
pub const MAX_RECOMMENDED_PCT: f64 = 25.0;
/// Hard ceiling on any allocation, percent of portfolio.
pub const MAX_ALLOWED_PCT: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionSizeParams {
    pub portfolio_value: f64,
    /// Annualized, percent.
    pub expected_volatility: f64,
    pub stop_loss_pct: f64,
    /// Largest loss per position the portfolio accepts, percent.
    pub risk_tolerance_pct: f64,
    /// Fraction in 0..=1.
    pub win_rate: f64,
    pub avg_win_loss_ratio: f64,
}

impl PositionSizeParams {
    pub fn new(portfolio_value: f64, expected_volatility: f64, stop_loss_pct: f64) -> Self {
        Self {
            portfolio_value,
            expected_volatility,
            stop_loss_pct,
            risk_tolerance_pct: 2.0,
            win_rate: 0.5,
            avg_win_loss_ratio: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionSizeRecommendation {
    pub recommended_size: f64,
    pub recommended_pct: f64,
    pub max_allowed_size: f64,
    pub max_allowed_pct: f64,
    pub basis: PositionSizeParams,
    pub risk_level: RiskLevel,
    pub rationale: String,
}

/// Half of the Kelly fraction, floored at 0.
pub fn half_kelly(win_rate: f64, avg_win_loss_ratio: f64) -> f64 {
    if avg_win_loss_ratio <= 0.0 {
        return 0.0;
    }
    let kelly = win_rate - (1.0 - win_rate) / avg_win_loss_ratio;
    (kelly / 2.0).max(0.0)
}

/// Shrinks allocations once volatility rises above 20%, never grows them past 2x.
pub fn volatility_adjustment(expected_volatility: f64) -> f64 {
    20.0 / expected_volatility.max(10.0)
}

/// Classify an allocation by `pct · vol / 20`.
pub fn assess_risk_level(position_pct: f64, volatility: f64) -> RiskLevel {
    let score = position_pct * (volatility / 20.0);
    if score <= 5.0 {
        RiskLevel::Minimal
    } else if score <= 15.0 {
        RiskLevel::Low
    } else if score <= 30.0 {
        RiskLevel::Moderate
    } else if score <= 50.0 {
        RiskLevel::High
    } else {
        RiskLevel::Extreme
    }
}

fn rationale(level: RiskLevel, volatility: f64) -> String {
    match level {
        RiskLevel::Minimal => {
            format!("Low volatility ({:.1}%) with conservative sizing", volatility)
        }
        RiskLevel::Low => "Half-Kelly sizing at a moderate volatility level".to_string(),
        RiskLevel::Moderate => {
            "Reasonable size for the volatility, monitor market conditions".to_string()
        }
        RiskLevel::High => {
            "Elevated volatility raises risk, consider reducing size".to_string()
        }
        RiskLevel::Extreme => {
            "Extreme volatility, reconsider entry or use minimal size".to_string()
        }
    }
}

pub fn recommend_position_size(params: &PositionSizeParams) -> PositionSizeRecommendation {
    let pv = params.portfolio_value;
    let kelly_pct = half_kelly(params.win_rate, params.avg_win_loss_ratio)
        * 100.0
        * volatility_adjustment(params.expected_volatility);

    // stop-loss budget: the position whose full stop-out loses exactly the tolerated amount
    let max_allowed_pct = if params.stop_loss_pct > 0.0 && pv > 0.0 {
        let budget = pv * params.risk_tolerance_pct / 100.0 / (params.stop_loss_pct / 100.0);
        (budget / pv * 100.0).min(MAX_ALLOWED_PCT)
    } else {
        MAX_ALLOWED_PCT
    };

    let recommended_pct = kelly_pct.min(MAX_RECOMMENDED_PCT).min(max_allowed_pct).max(0.0);
    let sized = |pct: f64| pv.max(0.0) * pct / 100.0;
    let risk_level = assess_risk_level(recommended_pct, params.expected_volatility);

    PositionSizeRecommendation {
        recommended_size: sized(recommended_pct),
        recommended_pct,
        max_allowed_size: sized(max_allowed_pct),
        max_allowed_pct,
        basis: *params,
        risk_level,
        rationale: rationale(risk_level, params.expected_volatility),
    }
}
