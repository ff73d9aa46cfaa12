//! Strategy definition: entry/exit condition trees plus optional exit levels.

use crate::domain::condition::{ComparisonOperator, Condition, ConditionGroup, Operand};
use crate::domain::indicator::bollinger::{DEFAULT_MULTIPLIER, DEFAULT_PERIOD};
use crate::domain::indicator::{BollingerBand, IndicatorConfig, PriceSource};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Strategy {
    pub name: String,
    pub description: String,
    pub entry: ConditionGroup,
    pub exit: ConditionGroup,
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
}

pub const TEMPLATE_NAMES: [&str; 3] = ["golden_cross", "rsi_oversold", "bollinger_breakout"];

impl Strategy {
    /// Look up one of the built-in templates by its snake_case name.
    pub fn template(name: &str) -> Option<Self> {
        match name {
            "golden_cross" => Some(Self::golden_cross()),
            "rsi_oversold" => Some(Self::rsi_oversold()),
            "bollinger_breakout" => Some(Self::bollinger_breakout()),
            _ => None,
        }
    }

    /// Enter when SMA(50) crosses above SMA(200), exit on the reverse cross.
    pub fn golden_cross() -> Self {
        let fast = IndicatorConfig::Sma(50);
        let slow = Operand::Indicator(IndicatorConfig::Sma(200));
        Self {
            name: "Golden Cross".into(),
            description: "Trend following on the 50/200 SMA crossover".into(),
            entry: ConditionGroup::all(vec![
                Condition::new(fast, ComparisonOperator::CrossAbove, slow).into(),
            ]),
            exit: ConditionGroup::any(vec![
                Condition::new(fast, ComparisonOperator::CrossBelow, slow).into(),
            ]),
            stop_loss_pct: None,
            take_profit_pct: None,
        }
    }

    /// Enter when RSI(14) recovers above 30, exit once it is above 70.
    pub fn rsi_oversold() -> Self {
        let rsi = IndicatorConfig::Rsi(14);
        Self {
            name: "RSI Oversold Bounce".into(),
            description: "Mean reversion out of RSI oversold territory".into(),
            entry: ConditionGroup::all(vec![
                Condition::new(rsi, ComparisonOperator::CrossAbove, Operand::Constant(30.0))
                    .into(),
            ]),
            exit: ConditionGroup::any(vec![
                Condition::new(rsi, ComparisonOperator::Gt, Operand::Constant(70.0)).into(),
            ]),
            stop_loss_pct: None,
            take_profit_pct: None,
        }
    }

    /// Enter when the close breaks above the upper band, exit back under the middle band.
    pub fn bollinger_breakout() -> Self {
        let close = IndicatorConfig::Price(PriceSource::Close);
        let upper =
            IndicatorConfig::bollinger(DEFAULT_PERIOD, DEFAULT_MULTIPLIER, BollingerBand::Upper);
        let middle =
            IndicatorConfig::bollinger(DEFAULT_PERIOD, DEFAULT_MULTIPLIER, BollingerBand::Middle);
        Self {
            name: "Bollinger Breakout".into(),
            description: "Breakout above the upper Bollinger band".into(),
            entry: ConditionGroup::all(vec![
                Condition::new(close, ComparisonOperator::CrossAbove, Operand::Indicator(upper))
                    .into(),
            ]),
            exit: ConditionGroup::any(vec![
                Condition::new(close, ComparisonOperator::CrossBelow, Operand::Indicator(middle))
                    .into(),
            ]),
            stop_loss_pct: None,
            take_profit_pct: None,
        }
    }

    /// Every indicator referenced by the entry or exit tree, deduplicated.
    pub fn required_indicators(&self) -> Vec<IndicatorConfig> {
        let mut out = self.entry.extract_indicators();
        for config in self.exit.extract_indicators() {
            if !out.contains(&config) {
                out.push(config);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_resolve_by_name() {
        for name in TEMPLATE_NAMES {
            assert!(Strategy::template(name).is_some(), "missing template {}", name);
        }
        assert!(Strategy::template("unknown").is_none());
    }

    #[test]
    fn golden_cross_shape() {
        let s = Strategy::golden_cross();
        assert_eq!(s.entry.to_string(), "AND(CROSS_ABOVE(SMA(50), SMA(200)))");
        assert_eq!(s.exit.to_string(), "OR(CROSS_BELOW(SMA(50), SMA(200)))");
        assert_eq!(
            s.required_indicators(),
            vec![IndicatorConfig::Sma(50), IndicatorConfig::Sma(200)]
        );
    }

    #[test]
    fn rsi_oversold_shape() {
        let s = Strategy::rsi_oversold();
        assert_eq!(s.entry.to_string(), "AND(CROSS_ABOVE(RSI(14), 30))");
        assert_eq!(s.exit.to_string(), "OR(GT(RSI(14), 70))");
        assert_eq!(s.required_indicators(), vec![IndicatorConfig::Rsi(14)]);
    }

    #[test]
    fn bollinger_breakout_indicators() {
        let s = Strategy::bollinger_breakout();
        assert_eq!(s.required_indicators().len(), 3);
        assert!(s.stop_loss_pct.is_none());
    }
}
