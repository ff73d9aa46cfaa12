//! Configuration validation.
//!
//! Each section is checked before any data is loaded, so a bad value
//! surfaces as a config error rather than a silently clamped result.

use crate::domain::error::QuantError;
use crate::domain::indicator::IndicatorConfig;
use crate::domain::risk::VarMethod;
use crate::domain::strategy::Strategy;
use crate::ports::config_port::ConfigPort;

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> QuantError {
    QuantError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Present keys must parse as numbers; absent keys are left to the caller's default.
fn optional_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, QuantError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("{} must be a number", key))),
    }
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    validate_template(config)?;
    validate_conditions(config)?;
    validate_exit_level(config, "stop_loss_pct")?;
    validate_exit_level(config, "take_profit_pct")?;
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    validate_confidence_level(config)?;
    validate_holding_period(config)?;
    validate_method(config)?;
    validate_simulations(config)?;
    validate_risk_free_rate(config, "risk")?;
    validate_risk_tolerance(config)?;
    validate_portfolio_value(config)?;
    validate_limits(config)?;
    Ok(())
}

pub fn validate_metrics_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    if let Some(value) = optional_number(config, "metrics", "initial_capital")? {
        if value <= 0.0 {
            return Err(invalid(
                "metrics",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
    }
    validate_risk_free_rate(config, "metrics")?;
    Ok(())
}

/// Reject indicators that parse but can never produce a value.
pub fn validate_indicator(config: &IndicatorConfig) -> Result<(), QuantError> {
    let reason = match *config {
        IndicatorConfig::Sma(0)
        | IndicatorConfig::Ema(0)
        | IndicatorConfig::Rsi(0)
        | IndicatorConfig::Atr(0)
        | IndicatorConfig::Bollinger { period: 0, .. } => {
            Some("period must be at least 1".to_string())
        }
        IndicatorConfig::Macd { fast, signal, .. } if fast == 0 || signal == 0 => {
            Some("periods must be at least 1".to_string())
        }
        IndicatorConfig::Macd { fast, slow, .. } if fast >= slow => Some(format!(
            "fast period {} must be shorter than slow period {}",
            fast, slow
        )),
        _ => None,
    };
    match reason {
        Some(reason) => Err(QuantError::RuleInvalid {
            reason: format!("{}: {}", config, reason),
        }),
        None => Ok(()),
    }
}

/// Every indicator the entry and exit trees reference must be computable.
pub fn validate_strategy(strategy: &Strategy) -> Result<(), QuantError> {
    strategy
        .required_indicators()
        .iter()
        .try_for_each(validate_indicator)
}

fn validate_template(config: &dyn ConfigPort) -> Result<(), QuantError> {
    match config.get_string("strategy", "template") {
        Some(name) if Strategy::template(name.trim()).is_none() => Err(invalid(
            "strategy",
            "template",
            format!("unknown template '{}'", name.trim()),
        )),
        _ => Ok(()),
    }
}

fn validate_conditions(config: &dyn ConfigPort) -> Result<(), QuantError> {
    if config.has_key("strategy", "template") {
        return Ok(());
    }
    for key in ["entry", "exit"] {
        if !config.has_key("strategy", key) {
            return Err(QuantError::ConfigMissing {
                section: "strategy".to_string(),
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_exit_level(config: &dyn ConfigPort, key: &str) -> Result<(), QuantError> {
    if let Some(value) = optional_number(config, "strategy", key)? {
        if value < 0.0 {
            return Err(invalid(
                "strategy",
                key,
                format!("{} must be non-negative", key),
            ));
        }
    }
    Ok(())
}

fn validate_confidence_level(config: &dyn ConfigPort) -> Result<(), QuantError> {
    if let Some(value) = optional_number(config, "risk", "confidence_level")? {
        if value <= 0.0 || value >= 1.0 {
            return Err(invalid(
                "risk",
                "confidence_level",
                "confidence_level must be between 0 and 1",
            ));
        }
    }
    Ok(())
}

fn validate_holding_period(config: &dyn ConfigPort) -> Result<(), QuantError> {
    if config.has_key("risk", "holding_period") {
        let value = config.get_int("risk", "holding_period", 0);
        if value < 1 || value > i64::from(u32::MAX) {
            return Err(invalid(
                "risk",
                "holding_period",
                "holding_period must be a whole number of days, at least 1",
            ));
        }
    }
    Ok(())
}

fn validate_method(config: &dyn ConfigPort) -> Result<(), QuantError> {
    match config.get_string("risk", "method") {
        Some(method) if VarMethod::parse(&method).is_none() => Err(invalid(
            "risk",
            "method",
            format!(
                "unknown method '{}', expected historical, parametric or monte_carlo",
                method.trim()
            ),
        )),
        _ => Ok(()),
    }
}

fn validate_simulations(config: &dyn ConfigPort) -> Result<(), QuantError> {
    if config.has_key("risk", "simulations") && config.get_int("risk", "simulations", 0) < 1 {
        return Err(invalid(
            "risk",
            "simulations",
            "simulations must be at least 1",
        ));
    }
    if config.has_key("risk", "seed") && config.get_int("risk", "seed", -1) < 0 {
        return Err(invalid("risk", "seed", "seed must be a non-negative integer"));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort, section: &str) -> Result<(), QuantError> {
    if let Some(value) = optional_number(config, section, "risk_free_rate")? {
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(
                section,
                "risk_free_rate",
                "risk_free_rate must be between 0 and 1",
            ));
        }
    }
    Ok(())
}

fn validate_risk_tolerance(config: &dyn ConfigPort) -> Result<(), QuantError> {
    if let Some(value) = optional_number(config, "risk", "risk_tolerance_pct")? {
        if value <= 0.0 || value > 100.0 {
            return Err(invalid(
                "risk",
                "risk_tolerance_pct",
                "risk_tolerance_pct must be in (0, 100]",
            ));
        }
    }
    Ok(())
}

fn validate_portfolio_value(config: &dyn ConfigPort) -> Result<(), QuantError> {
    if let Some(value) = optional_number(config, "risk", "portfolio_value")? {
        if value <= 0.0 {
            return Err(invalid(
                "risk",
                "portfolio_value",
                "portfolio_value must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_limits(config: &dyn ConfigPort) -> Result<(), QuantError> {
    for key in [
        "daily_loss_limit",
        "monthly_loss_limit",
        "max_drawdown_limit",
        "max_position_limit",
        "var_limit",
    ] {
        if let Some(value) = optional_number(config, "limits", key)? {
            if value <= 0.0 {
                return Err(invalid("limits", key, format!("{} must be positive", key)));
            }
        }
    }
    Ok(())
}
