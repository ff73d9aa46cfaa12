//! Volatility, market sensitivity and concentration measures.

use crate::domain::metrics::TRADING_DAYS_PER_YEAR;
use crate::domain::stats::{covariance, std_dev, variance};

/// Standard deviation of daily returns, in percent.
pub fn daily_volatility(returns: &[f64]) -> f64 {
    std_dev(returns) * 100.0
}

pub fn annualized_volatility(returns: &[f64]) -> f64 {
    std_dev(returns) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
}

/// Annualized spread of the losing periods only. 0 when nothing lost.
pub fn downside_volatility(returns: &[f64]) -> f64 {
    let negatives: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if negatives.is_empty() {
        return 0.0;
    }
    std_dev(&negatives) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
}

/// Sensitivity to the market series. Degenerate input reports a neutral 1.
pub fn beta(portfolio: &[f64], market: &[f64]) -> f64 {
    if portfolio.len() != market.len() || portfolio.len() < 2 {
        return 1.0;
    }
    let market_variance = variance(market);
    if market_variance == 0.0 {
        return 1.0;
    }
    covariance(portfolio, market) / market_variance
}

/// Herfindahl–Hirschman index over weights given in percent (0..=10000).
pub fn hhi(weights: &[f64]) -> f64 {
    weights.iter().map(|w| w * w).sum()
}

/// Mean absolute off-diagonal correlation, scaled to 0..=100.
pub fn correlation_risk(matrix: &[Vec<f64>]) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for (i, row) in matrix.iter().enumerate() {
        for value in row.iter().skip(i + 1) {
            total += value.abs();
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    total / count as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn volatility_scales() {
        let r = [0.01, -0.01, 0.01, -0.01];
        assert_relative_eq!(daily_volatility(&r), 1.0, epsilon = 1e-9);
        assert_relative_eq!(annualized_volatility(&r), 252f64.sqrt(), epsilon = 1e-9);
        assert_eq!(daily_volatility(&[0.05]), 0.0);
    }

    #[test]
    fn downside_only_sees_losses() {
        assert_eq!(downside_volatility(&[0.01, 0.02]), 0.0);
        let r = [0.05, -0.01, -0.03];
        assert_relative_eq!(downside_volatility(&r), 1.0 * 252f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn beta_cases() {
        let market = [0.01, -0.02, 0.03];
        let doubled: Vec<f64> = market.iter().map(|m| m * 2.0).collect();
        assert_relative_eq!(beta(&doubled, &market), 2.0, epsilon = 1e-9);
        assert_eq!(beta(&[0.1], &[0.1]), 1.0);
        assert_eq!(beta(&[0.1, 0.2], &[0.1]), 1.0);
        assert_eq!(beta(&[0.1, 0.2], &[0.05, 0.05]), 1.0);
    }

    #[test]
    fn hhi_bounds() {
        assert_eq!(hhi(&[]), 0.0);
        assert_eq!(hhi(&[100.0]), 10_000.0);
        assert_eq!(hhi(&[50.0, 50.0]), 5_000.0);
    }

    #[test]
    fn correlation_upper_triangle() {
        let m = vec![
            vec![1.0, 0.5, -0.3],
            vec![0.5, 1.0, 0.1],
            vec![-0.3, 0.1, 1.0],
        ];
        assert_relative_eq!(correlation_risk(&m), 30.0, epsilon = 1e-9);
        assert_eq!(correlation_risk(&[vec![1.0]]), 0.0);
        assert_eq!(correlation_risk(&[]), 0.0);
    }
}
