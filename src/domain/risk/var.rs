//! Value at Risk and expected shortfall.
//!
//! All three estimators take fractional daily returns and report the loss as a
//! non-negative magnitude, both in currency (`value`) and in percent of the
//! portfolio (`percentage`). Historical and parametric VaR scale a one-day
//! figure by the square root of the holding period; Monte Carlo simulates the
//! whole horizon directly.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::domain::stats::{mean, std_dev};

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;
pub const DEFAULT_SIMULATIONS: usize = 10_000;

/// Paths per independently seeded chunk of a Monte Carlo run.
const SIMULATION_CHUNK: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarMethod {
    #[default]
    Historical,
    Parametric,
    MonteCarlo,
}

impl VarMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            VarMethod::Historical => "historical",
            VarMethod::Parametric => "parametric",
            VarMethod::MonteCarlo => "monte_carlo",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "historical" => Some(VarMethod::Historical),
            "parametric" => Some(VarMethod::Parametric),
            "monte_carlo" | "montecarlo" => Some(VarMethod::MonteCarlo),
            _ => None,
        }
    }
}

impl fmt::Display for VarMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarResult {
    pub value: f64,
    pub percentage: f64,
    pub confidence_level: f64,
    pub holding_period: u32,
    pub method: VarMethod,
    pub calculated_at: DateTime<Utc>,
}

impl VarResult {
    fn zero(confidence_level: f64, holding_period: u32, method: VarMethod) -> Self {
        Self {
            value: 0.0,
            percentage: 0.0,
            confidence_level,
            holding_period,
            method,
            calculated_at: Utc::now(),
        }
    }

    fn from_return(
        loss_return: f64,
        portfolio_value: f64,
        confidence_level: f64,
        holding_period: u32,
        method: VarMethod,
    ) -> Self {
        Self {
            value: (loss_return * portfolio_value).abs(),
            percentage: loss_return.abs() * 100.0,
            confidence_level,
            holding_period,
            method,
            calculated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CvarResult {
    pub var: VarResult,
    pub cvar_value: f64,
    pub cvar_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonteCarloConfig {
    pub simulations: usize,
    /// `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            simulations: DEFAULT_SIMULATIONS,
            seed: None,
        }
    }
}

impl MonteCarloConfig {
    pub fn seeded(simulations: usize, seed: u64) -> Self {
        Self {
            simulations,
            seed: Some(seed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarParams {
    pub method: VarMethod,
    pub confidence_level: f64,
    pub holding_period: u32,
    pub monte_carlo: MonteCarloConfig,
}

impl Default for VarParams {
    fn default() -> Self {
        Self {
            method: VarMethod::Historical,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            holding_period: 1,
            monte_carlo: MonteCarloConfig::default(),
        }
    }
}

/// One-sided normal quantile for the common confidence levels; 1.645 otherwise.
pub fn z_score(confidence_level: f64) -> f64 {
    const TABLE: [(f64, f64); 3] = [(0.90, 1.282), (0.95, 1.645), (0.99, 2.326)];
    TABLE
        .iter()
        .find(|(level, _)| (level - confidence_level).abs() < 1e-9)
        .map_or(1.645, |(_, z)| *z)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// `⌊(1−c)·n⌋`, kept inside `0..n`.
fn quantile_index(confidence_level: f64, n: usize) -> usize {
    let raw = ((1.0 - confidence_level) * n as f64).floor();
    // negative and NaN saturate to 0
    (raw as usize).min(n.saturating_sub(1))
}

fn horizon_scale(holding_period: u32) -> f64 {
    f64::from(holding_period).sqrt()
}

pub fn historical_var(
    returns: &[f64],
    portfolio_value: f64,
    confidence_level: f64,
    holding_period: u32,
) -> VarResult {
    if returns.is_empty() {
        return VarResult::zero(confidence_level, holding_period, VarMethod::Historical);
    }
    let sorted = sorted(returns);
    let quantile = sorted[quantile_index(confidence_level, sorted.len())];
    VarResult::from_return(
        quantile * horizon_scale(holding_period),
        portfolio_value,
        confidence_level,
        holding_period,
        VarMethod::Historical,
    )
}

pub fn parametric_var(
    returns: &[f64],
    portfolio_value: f64,
    confidence_level: f64,
    holding_period: u32,
) -> VarResult {
    if returns.len() < 2 {
        return VarResult::zero(confidence_level, holding_period, VarMethod::Parametric);
    }
    let quantile = mean(returns) - z_score(confidence_level) * std_dev(returns);
    VarResult::from_return(
        quantile * horizon_scale(holding_period),
        portfolio_value,
        confidence_level,
        holding_period,
        VarMethod::Parametric,
    )
}

/// Standard normal draw via Box–Muller.
fn standard_normal(rng: &mut StdRng) -> f64 {
    // shift into (0, 1] so the log stays finite
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn simulate_chunk(seed: u64, paths: usize, mu: f64, sigma: f64, holding_period: u32) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..paths)
        .map(|_| {
            (0..holding_period)
                .map(|_| mu + sigma * standard_normal(&mut rng))
                .sum()
        })
        .collect()
}

fn simulate_paths(mu: f64, sigma: f64, holding_period: u32, config: &MonteCarloConfig) -> Vec<f64> {
    let mut master = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let chunks: Vec<(u64, usize)> = (0..config.simulations)
        .step_by(SIMULATION_CHUNK)
        .map(|start| {
            let paths = SIMULATION_CHUNK.min(config.simulations - start);
            (master.random::<u64>(), paths)
        })
        .collect();

    #[cfg(feature = "parallel")]
    let iter = chunks.into_par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = chunks.into_iter();

    let per_chunk: Vec<Vec<f64>> = iter
        .map(|(seed, paths)| simulate_chunk(seed, paths, mu, sigma, holding_period))
        .collect();
    per_chunk.into_iter().flatten().collect()
}

/// Simulates `simulations` cumulative returns over the holding period from a
/// normal fit of `returns` and reads off the same empirical quantile as
/// [`historical_var`]. The result is not scaled by √T.
pub fn monte_carlo_var(
    returns: &[f64],
    portfolio_value: f64,
    confidence_level: f64,
    holding_period: u32,
    config: &MonteCarloConfig,
) -> VarResult {
    if returns.len() < 2 || config.simulations == 0 {
        return VarResult::zero(confidence_level, holding_period, VarMethod::MonteCarlo);
    }
    let mu = mean(returns);
    let sigma = std_dev(returns);
    tracing::debug!(
        simulations = config.simulations,
        holding_period,
        seeded = config.seed.is_some(),
        "running monte carlo var"
    );

    let outcomes = sorted(&simulate_paths(mu, sigma, holding_period, config));
    let quantile = outcomes[quantile_index(confidence_level, outcomes.len())];
    VarResult::from_return(
        quantile,
        portfolio_value,
        confidence_level,
        holding_period,
        VarMethod::MonteCarlo,
    )
}

pub fn calculate_var(returns: &[f64], portfolio_value: f64, params: &VarParams) -> VarResult {
    let (c, hp) = (params.confidence_level, params.holding_period);
    match params.method {
        VarMethod::Historical => historical_var(returns, portfolio_value, c, hp),
        VarMethod::Parametric => parametric_var(returns, portfolio_value, c, hp),
        VarMethod::MonteCarlo => monte_carlo_var(returns, portfolio_value, c, hp, &params.monte_carlo),
    }
}

/// Expected shortfall: the mean of the sorted returns below the historical
/// cutoff (at least one), scaled by √T. Carries the historical VaR alongside.
pub fn calculate_cvar(
    returns: &[f64],
    portfolio_value: f64,
    confidence_level: f64,
    holding_period: u32,
) -> CvarResult {
    let var = historical_var(returns, portfolio_value, confidence_level, holding_period);
    if returns.is_empty() {
        return CvarResult {
            var,
            cvar_value: 0.0,
            cvar_percentage: 0.0,
        };
    }

    let sorted = sorted(returns);
    let cutoff = ((1.0 - confidence_level) * sorted.len() as f64).floor() as usize;
    let tail = &sorted[..cutoff.clamp(1, sorted.len())];
    let shortfall = mean(tail) * horizon_scale(holding_period);

    CvarResult {
        var,
        cvar_value: (shortfall * portfolio_value).abs(),
        cvar_percentage: shortfall.abs() * 100.0,
    }
}
