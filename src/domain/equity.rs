//! Equity curve samples.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub cash: f64,
    pub position_value: f64,
    /// Percent below the running peak at this sample.
    pub drawdown: f64,
}

pub fn equity_values(curve: &[EquityPoint]) -> Vec<f64> {
    curve.iter().map(|p| p.equity).collect()
}

/// Fill in `drawdown` on every point from a running-peak scan.
pub fn annotate_drawdowns(curve: &mut [EquityPoint]) {
    let mut peak = f64::NEG_INFINITY;
    for point in curve.iter_mut() {
        peak = peak.max(point.equity);
        point.drawdown = if peak > 0.0 && point.equity < peak {
            (peak - point.equity) / peak * 100.0
        } else {
            0.0
        };
    }
}
