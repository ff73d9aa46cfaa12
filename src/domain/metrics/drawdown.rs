//! Peak-to-trough analysis of an equity curve.

use chrono::{DateTime, Utc};

use crate::domain::equity::EquityPoint;
use crate::domain::stats::mean;

/// A drawdown of at least this many percent is counted as significant.
pub const SIGNIFICANT_DRAWDOWN_PCT: f64 = 5.0;

/// One peak-to-recovery episode.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrawdownRecord {
    pub start_time: DateTime<Utc>,
    pub trough_time: DateTime<Utc>,
    pub recovery_time: Option<DateTime<Utc>>,
    pub peak_equity: f64,
    pub trough_equity: f64,
    pub drawdown_pct: f64,
    /// Whole days from trough to recovery. `None` while unrecovered.
    pub recovery_days: Option<i64>,
}

/// Summary of drawdown behaviour over a plain value series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrawdownAnalysis {
    pub current_drawdown: f64,
    pub max_drawdown: f64,
    pub max_drawdown_at: Option<DateTime<Utc>>,
    pub avg_drawdown: f64,
    /// Samples since the last peak.
    pub current_duration: usize,
    /// Longest peak-to-recovery span in samples, including an open one.
    pub max_duration: usize,
    pub estimated_recovery: Option<usize>,
    pub drawdown_count: usize,
    pub significant_drawdowns: usize,
}

impl Default for DrawdownAnalysis {
    fn default() -> Self {
        Self {
            current_drawdown: 0.0,
            max_drawdown: 0.0,
            max_drawdown_at: None,
            avg_drawdown: 0.0,
            current_duration: 0,
            max_duration: 0,
            estimated_recovery: None,
            drawdown_count: 0,
            significant_drawdowns: 0,
        }
    }
}

fn pct_below(peak: f64, value: f64) -> f64 {
    if peak > 0.0 {
        (peak - value) / peak * 100.0
    } else {
        0.0
    }
}

/// Percent below the running peak at every sample.
pub fn drawdown_series(curve: &[EquityPoint]) -> Vec<f64> {
    let Some(first) = curve.first() else {
        return Vec::new();
    };
    let mut peak = first.equity;
    curve
        .iter()
        .map(|point| {
            if point.equity > peak {
                peak = point.equity;
            }
            pct_below(peak, point.equity)
        })
        .collect()
}

pub fn max_drawdown(curve: &[EquityPoint]) -> f64 {
    drawdown_series(curve).into_iter().fold(0.0, f64::max)
}

/// Mean over the samples that are actually below their peak.
pub fn avg_drawdown(curve: &[EquityPoint]) -> f64 {
    let underwater: Vec<f64> = drawdown_series(curve)
        .into_iter()
        .filter(|d| *d > 0.0)
        .collect();
    mean(&underwater)
}

enum DrawdownState {
    AtPeak,
    InDrawdown(DrawdownRecord),
}

/// Split the curve into drawdown episodes. The last one may be unrecovered.
pub fn extract_drawdown_records(curve: &[EquityPoint]) -> Vec<DrawdownRecord> {
    if curve.len() < 2 {
        return Vec::new();
    }

    let mut records = Vec::new();
    let mut peak = curve[0].equity;
    let mut peak_time = curve[0].timestamp;
    let mut state = DrawdownState::AtPeak;

    for point in curve {
        if point.equity > peak {
            if let DrawdownState::InDrawdown(mut record) =
                std::mem::replace(&mut state, DrawdownState::AtPeak)
            {
                record.recovery_time = Some(point.timestamp);
                record.recovery_days = Some((point.timestamp - record.trough_time).num_days());
                records.push(record);
            }
            peak = point.equity;
            peak_time = point.timestamp;
        } else if point.equity < peak {
            let drawdown_pct = pct_below(peak, point.equity);
            match &mut state {
                DrawdownState::AtPeak => {
                    state = DrawdownState::InDrawdown(DrawdownRecord {
                        start_time: peak_time,
                        trough_time: point.timestamp,
                        recovery_time: None,
                        peak_equity: peak,
                        trough_equity: point.equity,
                        drawdown_pct,
                        recovery_days: None,
                    });
                }
                DrawdownState::InDrawdown(record) if point.equity < record.trough_equity => {
                    record.trough_time = point.timestamp;
                    record.trough_equity = point.equity;
                    record.drawdown_pct = drawdown_pct;
                }
                DrawdownState::InDrawdown(_) => {}
            }
        }
    }

    if let DrawdownState::InDrawdown(record) = state {
        records.push(record);
    }
    records
}

/// Percent the last value sits below the series maximum.
pub fn current_drawdown(values: &[f64]) -> f64 {
    let Some(&last) = values.last() else {
        return 0.0;
    };
    let peak = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    pct_below(peak, last)
}

/// Single-pass drawdown statistics over raw values with matching timestamps.
///
/// Durations are measured in samples. The recovery estimate scales the longest
/// observed episode by how deep the current drawdown is relative to the worst one.
pub fn analyze_drawdown(values: &[f64], timestamps: &[DateTime<Utc>]) -> DrawdownAnalysis {
    let Some(&first) = values.first() else {
        return DrawdownAnalysis::default();
    };

    let mut analysis = DrawdownAnalysis::default();
    let mut peak = first;
    let mut peak_index = 0;
    let mut max_index = None;
    let mut episode_start = 0;
    let mut in_drawdown = false;
    let mut episode_significant = false;
    let mut underwater = Vec::new();

    for (i, &value) in values.iter().enumerate() {
        if value > peak {
            if in_drawdown {
                in_drawdown = false;
                analysis.max_duration = analysis.max_duration.max(i - episode_start);
            }
            peak = value;
            peak_index = i;
            analysis.current_drawdown = 0.0;
            analysis.current_duration = 0;
            continue;
        }

        let dd = pct_below(peak, value);
        analysis.current_drawdown = dd;
        if dd > 0.0 {
            if !in_drawdown {
                in_drawdown = true;
                episode_start = peak_index;
                episode_significant = false;
                analysis.drawdown_count += 1;
            }
            if !episode_significant && dd >= SIGNIFICANT_DRAWDOWN_PCT {
                episode_significant = true;
                analysis.significant_drawdowns += 1;
            }
            underwater.push(dd);
        }
        if dd > analysis.max_drawdown {
            analysis.max_drawdown = dd;
            max_index = Some(i);
        }
        analysis.current_duration = i - peak_index;
    }

    if in_drawdown {
        analysis.max_duration = analysis.max_duration.max(values.len() - 1 - episode_start);
    }

    analysis.avg_drawdown = mean(&underwater);
    analysis.max_drawdown_at = max_index.and_then(|i| timestamps.get(i).copied());
    if analysis.current_drawdown > 0.0 && analysis.max_duration > 0 {
        let ratio = analysis.current_drawdown / analysis.max_drawdown;
        analysis.estimated_recovery = Some((ratio * analysis.max_duration as f64).ceil() as usize);
    }
    analysis
}
