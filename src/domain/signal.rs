//! Signal evaluation engine.
//!
//! Evaluates condition trees against a candle series at a bar index.
//!
//! # Evaluation Semantics
//!
//! - No state is carried between bars: each call reads the current and the
//!   previous value of every operand from the full series.
//! - `CROSS_ABOVE`/`CROSS_BELOW`: fail closed when a previous value is missing
//!   (index 0) or undefined.
//! - A leaf whose current left or right value is NaN evaluates `false`.
//! - `AND` is vacuously true when empty; `OR` is false when empty. Both short-circuit.
//! - Exit checks run in fixed priority: stop-loss, take-profit, then the tree.
//!
//! The free functions build a fresh `IndicatorCache` per call. Use
//! `SignalEvaluator` to share one cache across many bars of the same series.

use crate::domain::candle::Candle;
use crate::domain::condition::{
    ComparisonOperator, Condition, ConditionGroup, ConditionNode, Logic, Operand,
};
use crate::domain::indicator::IndicatorCache;

/// `EQ`/`NEQ` tolerance on |left - right|.
pub const EQUALITY_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Condition,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Condition => "condition",
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn evaluate_comparison(
    left: f64,
    operator: ComparisonOperator,
    right: f64,
    prev_left: Option<f64>,
    prev_right: Option<f64>,
) -> bool {
    match operator {
        ComparisonOperator::Gt => left > right,
        ComparisonOperator::Gte => left >= right,
        ComparisonOperator::Lt => left < right,
        ComparisonOperator::Lte => left <= right,
        ComparisonOperator::Eq => (left - right).abs() < EQUALITY_TOLERANCE,
        ComparisonOperator::Neq => (left - right).abs() >= EQUALITY_TOLERANCE,
        ComparisonOperator::CrossAbove => match defined_pair(prev_left, prev_right) {
            Some((pl, pr)) => pl <= pr && left > right,
            None => false,
        },
        ComparisonOperator::CrossBelow => match defined_pair(prev_left, prev_right) {
            Some((pl, pr)) => pl >= pr && left < right,
            None => false,
        },
    }
}

fn defined_pair(a: Option<f64>, b: Option<f64>) -> Option<(f64, f64)> {
    let (a, b) = (a?, b?);
    if a.is_nan() || b.is_nan() {
        None
    } else {
        Some((a, b))
    }
}

pub fn evaluate_condition(candles: &[Candle], condition: &Condition, index: usize) -> bool {
    SignalEvaluator::new(candles).condition(condition, index)
}

pub fn evaluate_condition_group(candles: &[Candle], group: &ConditionGroup, index: usize) -> bool {
    SignalEvaluator::new(candles).group(group, index)
}

pub fn detect_entry_signal(candles: &[Candle], entry: &ConditionGroup, index: usize) -> bool {
    SignalEvaluator::new(candles).entry(entry, index)
}

pub fn detect_exit_signal(
    candles: &[Candle],
    exit: &ConditionGroup,
    index: usize,
    entry_price: f64,
    stop_loss_pct: Option<f64>,
    take_profit_pct: Option<f64>,
) -> Option<ExitReason> {
    SignalEvaluator::new(candles).exit(exit, index, entry_price, stop_loss_pct, take_profit_pct)
}

/// Evaluates trees over one candle series through a shared indicator cache.
#[derive(Debug)]
pub struct SignalEvaluator<'a> {
    cache: IndicatorCache<'a>,
}

impl<'a> SignalEvaluator<'a> {
    pub fn new(candles: &'a [Candle]) -> Self {
        Self::with_cache(IndicatorCache::new(candles))
    }

    pub fn with_cache(cache: IndicatorCache<'a>) -> Self {
        Self { cache }
    }

    pub fn into_cache(self) -> IndicatorCache<'a> {
        self.cache
    }

    fn operand_value(&mut self, operand: &Operand, index: usize) -> f64 {
        match operand {
            Operand::Constant(v) => *v,
            Operand::Indicator(config) => self.cache.value_at(config, index),
        }
    }

    pub fn condition(&mut self, condition: &Condition, index: usize) -> bool {
        if index >= self.cache.candles().len() {
            return false;
        }

        let left_operand = Operand::Indicator(condition.left);
        let left = self.operand_value(&left_operand, index);
        let right = self.operand_value(&condition.right, index);

        if left.is_nan() || right.is_nan() {
            return false;
        }

        // Only crosses look back; index 0 has no previous bar.
        let (prev_left, prev_right) = match index.checked_sub(1) {
            Some(prev) if condition.operator.is_cross() => (
                Some(self.operand_value(&left_operand, prev)),
                Some(self.operand_value(&condition.right, prev)),
            ),
            _ => (None, None),
        };

        evaluate_comparison(left, condition.operator, right, prev_left, prev_right)
    }

    pub fn group(&mut self, group: &ConditionGroup, index: usize) -> bool {
        let mut eval = |node: &ConditionNode| match node {
            ConditionNode::Condition(c) => self.condition(c, index),
            ConditionNode::Group(g) => self.group(g, index),
        };
        match group.logic {
            Logic::And => group.children.iter().all(&mut eval),
            Logic::Or => group.children.iter().any(&mut eval),
        }
    }

    pub fn entry(&mut self, entry: &ConditionGroup, index: usize) -> bool {
        self.group(entry, index)
    }

    pub fn exit(
        &mut self,
        exit: &ConditionGroup,
        index: usize,
        entry_price: f64,
        stop_loss_pct: Option<f64>,
        take_profit_pct: Option<f64>,
    ) -> Option<ExitReason> {
        let close = self.cache.candles().get(index)?.close;

        if let Some(pct) = stop_loss_pct {
            if close <= entry_price * (1.0 - pct / 100.0) {
                return Some(ExitReason::StopLoss);
            }
        }

        if let Some(pct) = take_profit_pct {
            if close >= entry_price * (1.0 + pct / 100.0) {
                return Some(ExitReason::TakeProfit);
            }
        }

        if self.group(exit, index) {
            return Some(ExitReason::Condition);
        }

        None
    }
}
