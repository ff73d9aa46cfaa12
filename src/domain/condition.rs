//! Condition tree data structures.
//!
//! - `Condition`: a leaf comparing an indicator against another indicator or a constant
//! - `ConditionGroup`: an AND/OR node over an ordered list of children
//! - `ConditionNode`: the tagged sum of the two, so groups nest recursively
//!
//! The root of every tree is a `ConditionGroup`. `Display` renders the same
//! text the condition parser accepts.

use crate::domain::indicator::IndicatorConfig;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComparisonOperator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
    CrossAbove,
    CrossBelow,
}

impl ComparisonOperator {
    pub fn keyword(self) -> &'static str {
        match self {
            ComparisonOperator::Gt => "GT",
            ComparisonOperator::Gte => "GTE",
            ComparisonOperator::Lt => "LT",
            ComparisonOperator::Lte => "LTE",
            ComparisonOperator::Eq => "EQ",
            ComparisonOperator::Neq => "NEQ",
            ComparisonOperator::CrossAbove => "CROSS_ABOVE",
            ComparisonOperator::CrossBelow => "CROSS_BELOW",
        }
    }

    pub fn is_cross(self) -> bool {
        matches!(
            self,
            ComparisonOperator::CrossAbove | ComparisonOperator::CrossBelow
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    Indicator(IndicatorConfig),
    Constant(f64),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Condition {
    pub left: IndicatorConfig,
    pub operator: ComparisonOperator,
    pub right: Operand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Logic {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConditionNode {
    Condition(Condition),
    Group(ConditionGroup),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionGroup {
    pub logic: Logic,
    pub children: Vec<ConditionNode>,
}

impl Condition {
    pub fn new(left: IndicatorConfig, operator: ComparisonOperator, right: Operand) -> Self {
        Self {
            left,
            operator,
            right,
        }
    }
}

impl ConditionGroup {
    pub fn new(logic: Logic, children: Vec<ConditionNode>) -> Self {
        Self { logic, children }
    }

    pub fn all(children: Vec<ConditionNode>) -> Self {
        Self::new(Logic::And, children)
    }

    pub fn any(children: Vec<ConditionNode>) -> Self {
        Self::new(Logic::Or, children)
    }

    /// Every distinct indicator referenced anywhere in the tree, in first-seen order.
    pub fn extract_indicators(&self) -> Vec<IndicatorConfig> {
        let mut out = Vec::new();
        collect_indicators(self, &mut out);
        out
    }
}

fn collect_indicators(group: &ConditionGroup, out: &mut Vec<IndicatorConfig>) {
    for child in &group.children {
        match child {
            ConditionNode::Condition(c) => {
                push_unique(out, c.left);
                if let Operand::Indicator(right) = c.right {
                    push_unique(out, right);
                }
            }
            ConditionNode::Group(g) => collect_indicators(g, out),
        }
    }
}

fn push_unique(out: &mut Vec<IndicatorConfig>, config: IndicatorConfig) {
    if !out.contains(&config) {
        out.push(config);
    }
}

impl From<Condition> for ConditionNode {
    fn from(condition: Condition) -> Self {
        ConditionNode::Condition(condition)
    }
}

impl From<ConditionGroup> for ConditionNode {
    fn from(group: ConditionGroup) -> Self {
        ConditionNode::Group(group)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Indicator(config) => write!(f, "{}", config),
            Operand::Constant(v) => write!(f, "{}", v),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.operator.keyword(), self.left, self.right)
    }
}

impl fmt::Display for ConditionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionNode::Condition(c) => write!(f, "{}", c),
            ConditionNode::Group(g) => write!(f, "{}", g),
        }
    }
}

impl fmt::Display for ConditionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self.logic {
            Logic::And => "AND",
            Logic::Or => "OR",
        };
        write!(f, "{}(", keyword)?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", child)?;
        }
        write!(f, ")")
    }
}
