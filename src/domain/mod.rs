//! Pure core: indicators, conditions, signals, metrics and risk.

pub mod candle;
pub mod stats;
pub mod indicator;
pub mod condition;
pub mod condition_parser;
pub mod signal;
pub mod strategy;
pub mod trade;
pub mod equity;
pub mod metrics;
pub mod risk;
pub mod config_validation;
pub mod error;
