//! quantcore: technical indicators, a condition DSL for entry/exit signals,
//! and performance and risk analytics over recorded backtest runs.
//!
//! Hexagonal architecture: the pure numeric core lives in [`domain`], port
//! traits in [`ports`], file-backed implementations in [`adapters`] and the
//! command-line surface in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
