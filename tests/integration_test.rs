//! End-to-end checks of the numeric core and the port-driven pipelines.
//!
//! Tests cover:
//! - Reference values for indicators, returns and trade statistics
//! - Convergence of the three VaR methods on seeded Gaussian returns
//! - Seeded Monte Carlo reproducibility
//! - Signal scanning with stop-loss / take-profit priority
//! - Symbol listing over a MockDataPort
//! - Metrics and risk pipelines over a MockDataPort, including error paths

mod common;

use approx::assert_relative_eq;
use common::*;
use quantcore::cli::{self, SignalKind};
use quantcore::domain::condition::ComparisonOperator;
use quantcore::domain::condition_parser;
use quantcore::domain::error::QuantError;
use quantcore::domain::indicator::calculate_sma;
use quantcore::domain::metrics::{max_drawdown, profit_factor, total_return, win_rate};
use quantcore::domain::risk::{
    MonteCarloConfig, PositionSizeParams, RiskSettings, VarMethod, VarParams, calculate_cvar,
    historical_var, monte_carlo_var, parametric_var, recommend_position_size,
};
use quantcore::domain::signal::{ExitReason, evaluate_comparison};
use quantcore::domain::strategy::Strategy;

/// Trade with a given P&L: 10 units, entry at 100.
fn pnl_trade(i: i64, pnl: f64) -> RoundTripTrade {
    make_trade(i, i + 1, 100.0, 100.0 + pnl / 10.0)
}

mod reference_values {
    use super::*;

    #[test]
    fn sma_of_five() {
        let sma = calculate_sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 5);
        assert_eq!(sma.len(), 5);
        assert!(sma[..4].iter().all(|v| v.is_nan()));
        assert_relative_eq!(sma[4], 30.0);
    }

    #[test]
    fn total_return_values() {
        assert_relative_eq!(total_return(10_000.0, 12_000.0), 20.0);
        assert_eq!(total_return(0.0, 1_000.0), 0.0);
    }

    #[test]
    fn win_rate_three_of_four() {
        let trades: Vec<_> = [100.0, 200.0, -50.0, 150.0]
            .iter()
            .enumerate()
            .map(|(i, &p)| pnl_trade(i as i64, p))
            .collect();
        assert_relative_eq!(win_rate(&trades), 75.0);
    }

    #[test]
    fn profit_factor_values() {
        let trades = vec![pnl_trade(0, 300.0), pnl_trade(1, -100.0)];
        assert_relative_eq!(profit_factor(&trades), 3.0, epsilon = 1e-9);

        let winners = vec![pnl_trade(0, 300.0)];
        assert_eq!(profit_factor(&winners), f64::INFINITY);
    }

    #[test]
    fn max_drawdown_from_later_peak() {
        let curve = make_equity_curve(&[10_000.0, 9_000.0, 10_500.0, 8_400.0]);
        assert_relative_eq!(max_drawdown(&curve), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn monotone_curve_has_no_drawdown() {
        let curve = make_equity_curve(&[100.0, 100.0, 101.0, 105.0, 105.0, 110.0]);
        assert_eq!(max_drawdown(&curve), 0.0);
    }

    #[test]
    fn crosses_fail_closed_without_previous_bar() {
        assert!(!evaluate_comparison(2.0, ComparisonOperator::CrossAbove, 1.0, None, None));
        assert!(!evaluate_comparison(1.0, ComparisonOperator::CrossBelow, 2.0, None, None));
        assert!(evaluate_comparison(2.0, ComparisonOperator::CrossAbove, 1.0, Some(1.0), Some(1.0)));
    }

    #[test]
    fn recommendation_respects_ceiling() {
        for win_rate in [0.0, 0.3, 0.6, 0.9, 1.0] {
            for volatility in [1.0, 15.0, 60.0] {
                let mut params = PositionSizeParams::new(100_000.0, volatility, 2.0);
                params.win_rate = win_rate;
                params.avg_win_loss_ratio = 3.0;
                let rec = recommend_position_size(&params);
                assert!(rec.recommended_size <= rec.max_allowed_size);
                assert!(rec.recommended_pct <= rec.max_allowed_pct);
            }
        }
    }
}

mod value_at_risk {
    use super::*;

    const SAMPLES: usize = 20_000;

    #[test]
    fn methods_converge_on_gaussian_returns() {
        let returns = gaussian_returns(SAMPLES, 0.0005, 0.01, 42);
        let hist = historical_var(&returns, 1_000_000.0, 0.95, 1);
        let para = parametric_var(&returns, 1_000_000.0, 0.95, 1);
        let mc = monte_carlo_var(
            &returns,
            1_000_000.0,
            0.95,
            1,
            &MonteCarloConfig::seeded(SAMPLES, 7),
        );

        assert_relative_eq!(hist.percentage, para.percentage, max_relative = 0.05);
        assert_relative_eq!(mc.percentage, para.percentage, max_relative = 0.05);
        assert_relative_eq!(mc.percentage, hist.percentage, max_relative = 0.05);
    }

    #[test]
    fn methods_converge_over_holding_period() {
        let returns = gaussian_returns(SAMPLES, 0.0, 0.01, 11);
        let para = parametric_var(&returns, 1.0, 0.99, 10);
        let mc = monte_carlo_var(&returns, 1.0, 0.99, 10, &MonteCarloConfig::seeded(SAMPLES, 3));
        assert_relative_eq!(mc.percentage, para.percentage, max_relative = 0.05);
    }

    #[test]
    fn seeded_monte_carlo_is_reproducible() {
        let returns = gaussian_returns(1_000, 0.0, 0.02, 5);
        let config = MonteCarloConfig::seeded(5_000, 99);
        let a = monte_carlo_var(&returns, 50_000.0, 0.95, 5, &config);
        let b = monte_carlo_var(&returns, 50_000.0, 0.95, 5, &config);
        assert_eq!(a.value, b.value);

        let other = monte_carlo_var(&returns, 50_000.0, 0.95, 5, &MonteCarloConfig::seeded(5_000, 100));
        assert_ne!(a.value, other.value);
    }

    #[test]
    fn cvar_at_least_var() {
        let returns = gaussian_returns(SAMPLES, 0.0, 0.015, 21);
        let cvar = calculate_cvar(&returns, 100_000.0, 0.95, 1);
        assert!(cvar.cvar_value >= cvar.var.value);
        assert!(cvar.cvar_percentage > 0.0);
    }
}

mod signal_scan {
    use super::*;

    const CLOSES: [f64; 11] = [10.0, 10.0, 10.0, 10.0, 12.0, 14.0, 16.0, 15.0, 12.0, 9.0, 8.0];

    fn crossover() -> Strategy {
        Strategy {
            name: "fast cross".to_string(),
            description: String::new(),
            entry: condition_parser::parse("CROSS_ABOVE(SMA(2), SMA(3))").unwrap(),
            exit: condition_parser::parse("CROSS_BELOW(SMA(2), SMA(3))").unwrap(),
            stop_loss_pct: None,
            take_profit_pct: None,
        }
    }

    #[test]
    fn condition_exit() {
        let events = cli::scan_signals(&make_candles(&CLOSES), &crossover());
        let kinds: Vec<_> = events.iter().map(|e| (e.index, e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (4, SignalKind::Entry),
                (8, SignalKind::Exit(ExitReason::Condition))
            ]
        );
        assert_relative_eq!(events[0].close, 12.0);
    }

    #[test]
    fn take_profit_fires_before_condition() {
        let strategy = Strategy {
            take_profit_pct: Some(25.0),
            ..crossover()
        };
        let events = cli::scan_signals(&make_candles(&CLOSES), &strategy);
        let kinds: Vec<_> = events.iter().map(|e| (e.index, e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (4, SignalKind::Entry),
                (6, SignalKind::Exit(ExitReason::TakeProfit))
            ]
        );
    }

    #[test]
    fn loose_stop_loss_does_not_fire() {
        let strategy = Strategy {
            stop_loss_pct: Some(10.0),
            ..crossover()
        };
        let events = cli::scan_signals(&make_candles(&CLOSES), &strategy);
        assert_eq!(events.last().map(|e| e.kind), Some(SignalKind::Exit(ExitReason::Condition)));
    }

    #[test]
    fn too_short_series_is_quiet() {
        let events = cli::scan_signals(&make_candles(&[10.0, 11.0]), &Strategy::golden_cross());
        assert!(events.is_empty());
    }
}

mod symbol_listing {
    use super::*;

    #[test]
    fn summaries_cover_every_symbol() {
        let port = MockDataPort::new()
            .with_candles("CBA", make_candles(&[50.0, 51.0, 52.0]))
            .with_candles("BHP", make_candles(&[40.0, 41.0]));
        let summaries = cli::symbol_summaries(&port).unwrap();

        let names: Vec<_> = summaries.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(names, vec!["BHP", "CBA"]);
        assert_eq!(summaries[0].bars, 2);
        assert_eq!(summaries[1].bars, 3);
        assert_eq!(summaries[1].first, Some(day(0)));
        assert_eq!(summaries[1].last, Some(day(2)));
    }

    #[test]
    fn unreadable_symbol_is_skipped() {
        let port = MockDataPort::new()
            .with_candles("BHP", make_candles(&[40.0]))
            .with_candles("WES", make_candles(&[10.0]))
            .with_error("WES", "truncated row");
        let summaries = cli::symbol_summaries(&port).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].symbol, "BHP");
    }

    #[test]
    fn empty_port_lists_nothing() {
        assert!(cli::symbol_summaries(&MockDataPort::new()).unwrap().is_empty());
    }
}

mod metrics_pipeline {
    use super::*;

    fn sample_port() -> MockDataPort {
        MockDataPort::new().with_run(
            "run1",
            make_equity_curve(&[100.0, 110.0, 99.0, 120.0]),
            vec![make_trade(0, 1, 100.0, 110.0), make_trade(1, 3, 100.0, 95.0)],
        )
    }

    #[test]
    fn computes_from_port() {
        let output = cli::run_metrics_pipeline(&sample_port(), "run1", None).unwrap();
        let m = &output.metrics;
        assert_relative_eq!(m.total_return, 20.0, epsilon = 1e-9);
        assert_eq!(m.total_trades, 2);
        assert_relative_eq!(m.win_rate, 50.0);
        assert_relative_eq!(m.profit_factor, 2.0, epsilon = 1e-9);
        assert_relative_eq!(m.max_drawdown, 10.0, epsilon = 1e-9);

        assert_eq!(output.drawdowns.len(), 1);
        assert_eq!(output.drawdowns[0].recovery_time, Some(day(3)));
        assert_eq!(output.monthly.len(), 1);
        assert_eq!(output.monthly[0].trade_count, 2);

        let text = cli::format_metrics(&output);
        assert!(text.contains("total return"));
        assert!(text.contains("2024-01"));
    }

    #[test]
    fn missing_trades_are_tolerated() {
        let mut port = MockDataPort::new();
        port.equity
            .insert("run1".to_string(), make_equity_curve(&[100.0, 105.0]));
        let output = cli::run_metrics_pipeline(&port, "run1", None).unwrap();
        assert_eq!(output.metrics.total_trades, 0);
        assert_relative_eq!(output.metrics.total_return, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn unknown_run_is_no_data() {
        let err = cli::run_metrics_pipeline(&sample_port(), "nope", None).unwrap_err();
        assert!(matches!(err, QuantError::NoData { .. }));
    }

    #[test]
    fn empty_curve_is_no_data() {
        let port = MockDataPort::new().with_run("empty", vec![], vec![]);
        let err = cli::run_metrics_pipeline(&port, "empty", None).unwrap_err();
        assert!(matches!(err, QuantError::NoData { .. }));
    }

    #[test]
    fn data_errors_propagate() {
        let port = sample_port().with_error("run1", "corrupt file");
        let err = cli::run_metrics_pipeline(&port, "run1", None).unwrap_err();
        match err {
            QuantError::Data { reason, .. } => assert_eq!(reason, "corrupt file"),
            other => panic!("expected Data error, got {:?}", other),
        }
    }
}

mod risk_pipeline {
    use super::*;

    fn sample_port() -> MockDataPort {
        let returns = gaussian_returns(500, 0.0005, 0.01, 7);
        MockDataPort::new().with_run("run1", curve_from_returns(100_000.0, &returns), vec![])
    }

    #[test]
    fn report_over_port() {
        let settings = RiskSettings {
            var: VarParams {
                method: VarMethod::Parametric,
                ..VarParams::default()
            },
            ..RiskSettings::default()
        };
        let report =
            cli::run_risk_pipeline(&sample_port(), "run1", &settings, &[50.0, 30.0, 20.0]).unwrap();

        assert_eq!(report.var.method, VarMethod::Parametric);
        assert!(report.var.value > 0.0);
        assert!(report.cvar.cvar_value > 0.0);
        assert_relative_eq!(report.hhi, 3_800.0, epsilon = 1e-9);
        assert!(report.risk_score <= 100);
        assert!(report.breaches.iter().any(|b| b.limit == "position size"));

        let text = cli::format_risk_report(&report);
        assert!(text.contains("VaR (parametric, 95%, 1d)"));
        assert!(text.contains("position size"));
    }

    #[test]
    fn seeded_monte_carlo_report_is_stable() {
        let settings = RiskSettings {
            var: VarParams {
                method: VarMethod::MonteCarlo,
                monte_carlo: MonteCarloConfig::seeded(2_000, 1),
                ..VarParams::default()
            },
            ..RiskSettings::default()
        };
        let a = cli::run_risk_pipeline(&sample_port(), "run1", &settings, &[]).unwrap();
        let b = cli::run_risk_pipeline(&sample_port(), "run1", &settings, &[]).unwrap();
        assert_eq!(a.var.value, b.var.value);
        assert_eq!(a.risk_score, b.risk_score);
    }

    #[test]
    fn unknown_run_is_no_data() {
        let err =
            cli::run_risk_pipeline(&sample_port(), "nope", &RiskSettings::default(), &[]).unwrap_err();
        assert!(matches!(err, QuantError::NoData { .. }));
    }
}
