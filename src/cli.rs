//! CLI definition and dispatch.
//!
//! Every command loads its inputs through the ports, runs the pure core and
//! prints plain text (or CSV) to stdout. Progress and errors go to the log.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::candle::Candle;
use crate::domain::condition::ConditionGroup;
use crate::domain::condition_parser;
use crate::domain::config_validation::{
    validate_indicator, validate_metrics_config, validate_risk_config, validate_strategy,
    validate_strategy_config,
};
use crate::domain::error::QuantError;
use crate::domain::indicator::{IndicatorCache, IndicatorConfig};
use crate::domain::metrics::{
    DEFAULT_RISK_FREE_RATE, DrawdownRecord, MonthlyReturn, PerformanceMetrics,
    extract_drawdown_records, monthly_returns,
};
use crate::domain::risk::{
    MonteCarloConfig, PositionSizeParams, PositionSizeRecommendation, RiskLimits, RiskReport,
    RiskSettings, VarMethod, VarParams, recommend_position_size,
};
use crate::domain::signal::{ExitReason, SignalEvaluator};
use crate::domain::strategy::{Strategy, TEMPLATE_NAMES};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "quantcore", about = "Indicators, signals and performance/risk analytics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a strategy file and show its condition trees
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// List the built-in strategy templates
    Templates,
    /// List the symbols with candle files in a data directory
    Symbols {
        #[arg(short, long)]
        data: PathBuf,
    },
    /// Compute indicator series for one symbol as CSV
    Indicators {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: String,
        /// Indicator expression such as `SMA(20)` or `BOLLINGER_UPPER(20,2)`; repeatable
        #[arg(short, long = "indicator", required = true)]
        indicators: Vec<String>,
    },
    /// Show every bar where the strategy's entry or exit fires
    Signals {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// Performance metrics for a recorded backtest run
    Metrics {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        run: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Risk report (VaR, CVaR, drawdown, volatility, score) for a recorded run
    Risk {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        run: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// historical, parametric or monte_carlo; overrides the config
        #[arg(long)]
        method: Option<String>,
        /// Current position weights in percent, comma separated
        #[arg(long)]
        weights: Option<String>,
    },
    /// Recommend a position size
    Size {
        #[arg(long)]
        portfolio_value: f64,
        /// Expected annualized volatility, percent
        #[arg(long)]
        volatility: f64,
        /// Stop-loss distance, percent
        #[arg(long)]
        stop_loss: f64,
        #[arg(long, default_value_t = 2.0)]
        risk_tolerance: f64,
        /// Fraction of winning trades, 0 to 1
        #[arg(long, default_value_t = 0.5)]
        win_rate: f64,
        #[arg(long, default_value_t = 1.5)]
        win_loss_ratio: f64,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Validate { strategy } => run_validate(&strategy),
        Command::Templates => run_templates(),
        Command::Symbols { data } => run_symbols(&data),
        Command::Indicators {
            data,
            symbol,
            indicators,
        } => run_indicators(&data, &symbol, &indicators),
        Command::Signals {
            data,
            symbol,
            strategy,
        } => run_signals(&data, &symbol, &strategy),
        Command::Metrics { data, run, config } => run_metrics(&data, &run, config.as_deref()),
        Command::Risk {
            data,
            run,
            config,
            method,
            weights,
        } => run_risk(
            &data,
            &run,
            config.as_deref(),
            method.as_deref(),
            weights.as_deref(),
        ),
        Command::Size {
            portfolio_value,
            volatility,
            stop_loss,
            risk_tolerance,
            win_rate,
            win_loss_ratio,
        } => {
            let params = PositionSizeParams {
                portfolio_value,
                expected_volatility: volatility,
                stop_loss_pct: stop_loss,
                risk_tolerance_pct: risk_tolerance,
                win_rate,
                avg_win_loss_ratio: win_loss_ratio,
            };
            run_size(&params)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, QuantError> {
    info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

fn parse_condition(text: &str, key: &str) -> Result<ConditionGroup, QuantError> {
    condition_parser::parse(text).map_err(|e| {
        error!(
            "failed to parse {}:\n{}",
            key,
            e.display_with_context(text)
        );
        QuantError::from(e)
    })
}

/// Build a strategy from `[strategy]`. A `template` key seeds the trees;
/// explicit `entry`/`exit` keys override them.
pub fn build_strategy(config: &dyn ConfigPort) -> Result<Strategy, QuantError> {
    let template = config
        .get_string("strategy", "template")
        .map(|name| {
            Strategy::template(name.trim()).ok_or_else(|| QuantError::ConfigInvalid {
                section: "strategy".to_string(),
                key: "template".to_string(),
                reason: format!("unknown template '{}'", name.trim()),
            })
        })
        .transpose()?;

    let entry = match config.get_string("strategy", "entry") {
        Some(text) => parse_condition(&text, "entry")?,
        None => match &template {
            Some(t) => t.entry.clone(),
            None => {
                return Err(QuantError::ConfigMissing {
                    section: "strategy".to_string(),
                    key: "entry".to_string(),
                });
            }
        },
    };
    let exit = match config.get_string("strategy", "exit") {
        Some(text) => parse_condition(&text, "exit")?,
        None => match &template {
            Some(t) => t.exit.clone(),
            None => {
                return Err(QuantError::ConfigMissing {
                    section: "strategy".to_string(),
                    key: "exit".to_string(),
                });
            }
        },
    };

    let name = config
        .get_string("strategy", "name")
        .or_else(|| template.as_ref().map(|t| t.name.clone()))
        .unwrap_or_else(|| "Unnamed".to_string());
    let description = config
        .get_string("strategy", "description")
        .or_else(|| template.as_ref().map(|t| t.description.clone()))
        .unwrap_or_default();

    let strategy = Strategy {
        name,
        description,
        entry,
        exit,
        stop_loss_pct: config
            .get_optional_double("strategy", "stop_loss_pct")
            .or_else(|| template.as_ref().and_then(|t| t.stop_loss_pct)),
        take_profit_pct: config
            .get_optional_double("strategy", "take_profit_pct")
            .or_else(|| template.as_ref().and_then(|t| t.take_profit_pct)),
    };
    validate_strategy(&strategy)?;
    Ok(strategy)
}

/// Build risk settings from `[risk]` and `[limits]`. Missing keys take defaults.
pub fn build_risk_settings(config: &dyn ConfigPort) -> Result<RiskSettings, QuantError> {
    let defaults = RiskSettings::default();
    let method = match config.get_string("risk", "method") {
        Some(raw) => parse_method(&raw)?,
        None => defaults.var.method,
    };
    let seed = config
        .has_key("risk", "seed")
        .then(|| config.get_int("risk", "seed", 0))
        .and_then(|s| u64::try_from(s).ok());
    let simulations = config.get_int("risk", "simulations", defaults.var.monte_carlo.simulations as i64);
    let holding_period = config.get_int("risk", "holding_period", 1);

    let limits = RiskLimits {
        daily_loss_pct: config.get_double("limits", "daily_loss_limit", defaults.limits.daily_loss_pct),
        monthly_loss_pct: config.get_double(
            "limits",
            "monthly_loss_limit",
            defaults.limits.monthly_loss_pct,
        ),
        max_drawdown_pct: config.get_double(
            "limits",
            "max_drawdown_limit",
            defaults.limits.max_drawdown_pct,
        ),
        max_position_pct: config.get_double(
            "limits",
            "max_position_limit",
            defaults.limits.max_position_pct,
        ),
        var_pct: config.get_double("limits", "var_limit", defaults.limits.var_pct),
    };

    Ok(RiskSettings {
        var: VarParams {
            method,
            confidence_level: config.get_double(
                "risk",
                "confidence_level",
                defaults.var.confidence_level,
            ),
            holding_period: u32::try_from(holding_period).unwrap_or(1).max(1),
            monte_carlo: MonteCarloConfig {
                simulations: usize::try_from(simulations).unwrap_or(0),
                seed,
            },
        },
        risk_free_rate: config.get_double("risk", "risk_free_rate", DEFAULT_RISK_FREE_RATE),
        portfolio_value: config.get_optional_double("risk", "portfolio_value"),
        limits,
    })
}

pub fn parse_method(raw: &str) -> Result<VarMethod, QuantError> {
    VarMethod::parse(raw).ok_or_else(|| QuantError::ConfigInvalid {
        section: "risk".to_string(),
        key: "method".to_string(),
        reason: format!("unknown method '{}'", raw.trim()),
    })
}

pub fn parse_indicator_args(args: &[String]) -> Result<Vec<IndicatorConfig>, QuantError> {
    args.iter()
        .map(|arg| {
            let config = condition_parser::parse_indicator(arg).map_err(|e| {
                error!("bad indicator:\n{}", e.display_with_context(arg));
                QuantError::from(e)
            })?;
            validate_indicator(&config)?;
            Ok(config)
        })
        .collect()
}

pub fn parse_weights(raw: &str) -> Result<Vec<f64>, QuantError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>().map_err(|_| QuantError::ConfigInvalid {
                section: "cli".to_string(),
                key: "weights".to_string(),
                reason: format!("'{}' is not a number", s),
            })
        })
        .collect()
}

fn require_candles(data: &dyn DataPort, symbol: &str) -> Result<Vec<Candle>, QuantError> {
    let candles = data.fetch_candles(symbol)?;
    if candles.is_empty() {
        return Err(QuantError::NoData {
            name: symbol.to_string(),
        });
    }
    info!("loaded {} candles for {}", candles.len(), symbol);
    Ok(candles)
}

// ---------------------------------------------------------------------------
// validate / templates
// ---------------------------------------------------------------------------

struct StrategySummary<'a>(&'a Strategy);

impl fmt::Display for StrategySummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = self.0;
        writeln!(f, "Strategy: {}", strategy.name)?;
        if !strategy.description.is_empty() {
            writeln!(f, "  {}", strategy.description)?;
        }
        writeln!(f, "Entry: {}", strategy.entry)?;
        writeln!(f, "Exit:  {}", strategy.exit)?;
        if let Some(pct) = strategy.stop_loss_pct {
            writeln!(f, "Stop loss:   {}%", pct)?;
        }
        if let Some(pct) = strategy.take_profit_pct {
            writeln!(f, "Take profit: {}%", pct)?;
        }
        let indicators: Vec<String> = strategy
            .required_indicators()
            .iter()
            .map(ToString::to_string)
            .collect();
        writeln!(f, "Indicators: {}", indicators.join(", "))
    }
}

pub fn describe_strategy(strategy: &Strategy) -> String {
    StrategySummary(strategy).to_string()
}

fn run_validate(path: &Path) -> Result<(), QuantError> {
    let config = load_config(path)?;
    validate_strategy_config(&config)?;
    let strategy = build_strategy(&config)?;
    print!("{}", StrategySummary(&strategy));
    Ok(())
}

fn run_templates() -> Result<(), QuantError> {
    for name in TEMPLATE_NAMES {
        if let Some(strategy) = Strategy::template(name) {
            println!("[{}]", name);
            print!("{}", StrategySummary(&strategy));
            println!();
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// symbols
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSummary {
    pub symbol: String,
    pub bars: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
}

/// Bar count and date range for every symbol the port knows about.
/// Symbols whose candles fail to load are skipped with a warning.
pub fn symbol_summaries(data: &dyn DataPort) -> Result<Vec<SymbolSummary>, QuantError> {
    let mut summaries = Vec::new();
    for symbol in data.list_symbols()? {
        let candles = match data.fetch_candles(&symbol) {
            Ok(candles) => candles,
            Err(e) => {
                warn!("skipping {}: {}", symbol, e);
                continue;
            }
        };
        summaries.push(SymbolSummary {
            bars: candles.len(),
            first: candles.first().map(|c| c.timestamp),
            last: candles.last().map(|c| c.timestamp),
            symbol,
        });
    }
    Ok(summaries)
}

fn run_symbols(data_dir: &Path) -> Result<(), QuantError> {
    let data = CsvAdapter::new(data_dir.to_path_buf());
    let summaries = symbol_summaries(&data)?;
    if summaries.is_empty() {
        warn!("no candle files in {}", data_dir.display());
    }

    println!("{:<12} {:>8}  {:<10}  {:<10}", "symbol", "bars", "first", "last");
    for summary in &summaries {
        let date = |t: Option<DateTime<Utc>>| {
            t.map(|t| t.date_naive().to_string()).unwrap_or_default()
        };
        println!(
            "{:<12} {:>8}  {:<10}  {:<10}",
            summary.symbol,
            summary.bars,
            date(summary.first),
            date(summary.last)
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// indicators
// ---------------------------------------------------------------------------

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{:.6}", value)
    }
}

/// Write `timestamp,close,<indicator>...` rows. Warm-up values are empty cells.
pub fn write_indicator_csv<W: io::Write>(
    writer: W,
    candles: &[Candle],
    configs: &[IndicatorConfig],
) -> Result<(), QuantError> {
    let to_io = |e: csv::Error| QuantError::Io(io::Error::other(e));
    let mut cache = IndicatorCache::new(candles);
    let series: Vec<_> = configs.iter().map(|c| cache.get(c)).collect();

    let mut out = csv::Writer::from_writer(writer);
    let mut header = vec!["timestamp".to_string(), "close".to_string()];
    header.extend(configs.iter().map(ToString::to_string));
    out.write_record(&header).map_err(to_io)?;

    for (i, candle) in candles.iter().enumerate() {
        let mut row = vec![candle.timestamp.to_rfc3339(), format_value(candle.close)];
        row.extend(series.iter().map(|s| format_value(s[i])));
        out.write_record(&row).map_err(to_io)?;
    }
    out.flush()?;
    Ok(())
}

fn run_indicators(data_dir: &Path, symbol: &str, args: &[String]) -> Result<(), QuantError> {
    let configs = parse_indicator_args(args)?;
    let data = CsvAdapter::new(data_dir.to_path_buf());
    let candles = require_candles(&data, symbol)?;
    write_indicator_csv(io::stdout().lock(), &candles, &configs)
}

// ---------------------------------------------------------------------------
// signals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalKind {
    Entry,
    Exit(ExitReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalEvent {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub kind: SignalKind,
}

/// Walk the series once, alternating between looking for an entry and
/// looking for an exit from the last entry's close.
pub fn scan_signals(candles: &[Candle], strategy: &Strategy) -> Vec<SignalEvent> {
    let mut evaluator = SignalEvaluator::new(candles);
    let mut entry_price: Option<f64> = None;
    let mut events = Vec::new();

    for (index, candle) in candles.iter().enumerate() {
        let kind = match entry_price {
            None => evaluator
                .entry(&strategy.entry, index)
                .then_some(SignalKind::Entry),
            Some(price) => evaluator
                .exit(
                    &strategy.exit,
                    index,
                    price,
                    strategy.stop_loss_pct,
                    strategy.take_profit_pct,
                )
                .map(SignalKind::Exit),
        };

        if let Some(kind) = kind {
            entry_price = match kind {
                SignalKind::Entry => Some(candle.close),
                SignalKind::Exit(_) => None,
            };
            events.push(SignalEvent {
                index,
                timestamp: candle.timestamp,
                close: candle.close,
                kind,
            });
        }
    }
    events
}

fn run_signals(data_dir: &Path, symbol: &str, strategy_path: &Path) -> Result<(), QuantError> {
    let config = load_config(strategy_path)?;
    validate_strategy_config(&config)?;
    let strategy = build_strategy(&config)?;
    info!("scanning {} with strategy {}", symbol, strategy.name);

    let data = CsvAdapter::new(data_dir.to_path_buf());
    let candles = require_candles(&data, symbol)?;
    let events = scan_signals(&candles, &strategy);
    if events.is_empty() {
        warn!("no signals fired over {} bars", candles.len());
    }

    println!("{:<6} {:<25} {:>12}  signal", "bar", "timestamp", "close");
    for event in &events {
        let label = match event.kind {
            SignalKind::Entry => "entry".to_string(),
            SignalKind::Exit(reason) => format!("exit ({})", reason),
        };
        println!(
            "{:<6} {:<25} {:>12.4}  {}",
            event.index,
            event.timestamp.to_rfc3339(),
            event.close,
            label
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MetricsOutput {
    pub metrics: PerformanceMetrics,
    pub drawdowns: Vec<DrawdownRecord>,
    pub monthly: Vec<MonthlyReturn>,
}

pub fn run_metrics_pipeline(
    data: &dyn DataPort,
    run: &str,
    config: Option<&dyn ConfigPort>,
) -> Result<MetricsOutput, QuantError> {
    let curve = data.fetch_equity_curve(run)?;
    let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
        return Err(QuantError::NoData {
            name: run.to_string(),
        });
    };
    let trades = data.fetch_trades(run).or_else(|e| match e {
        QuantError::NoData { .. } => {
            warn!("no trade file for run {}, trade statistics will be empty", run);
            Ok(Vec::new())
        }
        other => Err(other),
    })?;
    info!("loaded {} equity points and {} trades", curve.len(), trades.len());

    let initial_capital = config
        .and_then(|c| c.get_optional_double("metrics", "initial_capital"))
        .unwrap_or(first.equity);
    let risk_free_rate = config
        .map(|c| c.get_double("metrics", "risk_free_rate", DEFAULT_RISK_FREE_RATE))
        .unwrap_or(DEFAULT_RISK_FREE_RATE);

    let metrics = PerformanceMetrics::compute(
        initial_capital,
        last.equity,
        &curve,
        &trades,
        risk_free_rate,
    );
    Ok(MetricsOutput {
        metrics,
        drawdowns: extract_drawdown_records(&curve),
        monthly: monthly_returns(&curve, &trades),
    })
}

fn ratio(value: f64) -> String {
    if value.is_infinite() {
        if value > 0.0 { "inf".into() } else { "-inf".into() }
    } else {
        format!("{:.3}", value)
    }
}

impl fmt::Display for MetricsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.metrics;
        writeln!(f, "Returns")?;
        writeln!(f, "  total return:        {:>10.2}%", m.total_return)?;
        writeln!(f, "  annualized return:   {:>10.2}%", m.annualized_return)?;
        writeln!(f, "  monthly return:      {:>10.2}%", m.monthly_return)?;
        writeln!(f, "Risk-adjusted")?;
        writeln!(f, "  sharpe:              {:>10}", ratio(m.sharpe_ratio))?;
        writeln!(f, "  sortino:             {:>10}", ratio(m.sortino_ratio))?;
        writeln!(f, "  calmar:              {:>10}", ratio(m.calmar_ratio))?;
        writeln!(f, "Drawdown")?;
        writeln!(f, "  max drawdown:        {:>10.2}%", m.max_drawdown)?;
        writeln!(f, "  avg drawdown:        {:>10.2}%", m.avg_drawdown)?;
        writeln!(f, "  max duration (days): {:>10}", m.max_drawdown_duration)?;
        writeln!(f, "Trades")?;
        writeln!(f, "  total trades:        {:>10}", m.total_trades)?;
        writeln!(f, "  win rate:            {:>10.2}%", m.win_rate)?;
        writeln!(f, "  profit factor:       {:>10}", ratio(m.profit_factor))?;
        writeln!(f, "  avg win / loss:      {:>10.2} / {:.2}", m.avg_win, m.avg_loss)?;
        writeln!(f, "  max win / loss:      {:>10.2} / {:.2}", m.max_win, m.max_loss)?;
        writeln!(
            f,
            "  streaks (win/loss):  {:>10} / {}",
            m.max_consecutive_wins, m.max_consecutive_losses
        )?;
        writeln!(f, "  avg holding (days):  {:>10.2}", m.avg_holding_period)?;
        writeln!(f, "  expectancy:          {:>10.2}", m.expectancy)?;
        writeln!(f, "  pnl std dev:         {:>10.2}", m.pnl_std_dev)?;

        if !self.drawdowns.is_empty() {
            writeln!(f, "Drawdown episodes")?;
            for record in &self.drawdowns {
                let recovered = match (record.recovery_time, record.recovery_days) {
                    (Some(at), Some(days)) => {
                        format!("recovered {} ({} days)", at.date_naive(), days)
                    }
                    _ => "open".to_string(),
                };
                writeln!(
                    f,
                    "  {} -> {}  {:>7.2}%  {}",
                    record.start_time.date_naive(),
                    record.trough_time.date_naive(),
                    record.drawdown_pct,
                    recovered
                )?;
            }
        }

        if !self.monthly.is_empty() {
            writeln!(f, "Monthly returns")?;
            for month in &self.monthly {
                writeln!(
                    f,
                    "  {}-{:02}  {:>8.2}%  {} trades",
                    month.year, month.month, month.return_pct, month.trade_count
                )?;
            }
        }
        Ok(())
    }
}

pub fn format_metrics(output: &MetricsOutput) -> String {
    output.to_string()
}

fn run_metrics(data_dir: &Path, run: &str, config_path: Option<&Path>) -> Result<(), QuantError> {
    let config = config_path.map(load_config).transpose()?;
    if let Some(config) = &config {
        validate_metrics_config(config)?;
    }
    let data = CsvAdapter::new(data_dir.to_path_buf());
    let output = run_metrics_pipeline(&data, run, config.as_ref().map(|c| c as &dyn ConfigPort))?;
    print!("{}", output);
    Ok(())
}

// ---------------------------------------------------------------------------
// risk
// ---------------------------------------------------------------------------

pub fn run_risk_pipeline(
    data: &dyn DataPort,
    run: &str,
    settings: &RiskSettings,
    weights: &[f64],
) -> Result<RiskReport, QuantError> {
    let curve = data.fetch_equity_curve(run)?;
    if curve.is_empty() {
        return Err(QuantError::NoData {
            name: run.to_string(),
        });
    }
    info!(
        "risk report for {} over {} points using {} VaR",
        run,
        curve.len(),
        settings.var.method
    );
    Ok(RiskReport::compute(&curve, weights, settings))
}

struct RiskSummary<'a>(&'a RiskReport);

impl fmt::Display for RiskSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let var = &report.var;
        let dd = &report.drawdown;
        writeln!(f, "Portfolio value: {:.2}", report.portfolio_value)?;
        writeln!(
            f,
            "VaR ({}, {:.0}%, {}d): {:.2} ({:.2}%)",
            var.method,
            var.confidence_level * 100.0,
            var.holding_period,
            var.value,
            var.percentage
        )?;
        writeln!(
            f,
            "CVaR (historical):       {:.2} ({:.2}%)",
            report.cvar.cvar_value, report.cvar.cvar_percentage
        )?;
        writeln!(f, "Drawdown")?;
        writeln!(f, "  current:             {:>8.2}%", dd.current_drawdown)?;
        writeln!(f, "  max:                 {:>8.2}%", dd.max_drawdown)?;
        if let Some(at) = dd.max_drawdown_at {
            writeln!(f, "  max reached:         {}", at.date_naive())?;
        }
        writeln!(f, "  average:             {:>8.2}%", dd.avg_drawdown)?;
        writeln!(
            f,
            "  episodes:            {:>8} ({} significant)",
            dd.drawdown_count, dd.significant_drawdowns
        )?;
        writeln!(f, "  longest (bars):      {:>8}", dd.max_duration)?;
        if let Some(bars) = dd.estimated_recovery {
            writeln!(f, "  est. recovery (bars):{:>8}", bars)?;
        }
        writeln!(f, "Volatility")?;
        writeln!(f, "  daily:               {:>8.2}%", report.daily_volatility)?;
        writeln!(f, "  annualized:          {:>8.2}%", report.annualized_volatility)?;
        writeln!(f, "  downside:            {:>8.2}%", report.downside_volatility)?;
        writeln!(
            f,
            "  sharpe / sortino:    {:>8} / {}",
            ratio(report.sharpe_ratio),
            ratio(report.sortino_ratio)
        )?;
        writeln!(f, "Concentration (HHI):   {:>8.0}", report.hhi)?;
        writeln!(f, "Risk score: {} ({})", report.risk_score, report.risk_level)?;
        if report.breaches.is_empty() {
            writeln!(f, "Limits: all within bounds")?;
        } else {
            writeln!(f, "Limits breached:")?;
            for breach in &report.breaches {
                writeln!(f, "  {}", breach)?;
            }
        }
        Ok(())
    }
}

pub fn format_risk_report(report: &RiskReport) -> String {
    RiskSummary(report).to_string()
}

fn run_risk(
    data_dir: &Path,
    run: &str,
    config_path: Option<&Path>,
    method: Option<&str>,
    weights: Option<&str>,
) -> Result<(), QuantError> {
    let mut settings = match config_path {
        Some(path) => {
            let config = load_config(path)?;
            validate_risk_config(&config)?;
            build_risk_settings(&config)?
        }
        None => RiskSettings::default(),
    };
    if let Some(raw) = method {
        settings.var.method = parse_method(raw)?;
    }
    let weights = weights.map(parse_weights).transpose()?.unwrap_or_default();

    let data = CsvAdapter::new(data_dir.to_path_buf());
    let report = run_risk_pipeline(&data, run, &settings, &weights)?;
    for breach in &report.breaches {
        warn!("limit breached: {}", breach);
    }
    print!("{}", RiskSummary(&report));
    Ok(())
}

// ---------------------------------------------------------------------------
// size
// ---------------------------------------------------------------------------

struct RecommendationSummary<'a>(&'a PositionSizeRecommendation);

impl fmt::Display for RecommendationSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rec = self.0;
        writeln!(
            f,
            "Recommended: {:.2} ({:.2}% of portfolio)",
            rec.recommended_size, rec.recommended_pct
        )?;
        writeln!(
            f,
            "Max allowed: {:.2} ({:.2}% of portfolio)",
            rec.max_allowed_size, rec.max_allowed_pct
        )?;
        writeln!(f, "Risk level:  {}", rec.risk_level)?;
        writeln!(f, "Rationale:   {}", rec.rationale)
    }
}

pub fn format_recommendation(rec: &PositionSizeRecommendation) -> String {
    RecommendationSummary(rec).to_string()
}

fn run_size(params: &PositionSizeParams) -> Result<(), QuantError> {
    if !(0.0..=1.0).contains(&params.win_rate) {
        return Err(QuantError::ConfigInvalid {
            section: "cli".to_string(),
            key: "win_rate".to_string(),
            reason: "win_rate must be between 0 and 1".to_string(),
        });
    }
    let rec = recommend_position_size(params);
    print!("{}", RecommendationSummary(&rec));
    Ok(())
}
