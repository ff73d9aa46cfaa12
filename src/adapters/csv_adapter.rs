//! CSV directory data adapter.
//!
//! Layout under the base directory:
//! - `{symbol}.csv`: `timestamp,open,high,low,close,volume`
//! - `{run}_equity.csv`: `timestamp,equity,cash,position_value`
//! - `{run}_trades.csv`: `symbol,side,entry_time,entry_price,exit_time,exit_price,quantity,fees,holding_bars`
//!
//! Timestamps are RFC 3339 or plain `YYYY-MM-DD` dates (read as midnight UTC).

use crate::domain::candle::Candle;
use crate::domain::equity::{EquityPoint, annotate_drawdowns};
use crate::domain::error::QuantError;
use crate::domain::trade::{Execution, RoundTripTrade, TradeSide};
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const EQUITY_SUFFIX: &str = "_equity.csv";
const TRADES_SUFFIX: &str = "_trades.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn read_file(&self, file_name: &str) -> Result<(PathBuf, String), QuantError> {
        let path = self.base_path.join(file_name);
        match fs::read_to_string(&path) {
            Ok(content) => Ok((path, content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(QuantError::NoData {
                name: path.display().to_string(),
            }),
            Err(e) => Err(QuantError::Io(e)),
        }
    }
}

fn data_error(path: &Path, reason: impl Into<String>) -> QuantError {
    QuantError::Data {
        source_name: path.display().to_string(),
        reason: reason.into(),
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    path: &Path,
) -> Result<&'r str, QuantError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| data_error(path, format!("missing {} column", name)))
}

fn parse_field<T>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    path: &Path,
) -> Result<T, QuantError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    field(record, index, name, path)?
        .parse()
        .map_err(|e| data_error(path, format!("invalid {} value: {}", name, e)))
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_time_field(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    path: &Path,
) -> Result<DateTime<Utc>, QuantError> {
    let raw = field(record, index, name, path)?;
    parse_timestamp(raw).ok_or_else(|| data_error(path, format!("invalid {} format: {}", name, raw)))
}

fn parse_side(raw: &str, path: &Path) -> Result<TradeSide, QuantError> {
    match raw.to_lowercase().as_str() {
        "long" | "buy" => Ok(TradeSide::Long),
        "short" | "sell" => Ok(TradeSide::Short),
        other => Err(data_error(path, format!("invalid side value: {}", other))),
    }
}

fn records(
    content: &str,
    path: &Path,
) -> impl Iterator<Item = Result<csv::StringRecord, QuantError>> {
    let path = path.to_path_buf();
    csv::Reader::from_reader(content.as_bytes())
        .into_records()
        .map(move |r| r.map_err(|e| data_error(&path, format!("CSV parse error: {}", e))))
}

impl DataPort for CsvAdapter {
    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, QuantError> {
        let (path, content) = self.read_file(&format!("{}.csv", symbol))?;
        let mut candles = Vec::new();

        for record in records(&content, &path) {
            let record = record?;
            candles.push(Candle {
                timestamp: parse_time_field(&record, 0, "timestamp", &path)?,
                open: parse_field(&record, 1, "open", &path)?,
                high: parse_field(&record, 2, "high", &path)?,
                low: parse_field(&record, 3, "low", &path)?,
                close: parse_field(&record, 4, "close", &path)?,
                volume: parse_field(&record, 5, "volume", &path)?,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }

    fn fetch_equity_curve(&self, run: &str) -> Result<Vec<EquityPoint>, QuantError> {
        let (path, content) = self.read_file(&format!("{}{}", run, EQUITY_SUFFIX))?;
        let mut curve = Vec::new();

        for record in records(&content, &path) {
            let record = record?;
            curve.push(EquityPoint {
                timestamp: parse_time_field(&record, 0, "timestamp", &path)?,
                equity: parse_field(&record, 1, "equity", &path)?,
                cash: parse_field(&record, 2, "cash", &path)?,
                position_value: parse_field(&record, 3, "position_value", &path)?,
                drawdown: 0.0,
            });
        }

        curve.sort_by_key(|p| p.timestamp);
        annotate_drawdowns(&mut curve);
        Ok(curve)
    }

    fn fetch_trades(&self, run: &str) -> Result<Vec<RoundTripTrade>, QuantError> {
        let (path, content) = self.read_file(&format!("{}{}", run, TRADES_SUFFIX))?;
        let mut trades = Vec::new();

        for record in records(&content, &path) {
            let record = record?;
            let symbol = field(&record, 0, "symbol", &path)?;
            let side = parse_side(field(&record, 1, "side", &path)?, &path)?;
            let quantity: f64 = parse_field(&record, 6, "quantity", &path)?;
            let fees: f64 = parse_field(&record, 7, "fees", &path)?;
            let holding_bars: usize = parse_field(&record, 8, "holding_bars", &path)?;

            let entry = Execution {
                price: parse_field(&record, 3, "entry_price", &path)?,
                quantity,
                fee: fees,
                executed_at: parse_time_field(&record, 2, "entry_time", &path)?,
            };
            let exit = Execution {
                price: parse_field(&record, 5, "exit_price", &path)?,
                quantity,
                fee: 0.0,
                executed_at: parse_time_field(&record, 4, "exit_time", &path)?,
            };
            trades.push(RoundTripTrade::from_executions(
                symbol,
                side,
                entry,
                exit,
                holding_bars,
            ));
        }

        trades.sort_by_key(RoundTripTrade::exited_at);
        Ok(trades)
    }

    fn list_symbols(&self) -> Result<Vec<String>, QuantError> {
        let mut symbols = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(EQUITY_SUFFIX) || name.ends_with(TRADES_SUFFIX) {
                continue;
            }
            if let Some(symbol) = name.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
