//! Loading of price series and backtest results.

use crate::domain::candle::Candle;
use crate::domain::equity::EquityPoint;
use crate::domain::error::QuantError;
use crate::domain::trade::RoundTripTrade;

pub trait DataPort {
    /// Candles for one symbol, sorted by timestamp.
    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, QuantError>;

    /// Equity curve of one backtest run, sorted by timestamp, with drawdowns filled in.
    fn fetch_equity_curve(&self, run: &str) -> Result<Vec<EquityPoint>, QuantError>;

    /// Closed trades of one backtest run.
    fn fetch_trades(&self, run: &str) -> Result<Vec<RoundTripTrade>, QuantError>;

    fn list_symbols(&self) -> Result<Vec<String>, QuantError>;
}
