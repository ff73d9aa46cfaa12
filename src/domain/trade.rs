//! Closed round-trip trades as produced by an external execution loop.

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TradeSide {
    Long,
    Short,
}

/// One fill: the entry or the exit leg of a round trip.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Execution {
    pub price: f64,
    pub quantity: f64,
    pub fee: f64,
    pub executed_at: DateTime<Utc>,
}

impl Execution {
    pub fn value(&self) -> f64 {
        self.price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundTripTrade {
    pub symbol: String,
    pub side: TradeSide,
    pub entry: Execution,
    pub exit: Execution,
    pub quantity: f64,
    pub total_fees: f64,
    pub net_pnl: f64,
    pub net_pnl_pct: f64,
    pub holding_period: TimeDelta,
    pub holding_bars: usize,
}

impl RoundTripTrade {
    /// Build a round trip from its two legs, deriving fees, P&L and holding time.
    pub fn from_executions(
        symbol: impl Into<String>,
        side: TradeSide,
        entry: Execution,
        exit: Execution,
        holding_bars: usize,
    ) -> Self {
        let quantity = entry.quantity;
        let total_fees = entry.fee + exit.fee;
        let gross = match side {
            TradeSide::Long => (exit.price - entry.price) * quantity,
            TradeSide::Short => (entry.price - exit.price) * quantity,
        };
        let net_pnl = gross - total_fees;
        let cost = entry.value();
        let net_pnl_pct = if cost > 0.0 {
            net_pnl / cost * 100.0
        } else {
            0.0
        };
        let holding_period = exit.executed_at - entry.executed_at;

        Self {
            symbol: symbol.into(),
            side,
            entry,
            exit,
            quantity,
            total_fees,
            net_pnl,
            net_pnl_pct,
            holding_period,
            holding_bars,
        }
    }

    pub fn entry_price(&self) -> f64 {
        self.entry.price
    }

    pub fn exit_price(&self) -> f64 {
        self.exit.price
    }

    pub fn exited_at(&self) -> DateTime<Utc> {
        self.exit.executed_at
    }

    /// Holding period in fractional days.
    pub fn holding_days(&self) -> f64 {
        self.holding_period.num_milliseconds() as f64 / 86_400_000.0
    }
}
