//! Core data types for the trade calendar system.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Calendar date string in `YYYY-MM-DD` form.
pub type IsoDate = String;

/// Side label used by the broker exports for a buy.
pub const BUY_LABEL: &str = "買";
/// Side label used by the broker exports for a sell.
pub const SELL_LABEL: &str = "売";

/// Trade direction inferred from a record's side label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
    /// Label is neither buy nor sell (blank, or a format we do not know).
    Other,
}

impl TradeSide {
    /// Classify a raw side label.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            BUY_LABEL => TradeSide::Buy,
            SELL_LABEL => TradeSide::Sell,
            _ => TradeSide::Other,
        }
    }
}

/// One normalized trade line from a broker export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    /// Trade date (`YYYY-MM-DD`).
    pub iso_date: IsoDate,
    /// Time of day (`HH:MM`).
    pub iso_time: String,
    /// Combined date-time (`YYYY-MM-DDTHH:MM:SS`).
    pub iso_date_time: String,
    pub symbol: String,
    /// Contract month label (empty for formats without one).
    pub contract_month: String,
    /// Raw side label as exported.
    pub side: String,
    /// Raw action label (open/close etc.) as exported.
    pub action: String,
    /// Quantity; may be fractional for CFD exports.
    pub quantity: f64,
    pub price: f64,
    pub fee: f64,
    pub gross_profit: f64,
    pub net_profit: f64,
}

impl TradeRecord {
    /// Classified side of this trade.
    #[inline]
    pub fn trade_side(&self) -> TradeSide {
        TradeSide::from_label(&self.side)
    }

    /// Whether the trade falls in the given calendar year.
    #[inline]
    pub fn is_in_year(&self, year: i32) -> bool {
        self.iso_date.starts_with(&format!("{:04}-", year))
    }
}

/// Per-day aggregate of trade activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTradeSummary {
    pub iso_date: IsoDate,
    /// All trades on the date, including those with neither side.
    pub trade_count: u32,
    pub buy_count: u32,
    pub sell_count: u32,
    pub total_quantity: f64,
    pub net_profit: f64,
}

impl DailyTradeSummary {
    /// Create an empty summary for a date.
    pub fn empty(iso_date: impl Into<IsoDate>) -> Self {
        Self {
            iso_date: iso_date.into(),
            trade_count: 0,
            buy_count: 0,
            sell_count: 0,
            total_quantity: 0.0,
            net_profit: 0.0,
        }
    }

    /// Trades counted as neither buy nor sell.
    pub fn other_count(&self) -> u32 {
        self.trade_count
            .saturating_sub(self.buy_count)
            .saturating_sub(self.sell_count)
    }
}

/// Trade data for one calendar year, keyed by ISO date.
///
/// Only dates with at least one trade are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDataForYear {
    pub summaries: BTreeMap<IsoDate, DailyTradeSummary>,
    /// Trades per date, ordered by combined date-time (stable).
    pub trades_by_date: BTreeMap<IsoDate, Vec<TradeRecord>>,
}

impl TradeDataForYear {
    /// Whether the year has no trades at all.
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Total number of trades across all dates.
    pub fn trade_count(&self) -> usize {
        self.trades_by_date.values().map(Vec::len).sum()
    }
}
