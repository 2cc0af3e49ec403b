//! Daily summary building from trade records.
//!
//! Groups one year's records by ISO date into [`DailyTradeSummary`] values
//! and date-ordered trade lists.

use std::collections::BTreeMap;
use tradecal_core::{DailyTradeSummary, IsoDate, TradeDataForYear, TradeRecord, TradeSide};

/// A day that's currently being accumulated.
#[derive(Debug, Clone)]
struct DayInProgress {
    summary: DailyTradeSummary,
    trades: Vec<TradeRecord>,
}

impl DayInProgress {
    fn new(iso_date: &str) -> Self {
        Self {
            summary: DailyTradeSummary::empty(iso_date),
            trades: Vec::new(),
        }
    }

    fn add_trade(&mut self, record: &TradeRecord) {
        let summary = &mut self.summary;
        summary.trade_count += 1;
        summary.total_quantity += record.quantity;
        match record.trade_side() {
            TradeSide::Buy => summary.buy_count += 1,
            TradeSide::Sell => summary.sell_count += 1,
            TradeSide::Other => {}
        }
        summary.net_profit += record.net_profit;
        self.trades.push(record.clone());
    }

    fn finish(mut self) -> (DailyTradeSummary, Vec<TradeRecord>) {
        // Stable: trades with equal date-times keep input order.
        self.trades.sort_by(|a, b| a.iso_date_time.cmp(&b.iso_date_time));
        (self.summary, self.trades)
    }
}

/// Builder for per-day trade data of one calendar year.
pub struct DailySummaryBuilder {
    year: i32,
    days: BTreeMap<IsoDate, DayInProgress>,
}

impl DailySummaryBuilder {
    /// Create a builder that accepts only records dated in `year`.
    pub fn new(year: i32) -> Self {
        Self {
            year,
            days: BTreeMap::new(),
        }
    }

    /// Add a record. Returns false when it belongs to another year.
    pub fn add_trade(&mut self, record: &TradeRecord) -> bool {
        if !record.is_in_year(self.year) {
            return false;
        }
        self.days
            .entry(record.iso_date.clone())
            .or_insert_with(|| DayInProgress::new(&record.iso_date))
            .add_trade(record);
        true
    }

    /// Add multiple records.
    pub fn add_trades<'a>(&mut self, records: impl IntoIterator<Item = &'a TradeRecord>) {
        for record in records {
            self.add_trade(record);
        }
    }

    /// Number of dates with at least one trade so far.
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Finalize into summaries and sorted per-date trade lists.
    pub fn build(self) -> TradeDataForYear {
        let mut data = TradeDataForYear::default();
        for (iso_date, day) in self.days {
            let (summary, trades) = day.finish();
            data.summaries.insert(iso_date.clone(), summary);
            data.trades_by_date.insert(iso_date, trades);
        }
        data
    }
}

/// Summarize the records of one year.
pub fn summarize_year(records: &[TradeRecord], year: i32) -> TradeDataForYear {
    let mut builder = DailySummaryBuilder::new(year);
    builder.add_trades(records);
    builder.build()
}
