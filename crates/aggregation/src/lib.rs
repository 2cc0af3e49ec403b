//! Daily aggregation of trade records for the trade calendar system.
//!
//! This crate handles:
//! - Grouping records by calendar date into daily summaries
//! - Date-ordered per-day trade lists
//! - Caching the loaded record set behind a replaceable loader

pub mod summary;
pub mod aggregator;

pub use summary::{summarize_year, DailySummaryBuilder};
pub use aggregator::TradeAggregator;
