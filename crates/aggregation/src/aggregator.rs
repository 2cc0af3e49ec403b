//! Cached trade aggregation.
//!
//! The aggregator owns the active loader and the full record list it
//! produced. Per-year data is recomputed from the cached list on every
//! request; the list itself is reloaded only after the loader is replaced
//! or the cache is invalidated.

use crate::summary::summarize_year;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use tradecal_core::{
    DailyTradeSummary, IsoDate, Result, SourceConfig, TradeDataForYear, TradeRecord,
};
use tradecal_ingestion::{FileCsvLoader, TradeCsvLoader};

/// Loader, cached records and the one-shot error flag, guarded together.
#[derive(Default)]
struct CacheState {
    loader: Option<Arc<dyn TradeCsvLoader>>,
    records: Option<Arc<Vec<TradeRecord>>>,
    error_logged: bool,
}

/// Aggregates trade records into per-year calendar data.
pub struct TradeAggregator {
    /// Source used to build the default file loader.
    source: SourceConfig,
    state: Mutex<CacheState>,
}

impl TradeAggregator {
    /// Create an aggregator that lazily loads from the configured CSV file.
    pub fn new(source: SourceConfig) -> Self {
        Self {
            source,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Create an aggregator with an explicit loader.
    pub fn with_loader(source: SourceConfig, loader: Arc<dyn TradeCsvLoader>) -> Self {
        let aggregator = Self::new(source);
        aggregator.set_loader(Some(loader));
        aggregator
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the active loader. `None` reverts to the default file loader.
    ///
    /// Clears the cached records and re-arms load-failure logging.
    pub fn set_loader(&self, loader: Option<Arc<dyn TradeCsvLoader>>) {
        let mut state = self.lock();
        state.loader = loader;
        state.records = None;
        state.error_logged = false;
    }

    /// Drop the cached records so the next request reloads.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.records = None;
        state.error_logged = false;
    }

    /// All cached records, loading them on first use.
    ///
    /// Load failures are logged once and cached as an empty list. Only
    /// configuration errors are returned, and they are never cached.
    pub fn records(&self) -> Result<Arc<Vec<TradeRecord>>> {
        let mut state = self.lock();
        if let Some(records) = &state.records {
            return Ok(Arc::clone(records));
        }

        let loader = match state.loader.clone() {
            Some(loader) => loader,
            None => {
                let loader: Arc<dyn TradeCsvLoader> = Arc::new(FileCsvLoader::new(&self.source)?);
                state.loader = Some(Arc::clone(&loader));
                loader
            }
        };

        let records = match loader.load_records() {
            Ok(records) => {
                debug!(loader = loader.id(), records = records.len(), "loaded trade records");
                records
            }
            Err(err) if err.is_config() => return Err(err),
            Err(err) => {
                if !state.error_logged {
                    state.error_logged = true;
                    warn!(loader = loader.id(), error = %err, "failed to load trade CSV");
                }
                Vec::new()
            }
        };

        let records = Arc::new(records);
        state.records = Some(Arc::clone(&records));
        Ok(records)
    }

    /// Daily summaries and date-ordered trades for one year.
    pub fn trade_data_for_year(&self, year: i32) -> Result<TradeDataForYear> {
        let records = self.records()?;
        Ok(summarize_year(&records, year))
    }

    /// Daily summaries for one year.
    pub fn daily_summaries_for_year(
        &self,
        year: i32,
    ) -> Result<BTreeMap<IsoDate, DailyTradeSummary>> {
        Ok(self.trade_data_for_year(year)?.summaries)
    }

    #[cfg(test)]
    fn error_logged(&self) -> bool {
        self.lock().error_logged
    }
}
