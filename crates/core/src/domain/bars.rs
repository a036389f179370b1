use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day's OHLCV observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
}

/// Daily bars for one ticker, ascending by date with at most one bar per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub ticker: String,
    bars: Vec<PriceBar>,
}

impl TimeSeries {
    pub fn new(ticker: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        // Keep the latest observation when the provider repeats a date (intraday bar for today).
        bars.reverse();
        bars.dedup_by_key(|b| b.date);
        bars.reverse();

        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn empty(ticker: impl Into<String>) -> Self {
        Self::new(ticker, Vec::new())
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
