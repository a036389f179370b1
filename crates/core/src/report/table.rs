use crate::domain::bars::{PriceBar, TimeSeries};

pub const HEADERS: [&str; 6] = ["Date", "Open", "Close", "High", "Low", "Volume"];
pub const COLUMN_WIDTHS_MM: [f32; 6] = [35.0, 30.0, 30.0, 30.0, 30.0, 35.0];

pub type Row = [String; 6];

/// One ticker's section: the heading text plus one formatted row per bar.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerTable {
    pub ticker: String,
    pub rows: Vec<Row>,
}

impl TickerTable {
    pub fn from_series(series: &TimeSeries) -> Self {
        Self {
            ticker: series.ticker.clone(),
            rows: series.bars().iter().map(format_row).collect(),
        }
    }

    pub fn heading(&self) -> String {
        format!("Stock: {}", self.ticker)
    }
}

pub fn format_row(bar: &PriceBar) -> Row {
    [
        bar.date.format("%Y-%m-%d").to_string(),
        format!("{:.2}", bar.open),
        format!("{:.2}", bar.close),
        format!("{:.2}", bar.high),
        format!("{:.2}", bar.low),
        bar.volume.to_string(),
    ]
}
