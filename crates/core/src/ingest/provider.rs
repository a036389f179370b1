use crate::config::Settings;
use crate::domain::bars::{PriceBar, TimeSeries};
use crate::ingest::error::ProviderError;
use crate::ingest::types::{ChartQuote, ChartResponse};
use crate::time::window::FetchWindow;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{StatusCode, Url};
use std::time::Duration;

const PROVIDER_NAME: &str = "yahoo_chart";
const CHART_PATH: [&str; 3] = ["v8", "finance", "chart"];
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily bars for `ticker` over the `days`-day window ending today.
    ///
    /// An empty series means the provider had nothing for the window; `Err` means the call
    /// itself failed.
    async fn fetch(&self, ticker: &str, days: u32) -> Result<TimeSeries>;
}

#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: Url,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.data_provider_base_url, settings.data_provider_timeout)
    }

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build market data http client")?;

        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid DATA_PROVIDER_BASE_URL {base_url:?}"))?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "DATA_PROVIDER_BASE_URL {base_url} cannot carry a path"
        );

        Ok(Self { http, base_url })
    }

    /// Chart endpoint for `ticker`, with the symbol escaped as a single path segment.
    fn url(&self, ticker: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("base url {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(CHART_PATH)
            .push(ticker);
        Ok(url)
    }

    pub async fn fetch_window(&self, ticker: &str, window: FetchWindow) -> Result<TimeSeries> {
        let res = self
            .http
            .get(self.url(ticker)?)
            .query(&[
                ("period1", window.period1().to_string()),
                ("period2", window.period2(Utc::now()).to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("market data request failed for {ticker}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;

        // Yahoo reports unknown symbols as a 404 carrying a chart error body; that error code
        // is more useful than the status. Any other non-2xx is a failure even if it parses.
        let parsed = serde_json::from_str::<ChartResponse>(&text);
        match parsed {
            Ok(chart) if chart.chart.error.is_some() || status.is_success() => {
                parse_chart(ticker, chart, window)
            }
            Err(err) if status.is_success() => {
                Err(err).context("failed to parse market data response into ChartResponse")
            }
            Ok(_) | Err(_) => Err(status_error(ticker, status, &text).into()),
        }
    }
}

fn status_error(ticker: &str, status: StatusCode, body: &str) -> ProviderError {
    ProviderError {
        provider: PROVIDER_NAME,
        ticker: ticker.to_string(),
        code: status.as_u16().to_string(),
        detail: truncate(body, 200),
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch(&self, ticker: &str, days: u32) -> Result<TimeSeries> {
        let window = FetchWindow::ending_today(days)?;
        self.fetch_window(ticker, window).await
    }
}

/// Turns a chart payload into a series restricted to `window`.
pub fn parse_chart(ticker: &str, resp: ChartResponse, window: FetchWindow) -> Result<TimeSeries> {
    if let Some(err) = resp.chart.error {
        return Err(ProviderError {
            provider: PROVIDER_NAME,
            ticker: ticker.to_string(),
            code: err.code,
            detail: err.description.unwrap_or_default(),
        }
        .into());
    }

    let Some(data) = resp.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(TimeSeries::empty(ticker));
    };
    let Some(timestamps) = data.timestamp else {
        return Ok(TimeSeries::empty(ticker));
    };

    let offset_secs = data.meta.as_ref().and_then(|m| m.gmtoffset).unwrap_or(0);
    let offset = i32::try_from(offset_secs)
        .ok()
        .and_then(FixedOffset::east_opt)
        .with_context(|| format!("invalid exchange gmtoffset {offset_secs} for {ticker}"))?;

    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = exchange_date(ts, offset)
            .with_context(|| format!("invalid bar timestamp {ts} for {ticker}"))?;
        if !window.contains(date) {
            continue;
        }
        if let Some(bar) = bar_at(&quote, i, date) {
            bars.push(bar);
        }
    }

    Ok(TimeSeries::new(ticker, bars))
}

fn exchange_date(ts: i64, offset: FixedOffset) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(ts, 0).map(|dt| dt.with_timezone(&offset).date_naive())
}

fn bar_at(quote: &ChartQuote, i: usize, date: NaiveDate) -> Option<PriceBar> {
    let at = |v: &[Option<f64>]| v.get(i).copied().flatten().filter(|x| x.is_finite());

    // Non-trading days come back as all-null rows; partial rows are unusable for the table.
    let open = at(&quote.open)?;
    let close = at(&quote.close)?;
    let high = at(&quote.high)?;
    let low = at(&quote.low)?;
    let volume = at(&quote.volume).map(|v| v.max(0.0).round() as u64).unwrap_or(0);

    Some(PriceBar {
        date,
        open,
        close,
        high,
        low,
        volume,
    })
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
