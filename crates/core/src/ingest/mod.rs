pub mod error;
pub mod provider;
pub mod types;

use crate::domain::bars::TimeSeries;
use provider::MarketDataProvider;

/// Fetches every ticker in order, one at a time, and keeps only non-empty series.
///
/// Provider errors are logged and treated like an empty series so one bad ticker never
/// stops the rest of the run.
pub async fn fetch_all<P>(provider: &P, tickers: &[String], days: u32) -> Vec<TimeSeries>
where
    P: MarketDataProvider + ?Sized,
{
    let mut out = Vec::with_capacity(tickers.len());
    let mut failures: usize = 0;

    for ticker in tickers {
        match provider.fetch(ticker, days).await {
            Ok(series) if series.is_empty() => {
                tracing::warn!(%ticker, days, "no price data in window; omitting ticker");
            }
            Ok(series) => {
                tracing::info!(%ticker, bars = series.len(), "fetched price history");
                out.push(series);
            }
            Err(err) => {
                failures += 1;
                tracing::warn!(%ticker, error = %format!("{err:#}"), "price fetch failed; omitting ticker");
            }
        }
    }

    tracing::info!(
        provider = provider.provider_name(),
        requested = tickers.len(),
        with_data = out.len(),
        failures,
        "fetch stage complete"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bars::PriceBar;
    use chrono::NaiveDate;

    struct StubProvider;

    #[async_trait::async_trait]
    impl MarketDataProvider for StubProvider {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch(&self, ticker: &str, _days: u32) -> anyhow::Result<TimeSeries> {
            match ticker {
                "BOOM" => anyhow::bail!("network unreachable"),
                "ZZZZ_INVALID" => Ok(TimeSeries::empty(ticker)),
                _ => Ok(TimeSeries::new(
                    ticker,
                    vec![PriceBar {
                        date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                        open: 1.0,
                        close: 2.0,
                        high: 3.0,
                        low: 0.5,
                        volume: 10,
                    }],
                )),
            }
        }
    }

    #[tokio::test]
    async fn drops_empty_and_failed_tickers_and_keeps_order() {
        let tickers: Vec<String> = ["MSFT", "ZZZZ_INVALID", "BOOM", "AAPL"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = fetch_all(&StubProvider, &tickers, 10).await;
        let names: Vec<&str> = out.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(names, vec!["MSFT", "AAPL"]);
    }
}
