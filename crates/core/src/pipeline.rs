use crate::ingest::fetch_all;
use crate::ingest::provider::MarketDataProvider;
use crate::mail::ReportSender;
use crate::report::ReportRenderer;
use std::path::PathBuf;

/// What one fetch -> render -> send pass ended with. Nothing inside a pass is fatal.
#[derive(Debug)]
pub enum PassOutcome {
    /// No ticker produced data; nothing was rendered or sent.
    NoData,
    RenderFailed(anyhow::Error),
    /// Rendered but sending is disabled for this pipeline.
    Rendered(PathBuf),
    SendFailed { path: PathBuf, error: anyhow::Error },
    Delivered(PathBuf),
}

impl PassOutcome {
    pub fn report_path(&self) -> Option<&PathBuf> {
        match self {
            PassOutcome::Rendered(p) | PassOutcome::Delivered(p) => Some(p),
            PassOutcome::SendFailed { path, .. } => Some(path),
            PassOutcome::NoData | PassOutcome::RenderFailed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            PassOutcome::RenderFailed(error) | PassOutcome::SendFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub struct ReportPipeline<P, S> {
    provider: P,
    sender: Option<S>,
    renderer: ReportRenderer,
    tickers: Vec<String>,
    days: u32,
}

impl<P, S> ReportPipeline<P, S>
where
    P: MarketDataProvider,
    S: ReportSender,
{
    /// `sender = None` renders without sending (dry run).
    pub fn new(
        provider: P,
        sender: Option<S>,
        renderer: ReportRenderer,
        tickers: Vec<String>,
        days: u32,
    ) -> Self {
        Self {
            provider,
            sender,
            renderer,
            tickers,
            days,
        }
    }

    pub async fn run_pass(&mut self) -> PassOutcome {
        tracing::info!(tickers = self.tickers.len(), days = self.days, "fetching stock data");
        let series = fetch_all(&self.provider, &self.tickers, self.days).await;

        // Empty runs stop here rather than mailing a title-only report.
        if series.is_empty() {
            tracing::warn!("no data available for any ticker; skipping report");
            return PassOutcome::NoData;
        }

        let path = match self.renderer.render(&series) {
            Ok(path) => path,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "report generation failed; not sending");
                return PassOutcome::RenderFailed(err);
            }
        };

        let Some(sender) = &self.sender else {
            tracing::info!(path = %path.display(), "dry run; report not sent");
            return PassOutcome::Rendered(path);
        };

        match sender.send(&path).await {
            Ok(()) => PassOutcome::Delivered(path),
            Err(error) => {
                tracing::error!(path = %path.display(), error = %format!("{error:#}"), "failed to send report");
                PassOutcome::SendFailed { path, error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bars::{PriceBar, TimeSeries};
    use chrono::NaiveDate;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    struct FixedProvider;

    #[async_trait::async_trait]
    impl MarketDataProvider for FixedProvider {
        fn provider_name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self, ticker: &str, days: u32) -> anyhow::Result<TimeSeries> {
            match ticker {
                "ZZZZ_INVALID" => Ok(TimeSeries::empty(ticker)),
                "DOWN" => anyhow::bail!("rate limited"),
                _ => {
                    let bars = (1..=days.min(7))
                        .map(|d| PriceBar {
                            date: NaiveDate::from_ymd_opt(2026, 3, d).unwrap(),
                            open: 100.0,
                            close: 101.0,
                            high: 102.0,
                            low: 99.0,
                            volume: 1_000,
                        })
                        .collect();
                    Ok(TimeSeries::new(ticker, bars))
                }
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSender {
        sent: Arc<Mutex<Vec<PathBuf>>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl ReportSender for RecordingSender {
        async fn send(&self, path: &Path) -> anyhow::Result<()> {
            anyhow::ensure!(path.exists(), "report missing at send time");
            self.sent.lock().unwrap().push(path.to_path_buf());
            anyhow::ensure!(!self.fail, "535 authentication failed");
            Ok(())
        }
    }

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn delivers_report_built_from_surviving_tickers() {
        let tmp = tempfile::tempdir().unwrap();
        let sender = RecordingSender::default();
        let mut pipeline = ReportPipeline::new(
            FixedProvider,
            Some(sender.clone()),
            ReportRenderer::new(tmp.path()),
            tickers(&["AAPL", "ZZZZ_INVALID", "DOWN", "MSFT"]),
            10,
        );

        let path = match pipeline.run_pass().await {
            PassOutcome::Delivered(path) => path,
            other => panic!("expected delivery, got {other:?}"),
        };
        assert!(path.exists());
        assert_eq!(*sender.sent.lock().unwrap(), vec![path]);
    }

    #[tokio::test]
    async fn no_data_short_circuits_before_rendering() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("reports");
        let sender = RecordingSender::default();
        let mut pipeline = ReportPipeline::new(
            FixedProvider,
            Some(sender.clone()),
            ReportRenderer::new(&dir),
            tickers(&["ZZZZ_INVALID", "DOWN"]),
            10,
        );

        assert!(matches!(pipeline.run_pass().await, PassOutcome::NoData));
        assert!(!dir.exists());
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_render_never_attempts_send() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("reports");
        std::fs::write(&blocker, b"file in the way").unwrap();
        let sender = RecordingSender::default();
        let mut pipeline = ReportPipeline::new(
            FixedProvider,
            Some(sender.clone()),
            ReportRenderer::new(&blocker),
            tickers(&["AAPL"]),
            10,
        );

        let outcome = pipeline.run_pass().await;
        assert!(matches!(outcome, PassOutcome::RenderFailed(_)));
        assert!(outcome.error().is_some());
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_failure_is_reported_and_keeps_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let sender = RecordingSender {
            fail: true,
            ..Default::default()
        };
        let mut pipeline = ReportPipeline::new(
            FixedProvider,
            Some(sender),
            ReportRenderer::new(tmp.path()),
            tickers(&["AAPL"]),
            10,
        );

        let outcome = pipeline.run_pass().await;
        let path = outcome.report_path().cloned().unwrap();
        assert!(matches!(outcome, PassOutcome::SendFailed { .. }));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn dry_run_renders_without_sending() {
        let tmp = tempfile::tempdir().unwrap();
        let mut pipeline: ReportPipeline<_, RecordingSender> = ReportPipeline::new(
            FixedProvider,
            None,
            ReportRenderer::new(tmp.path()),
            tickers(&["AAPL"]),
            10,
        );

        let outcome = pipeline.run_pass().await;
        assert!(matches!(outcome, PassOutcome::Rendered(ref p) if p.exists()));
    }

    #[tokio::test]
    async fn consecutive_passes_produce_increasing_file_names() {
        let tmp = tempfile::tempdir().unwrap();
        let mut pipeline: ReportPipeline<_, RecordingSender> = ReportPipeline::new(
            FixedProvider,
            None,
            ReportRenderer::new(tmp.path()),
            tickers(&["AAPL"]),
            10,
        );

        let a = pipeline.run_pass().await.report_path().cloned().unwrap();
        let b = pipeline.run_pass().await.report_path().cloned().unwrap();
        assert!(b.file_name() > a.file_name());
    }
}
