use clap::Parser;
use stockdigest_core::config::{parse_tickers, Settings};
use stockdigest_core::ingest::provider::YahooChartProvider;
use stockdigest_core::mail::SmtpReportSender;
use stockdigest_core::pipeline::{PassOutcome, ReportPipeline};
use stockdigest_core::report::ReportRenderer;
use stockdigest_core::schedule::{run_schedule, Scheduler};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "stockdigest_worker")]
struct Args {
    /// Keep running and generate a report every SCHEDULE_INTERVAL_DAYS.
    #[arg(long)]
    schedule: bool,

    /// With --schedule, run one pass at startup instead of waiting a full interval first.
    #[arg(long, requires = "schedule")]
    run_now: bool,

    /// Fetch and render the report, but do not email it.
    #[arg(long)]
    dry_run: bool,

    /// Comma-separated tickers, overriding REPORT_TICKERS.
    #[arg(long)]
    tickers: Option<String>,

    /// Lookback window in calendar days, overriding REPORT_DAYS.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    days: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let args = Args::parse();

    let tickers = match args.tickers.as_deref() {
        Some(s) => parse_tickers(s),
        None => settings.tickers.clone(),
    };
    anyhow::ensure!(!tickers.is_empty(), "--tickers must name at least one ticker");
    let days = args.days.unwrap_or(settings.days);

    let provider = YahooChartProvider::from_settings(&settings)?;
    let sender = (!args.dry_run).then(|| SmtpReportSender::new(settings.mail.clone()));
    let renderer = ReportRenderer::new(&settings.reports_dir);

    tracing::info!(
        ?tickers,
        days,
        reports_dir = %settings.reports_dir.display(),
        mail_provider = ?settings.mail.provider,
        dry_run = args.dry_run,
        schedule = args.schedule,
        "stock report worker starting"
    );

    let mut pipeline = ReportPipeline::new(provider, sender, renderer, tickers, days);

    if !args.schedule {
        let outcome = pipeline.run_pass().await;
        report_outcome(&outcome);
        return Ok(());
    }

    let scheduler = Scheduler::new(
        settings.schedule_interval,
        settings.schedule_poll,
        tokio::time::Instant::now(),
        args.run_now,
    );
    tracing::info!(
        interval_secs = settings.schedule_interval.as_secs(),
        poll_secs = settings.schedule_poll.as_secs(),
        run_now = args.run_now,
        "scheduler started"
    );

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c; running until killed");
            std::future::pending::<()>().await;
        }
    };
    run_schedule(scheduler, &mut pipeline, report_outcome, shutdown).await;

    Ok(())
}

fn report_outcome(outcome: &PassOutcome) {
    if let Some(err) = outcome.error() {
        sentry_anyhow::capture_anyhow(err);
    }

    match outcome {
        PassOutcome::NoData => tracing::warn!("run finished without data; no report produced"),
        PassOutcome::RenderFailed(_) => tracing::error!("run finished without a report"),
        PassOutcome::Rendered(path) => {
            tracing::info!(path = %path.display(), "run finished; report rendered (dry run)")
        }
        PassOutcome::SendFailed { path, .. } => {
            tracing::error!(path = %path.display(), "run finished; report kept on disk but not delivered")
        }
        PassOutcome::Delivered(path) => {
            tracing::info!(path = %path.display(), "run finished; report delivered")
        }
    }
}

/// Log lines only become breadcrumbs; Sentry events come from `capture_anyhow` in
/// `report_outcome`, so a failed stage is reported once with its full error chain.
fn sentry_event_filter(md: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    if keeps_breadcrumb(md.level()) {
        sentry_tracing::EventFilter::Breadcrumb
    } else {
        sentry_tracing::EventFilter::Ignore
    }
}

fn keeps_breadcrumb(level: &tracing::Level) -> bool {
    *level <= tracing::Level::INFO
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
