use crate::ingest::provider::MarketDataProvider;
use crate::mail::ReportSender;
use crate::pipeline::{PassOutcome, ReportPipeline};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
}

/// Fixed-interval trigger polled on a coarse timer. Nothing is persisted; a restart waits a
/// full interval again.
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    poll: Duration,
    state: State,
    next_due: Instant,
}

impl Scheduler {
    pub fn new(interval: Duration, poll: Duration, start: Instant, run_immediately: bool) -> Self {
        let next_due = if run_immediately { start } else { start + interval };
        Self {
            interval,
            poll,
            state: State::Idle,
            next_due,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll
    }

    /// Idle -> Running once the due time has passed. Returns true when a pass should start.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.state == State::Idle && now >= self.next_due {
            self.state = State::Running;
            return true;
        }
        false
    }

    /// Running -> Idle, whatever the pass ended with. The next pass is one interval from now.
    pub fn finish(&mut self, now: Instant) {
        if self.state == State::Running {
            self.state = State::Idle;
            self.next_due = now + self.interval;
        }
    }
}

/// Runs pipeline passes on `scheduler` until `shutdown` resolves. Shutdown is only observed
/// while idle; a pass in progress always runs to completion. Returns the number of passes.
pub async fn run_schedule<P, S, F, Fut>(
    mut scheduler: Scheduler,
    pipeline: &mut ReportPipeline<P, S>,
    mut on_outcome: F,
    shutdown: Fut,
) -> u64
where
    P: MarketDataProvider,
    S: ReportSender,
    F: FnMut(&PassOutcome),
    Fut: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut passes: u64 = 0;

    loop {
        if scheduler.poll(Instant::now()) {
            passes += 1;
            tracing::info!(pass = passes, "scheduled run starting");
            let outcome = pipeline.run_pass().await;
            on_outcome(&outcome);
            scheduler.finish(Instant::now());
            tracing::info!(
                pass = passes,
                next_in_secs = scheduler.next_due().saturating_duration_since(Instant::now()).as_secs(),
                "scheduled run finished"
            );
            continue;
        }

        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!(passes, "scheduler stopping");
                return passes;
            }
            _ = tokio::time::sleep(scheduler.poll_interval()) => {}
        }
    }
}
