//! Async tick driver
//!
//! Feeds a running [`TransmissionScheduler`] from a tokio interval. The first
//! tick fires one full interval after the call; if a send overruns the
//! interval the next tick is delayed rather than fired in a burst.

use crate::core::logger::MessageSink;
use crate::core::scheduler::{SnapshotSource, TickOutcome, TransmissionScheduler};
use crate::core::transport::Transport;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Why the driver returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Shutdown was signalled (or the signal sender went away)
    Shutdown,
    /// The requested number of messages was sent
    MessageLimit,
    /// The scheduler stopped itself after repeated transport failures
    TransportFailures,
    /// The scheduler was not running when the driver was called
    NotRunning,
}

/// Counters for one driver run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Why the run ended
    pub reason: StopReason,
    /// Scheduler sent count at the end of the run
    pub sent_count: u64,
    /// Ticks serviced
    pub ticks: u64,
    /// Ticks skipped because the snapshot was invalid
    pub skipped: u64,
    /// Ticks whose send failed
    pub send_failures: u64,
}

impl RunSummary {
    fn new(reason: StopReason) -> Self {
        Self {
            reason,
            sent_count: 0,
            ticks: 0,
            skipped: 0,
            send_failures: 0,
        }
    }
}

/// Tick `scheduler` at its interval until shutdown, a message limit, or an
/// automatic stop.
///
/// `shutdown` ends the run once it holds `true`. The scheduler is stopped
/// before returning whenever the run ends for a reason other than
/// [`StopReason::NotRunning`].
pub async fn run_until_stopped<T, S, D>(
    scheduler: &mut TransmissionScheduler<T>,
    source: &mut S,
    sink: &mut D,
    mut shutdown: watch::Receiver<bool>,
    max_messages: Option<u64>,
) -> RunSummary
where
    T: Transport,
    S: SnapshotSource + ?Sized,
    D: MessageSink + ?Sized,
{
    if !scheduler.is_running() {
        return RunSummary::new(StopReason::NotRunning);
    }

    let mut summary = RunSummary::new(StopReason::Shutdown);
    let period = scheduler.interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    summary.reason = loop {
        if *shutdown.borrow_and_update() {
            break StopReason::Shutdown;
        }
        if max_messages.is_some_and(|max| scheduler.sent_count() >= max) {
            break StopReason::MessageLimit;
        }

        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() {
                    debug!("Shutdown sender dropped");
                    break StopReason::Shutdown;
                }
            }
            _ = ticker.tick() => {
                summary.ticks += 1;
                match scheduler.tick(source, sink) {
                    TickOutcome::Sent { .. } | TickOutcome::Idle => {}
                    TickOutcome::Skipped(_) => summary.skipped += 1,
                    TickOutcome::SendFailed { .. } => summary.send_failures += 1,
                    TickOutcome::AutoStopped { .. } => {
                        summary.send_failures += 1;
                        break StopReason::TransportFailures;
                    }
                }
            }
        }
    };

    scheduler.stop();
    summary.sent_count = scheduler.sent_count();
    info!(
        reason = ?summary.reason,
        sent = summary.sent_count,
        ticks = summary.ticks,
        "Run finished"
    );
    summary
}
