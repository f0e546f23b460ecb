//! Scheduled refresh of the dashboard from a [`RowSource`].
//!
//! One background task owns the refresh loop. It fetches once at startup and
//! then on every interval tick or manual trigger. While a fetch is in flight,
//! manual triggers are refused and missed ticks are skipped, so at most one
//! fetch is ever outstanding. Shutting the poller down drops an in-flight
//! fetch and discards whatever it would have returned.

use chrono::Local;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::FeedConfig;
use crate::dashboard::{ErrorNotice, SharedDashboard};
use crate::feed::RowSource;

/// Shortest interval the poller will run at.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct PollerCounters {
    succeeded: AtomicU64,
    failed: AtomicU64,
    skipped_triggers: AtomicU64,
}

/// Point-in-time copy of the poller's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PollerStats {
    pub succeeded: u64,
    pub failed: u64,
    pub skipped_triggers: u64,
}

pub struct Poller {
    source: Arc<dyn RowSource>,
    feed: FeedConfig,
    dashboard: SharedDashboard,
    interval: Duration,
}

impl Poller {
    pub fn new(
        source: Arc<dyn RowSource>,
        feed: FeedConfig,
        dashboard: SharedDashboard,
        interval: Duration,
    ) -> Self {
        let interval = if interval < MIN_REFRESH_INTERVAL {
            log::warn!(
                "refresh interval {:?} is below the minimum, using {:?}",
                interval,
                MIN_REFRESH_INTERVAL
            );
            MIN_REFRESH_INTERVAL
        } else {
            interval
        };
        Self {
            source,
            feed,
            dashboard,
            interval,
        }
    }

    /// Start the refresh loop on the current tokio runtime.
    pub fn spawn(self) -> PollerHandle {
        let trigger = Arc::new(Notify::new());
        let in_flight = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(PollerCounters::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run_loop(
            self,
            Arc::clone(&trigger),
            Arc::clone(&in_flight),
            Arc::clone(&counters),
            shutdown_rx,
        ));

        PollerHandle {
            trigger,
            in_flight,
            counters,
            shutdown: shutdown_tx,
            task,
        }
    }
}

async fn run_loop(
    poller: Poller,
    trigger: Arc<Notify>,
    in_flight: Arc<AtomicBool>,
    counters: Arc<PollerCounters>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(poller.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    log::info!("poller started, refreshing every {:?}", poller.interval);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
            _ = trigger.notified() => log::debug!("manual refresh requested"),
        }

        in_flight.store(true, Ordering::SeqCst);
        poller.dashboard.replace(|state| state.with_refreshing(true));

        let outcome = tokio::select! {
            result = poller.source.fetch_rows() => Some(result),
            _ = shutdown.changed() => None,
        };

        match outcome {
            Some(Ok(records)) => {
                counters.succeeded.fetch_add(1, Ordering::SeqCst);
                poller
                    .dashboard
                    .replace(|state| state.with_records(records, Local::now()));
            }
            Some(Err(err)) => {
                counters.failed.fetch_add(1, Ordering::SeqCst);
                log::warn!("refresh failed, keeping previous rows: {err}");
                let notice = ErrorNotice::from_feed_error(&err, &poller.feed);
                poller.dashboard.replace(|state| state.with_error(notice));
            }
            None => {
                log::debug!("poller stopped during a fetch, discarding its result");
                poller.dashboard.replace(|state| state.with_refreshing(false));
                in_flight.store(false, Ordering::SeqCst);
                break;
            }
        }
        in_flight.store(false, Ordering::SeqCst);
    }

    log::info!("poller stopped");
}

/// Control handle for a running [`Poller`]. Dropping it stops the loop.
pub struct PollerHandle {
    trigger: Arc<Notify>,
    in_flight: Arc<AtomicBool>,
    counters: Arc<PollerCounters>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Request an immediate refresh. Returns `false` (and does nothing) when
    /// a fetch is already outstanding.
    pub fn refresh_now(&self) -> bool {
        if self.in_flight.load(Ordering::SeqCst) {
            self.counters.skipped_triggers.fetch_add(1, Ordering::SeqCst);
            log::debug!("refresh already in flight, ignoring trigger");
            return false;
        }
        self.trigger.notify_one();
        true
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> PollerStats {
        PollerStats {
            succeeded: self.counters.succeeded.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
            skipped_triggers: self.counters.skipped_triggers.load(Ordering::SeqCst),
        }
    }

    /// Stop the loop and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            log::warn!("poller task ended abnormally: {err}");
        }
    }
}
