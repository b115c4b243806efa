//! Queue backlog monitor.
//!
//! Polls the queue backlog on a fixed cadence and triggers a drain once the
//! backlog reaches the configured threshold. Ticks are strictly serialized:
//! the next backlog query never starts before the previous tick (including its
//! drain) has settled. Backlog query and drain failures are logged and the
//! timer keeps running; nothing in a tick can stop the monitor.

mod stats;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::drain::Drain;
use crate::error_handling::ConfigError;
use crate::queue::BacklogSource;

pub use stats::{MonitorEvent, MonitorStats};

/// Threshold and cadence of a [`QueueMonitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Backlog size at which a drain is triggered
    pub threshold: u64,
    /// Time between two ticks
    pub poll_interval: Duration,
}

impl MonitorSettings {
    /// Checks that threshold and interval are both non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold == 0 {
            return Err(ConfigError::InvalidThreshold);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidPollInterval);
        }
        Ok(())
    }
}

/// Threshold decision for one observed backlog.
///
/// The `Display` form is the line logged for the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Backlog reached the threshold; drain now
    Drain {
        /// Observed backlog
        waiting: u64,
    },
    /// Backlog is below the threshold; wait for the next tick
    Wait {
        /// Observed backlog
        waiting: u64,
        /// Configured threshold
        threshold: u64,
    },
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Drain { waiting } => write!(
                f,
                "Queue size ({}) reached the threshold. Processing batch now.",
                waiting
            ),
            Decision::Wait { waiting, .. } => {
                write!(f, "Queue size ({}) below threshold. Waiting...", waiting)
            }
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The backlog query failed
    PollFailed,
    /// Backlog below the threshold, nothing done
    BelowThreshold {
        /// Observed backlog
        waiting: u64,
    },
    /// Drain completed
    Drained {
        /// Observed backlog
        waiting: u64,
        /// Records persisted by the drain
        persisted: usize,
    },
    /// Drain returned an error
    DrainFailed {
        /// Observed backlog
        waiting: u64,
    },
}

/// Logical state of the monitor between and during ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Waiting for the next tick
    Idle,
    /// A drain is in flight
    Draining,
}

/// Periodic backlog monitor.
pub struct QueueMonitor<B: BacklogSource, D: Drain> {
    backlog: Arc<B>,
    drain: Arc<D>,
    settings: MonitorSettings,
    draining: Arc<AtomicBool>,
    stats: Arc<MonitorStats>,
}

impl<B, D> QueueMonitor<B, D>
where
    B: BacklogSource + 'static,
    D: Drain + 'static,
{
    /// Creates a monitor; nothing runs until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for a zero threshold or a zero poll interval.
    pub fn new(settings: MonitorSettings, backlog: Arc<B>, drain: Arc<D>) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(QueueMonitor {
            backlog,
            drain,
            settings,
            draining: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(MonitorStats::new()),
        })
    }

    /// Threshold and cadence this monitor was built with.
    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Counters shared with the running loop.
    pub fn stats(&self) -> Arc<MonitorStats> {
        Arc::clone(&self.stats)
    }

    /// Whether a drain is currently in flight.
    pub fn state(&self) -> MonitorState {
        state_of(&self.draining)
    }

    /// Compares an observed backlog against the threshold.
    pub fn decide(&self, waiting: u64) -> Decision {
        if waiting >= self.settings.threshold {
            Decision::Drain { waiting }
        } else {
            Decision::Wait {
                waiting,
                threshold: self.settings.threshold,
            }
        }
    }

    /// Runs one tick: query the backlog, decide, and drain if needed.
    ///
    /// Never fails; every error is logged and reported in the outcome.
    pub async fn on_tick(&self) -> TickOutcome {
        self.stats.increment(MonitorEvent::Tick);

        let waiting = match self.backlog.backlog_count().await {
            Ok(waiting) => waiting,
            Err(e) => {
                error!("Error checking queue size: {}", e);
                self.stats.increment(MonitorEvent::PollFailure);
                return TickOutcome::PollFailed;
            }
        };

        let decision = self.decide(waiting);
        info!("{}", decision);

        match decision {
            Decision::Wait { waiting, threshold } => {
                debug!("Backlog {} is below threshold {}", waiting, threshold);
                self.stats.increment(MonitorEvent::BelowThreshold);
                TickOutcome::BelowThreshold { waiting }
            }
            Decision::Drain { waiting } => {
                self.draining.store(true, Ordering::SeqCst);
                let result = self.drain.drain(waiting).await;
                self.draining.store(false, Ordering::SeqCst);

                match result {
                    Ok(persisted) => {
                        self.stats.increment(MonitorEvent::Drain);
                        self.stats.add_persisted(persisted);
                        TickOutcome::Drained { waiting, persisted }
                    }
                    Err(e) => {
                        error!("Error processing queue batch: {}", e);
                        self.stats.increment(MonitorEvent::DrainFailure);
                        TickOutcome::DrainFailed { waiting }
                    }
                }
            }
        }
    }

    /// Starts the polling loop on the current tokio runtime.
    ///
    /// The first tick fires one poll interval after start. Ticks that fall
    /// due while a drain is running are delayed, not replayed in a burst.
    pub fn start(self) -> MonitorHandle {
        let cancel = CancellationToken::new();
        let draining = Arc::clone(&self.draining);
        let stats = Arc::clone(&self.stats);
        let token = cancel.clone();

        info!(
            "Starting queue monitor (threshold {}, interval {} ms)",
            self.settings.threshold,
            self.settings.poll_interval.as_millis()
        );
        let task = tokio::spawn(async move { self.run(token).await });

        MonitorHandle {
            cancel,
            task,
            draining,
            stats,
        }
    }

    async fn run(&self, cancel: CancellationToken) {
        let period = self.settings.poll_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.on_tick().await;
                }
            }
        }

        info!("Queue monitor stopped");
    }
}

fn state_of(draining: &AtomicBool) -> MonitorState {
    if draining.load(Ordering::SeqCst) {
        MonitorState::Draining
    } else {
        MonitorState::Idle
    }
}

/// Owner of a running monitor task.
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    draining: Arc<AtomicBool>,
    stats: Arc<MonitorStats>,
}

impl MonitorHandle {
    /// Whether the running loop is draining right now.
    pub fn state(&self) -> MonitorState {
        state_of(&self.draining)
    }

    /// Live counters of the running loop.
    pub fn stats(&self) -> Arc<MonitorStats> {
        Arc::clone(&self.stats)
    }

    /// Stops the loop and waits for it to exit.
    ///
    /// A tick already in progress (including its drain) runs to completion.
    pub async fn stop(self) -> Arc<MonitorStats> {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!("Queue monitor task ended abnormally: {}", e);
        }
        self.stats
    }
}
