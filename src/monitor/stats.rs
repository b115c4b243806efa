//! Monitor statistics tracking.
//!
//! Thread-safe counters for what happened on each tick, shared between the
//! monitor task and whoever holds the [`MonitorHandle`](super::MonitorHandle).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;

/// Events counted by [`MonitorStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum MonitorEvent {
    /// A tick started
    Tick,
    /// The backlog query failed
    PollFailure,
    /// The backlog was below the threshold
    BelowThreshold,
    /// A drain completed successfully
    Drain,
    /// A drain returned an error
    DrainFailure,
}

impl MonitorEvent {
    /// Label used in the summary line.
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorEvent::Tick => "ticks",
            MonitorEvent::PollFailure => "poll failures",
            MonitorEvent::BelowThreshold => "below threshold",
            MonitorEvent::Drain => "drains",
            MonitorEvent::DrainFailure => "drain failures",
        }
    }
}

/// Thread-safe monitor statistics.
///
/// All event types are initialized to zero on creation, so lookups never miss.
pub struct MonitorStats {
    events: HashMap<MonitorEvent, AtomicUsize>,
    persisted_records: AtomicUsize,
}

impl MonitorStats {
    /// Creates stats with every counter at zero.
    pub fn new() -> Self {
        let mut events = HashMap::new();
        for event in MonitorEvent::iter() {
            events.insert(event, AtomicUsize::new(0));
        }

        MonitorStats {
            events,
            persisted_records: AtomicUsize::new(0),
        }
    }

    /// Counts one occurrence of `event`.
    pub fn increment(&self, event: MonitorEvent) {
        if let Some(counter) = self.events.get(&event) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Occurrences of `event` so far.
    pub fn count(&self, event: MonitorEvent) -> usize {
        self.events
            .get(&event)
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Adds the records persisted by one drain.
    pub fn add_persisted(&self, records: usize) {
        self.persisted_records.fetch_add(records, Ordering::Relaxed);
    }

    /// Records persisted over the whole run.
    pub fn persisted_records(&self) -> usize {
        self.persisted_records.load(Ordering::Relaxed)
    }

    /// Logs one line with every counter.
    pub fn log_summary(&self) {
        let counters: Vec<String> = MonitorEvent::iter()
            .map(|event| format!("{} {}", self.count(event), event.as_str()))
            .collect();
        log::info!(
            "Monitor summary: {}, {} records persisted",
            counters.join(", "),
            self.persisted_records()
        );
    }
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self::new()
    }
}
