use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::domain::Source;
use crate::shutdown::StopSignal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub requests: u64,
    pub successes: u64,
}

/// One lock per source, so workers of different sources never contend.
#[derive(Debug, Default)]
pub struct SourceCounters {
    stats: Mutex<SourceStats>,
}

impl SourceCounters {
    /// Both counters move in the same critical section, which keeps
    /// `successes <= requests` visible to every reader.
    pub fn record(&self, success: bool) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.requests += 1;
        if success {
            stats.successes += 1;
        }
    }

    pub fn snapshot(&self) -> SourceStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// State shared by every thread of one pipeline run.
pub struct PipelineContext {
    counters: BTreeMap<Source, SourceCounters>,
    in_flight: AtomicUsize,
    stop: StopSignal,
}

impl PipelineContext {
    pub fn new<I>(sources: I, stop: StopSignal) -> Self
    where
        I: IntoIterator<Item = Source>,
    {
        let counters = sources
            .into_iter()
            .map(|source| (source, SourceCounters::default()))
            .collect();
        Self {
            counters,
            in_flight: AtomicUsize::new(0),
            stop,
        }
    }

    pub fn stop(&self) -> &StopSignal {
        &self.stop
    }

    /// Records one finished fetch attempt. Unknown sources are ignored; the
    /// pipeline only spawns workers for sources it registered here.
    pub fn record(&self, source: Source, success: bool) {
        if let Some(counters) = self.counters.get(&source) {
            counters.record(success);
        }
    }

    /// Called by a worker before it takes from its queue, so the gauge covers
    /// the key from the moment it leaves the queue until it is settled.
    pub fn begin_fetch(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    pub fn end_fetch(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Workers between a take and the settlement of the key they took.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn stats(&self, source: Source) -> SourceStats {
        self.counters
            .get(&source)
            .map(SourceCounters::snapshot)
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> BTreeMap<Source, SourceStats> {
        self.counters
            .iter()
            .map(|(source, counters)| (*source, counters.snapshot()))
            .collect()
    }

    pub fn total_requests(&self) -> u64 {
        self.counters
            .values()
            .map(|counters| counters.snapshot().requests)
            .sum()
    }

    pub fn sources(&self) -> impl Iterator<Item = Source> + '_ {
        self.counters.keys().copied()
    }
}
