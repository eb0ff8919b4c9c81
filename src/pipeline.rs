use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use tracing::{info, warn};

use crate::adapter::SourceAdapter;
use crate::checkpoint::Checkpoint;
use crate::context::PipelineContext;
use crate::domain::{FetchResult, PartOfSpeech, Source};
use crate::error::HarvestError;
use crate::progress::{ProgressMonitor, ProgressSink};
use crate::queue::DispatchQueue;
use crate::shutdown::{StopReason, StopSignal};
use crate::vocabulary::Vocabulary;
use crate::worker::FetchWorker;
use crate::writer::{ResultWriter, WriterReport, open_output};

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);
const MAX_COORDINATOR_POLL: Duration = Duration::from_millis(100);

/// Three workers per available core, per source.
pub fn default_workers_per_source() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        * 3
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub workers_per_source: usize,
    pub grace_period: Duration,
    pub progress_interval: Duration,
    pub part_of_speech: PartOfSpeech,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers_per_source: default_workers_per_source(),
            grace_period: DEFAULT_GRACE_PERIOD,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            part_of_speech: PartOfSpeech::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub source: Source,
    pub requests: u64,
    pub successes: u64,
    /// Keys already present in the output for this source.
    pub skipped: usize,
    pub queued: usize,
}

impl SourceSummary {
    pub fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.successes as f64 / self.requests as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub started_at: String,
    pub finished_at: String,
    pub elapsed_ms: u64,
    pub stop_reason: StopReason,
    pub vocabulary_size: usize,
    pub output_path: Utf8PathBuf,
    pub sources: Vec<SourceSummary>,
    pub lines_written: u64,
    pub write_errors: u64,
    pub drain_timed_out: bool,
    /// Results that reached the channel but not the file.
    pub unwritten: usize,
    /// Fetches still running when the writer closed.
    pub in_flight: usize,
    pub checkpoint_skipped_lines: usize,
}

impl RunSummary {
    /// Work that was in progress when the output closed and is not on disk.
    pub fn stranded(&self) -> usize {
        self.unwritten + self.in_flight
    }

    pub fn source(&self, source: Source) -> Option<&SourceSummary> {
        self.sources.iter().find(|summary| summary.source == source)
    }
}

/// One harvest run over a fixed set of source adapters.
pub struct Pipeline {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        options: PipelineOptions,
    ) -> Result<Self, HarvestError> {
        if adapters.is_empty() {
            return Err(HarvestError::NoSources);
        }
        if options.workers_per_source == 0 {
            return Err(HarvestError::InvalidConfig(
                "workers_per_source must be at least 1".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for adapter in &adapters {
            if !seen.insert(adapter.source()) {
                return Err(HarvestError::DuplicateSource(adapter.source().to_string()));
            }
        }
        Ok(Self { adapters, options })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn sources(&self) -> Vec<Source> {
        self.adapters.iter().map(|adapter| adapter.source()).collect()
    }

    /// Fetches every (source, key) pair missing from `output` and appends the
    /// results to it.
    ///
    /// Returns once the run completes naturally or `stop` is triggered from
    /// outside and the writer has drained. Fetch workers are left to finish
    /// their current call on their own.
    pub fn run(
        &self,
        vocabulary: &Vocabulary,
        output: &Utf8Path,
        stop: StopSignal,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<RunSummary, HarvestError> {
        let started_at = chrono::Utc::now().to_rfc3339();
        let clock = Instant::now();

        let checkpoint = Checkpoint::load(output)?;
        let file = open_output(output)?;

        let context = Arc::new(PipelineContext::new(self.sources(), stop.clone()));
        let mut queues = Vec::with_capacity(self.adapters.len());
        let mut skipped_per_source = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let source = adapter.source();
            let (queue, skipped) = DispatchQueue::populate(source, vocabulary, &checkpoint);
            info!(%source, queued = queue.len(), skipped, "queue ready");
            skipped_per_source.push((skipped, queue.len()));
            queues.push(Arc::new(queue));
        }

        let (results_tx, results_rx) = crossbeam_channel::unbounded::<FetchResult>();
        let backlog = results_rx.clone();
        let writer = ResultWriter::new(file, results_rx, stop.clone(), self.options.grace_period)
            .spawn()?;

        if let Err(err) = self.spawn_workers(&context, &queues, &results_tx) {
            stop.trigger(StopReason::Cancelled);
            drop(results_tx);
            writer.join().ok();
            return Err(err);
        }
        drop(results_tx);

        let expected = (self.adapters.len() * vocabulary.len()) as u64;
        let already_done: usize = skipped_per_source.iter().map(|(skipped, _)| skipped).sum();
        let monitor = ProgressMonitor {
            context: Arc::clone(&context),
            sink,
            interval: self.options.progress_interval,
            expected,
            already_done: already_done as u64,
            idle: idle_probe(&queues, &backlog, &context),
        }
        .spawn();
        let monitor = match monitor {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(error = %err, "progress monitor unavailable");
                None
            }
        };

        self.coordinate(&stop, idle_probe(&queues, &backlog, &context));

        let report = join_writer(writer)?;
        if let Some(monitor) = monitor
            && monitor.join().is_err()
        {
            warn!("progress monitor panicked");
        }

        let stats = context.snapshot();
        let sources = self
            .adapters
            .iter()
            .zip(skipped_per_source)
            .map(|(adapter, (skipped, queued))| {
                let source = adapter.source();
                let counters = stats.get(&source).copied().unwrap_or_default();
                SourceSummary {
                    source,
                    requests: counters.requests,
                    successes: counters.successes,
                    skipped,
                    queued,
                }
            })
            .collect();

        let summary = RunSummary {
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            elapsed_ms: clock.elapsed().as_millis() as u64,
            stop_reason: stop.reason().unwrap_or(StopReason::Completed),
            vocabulary_size: vocabulary.len(),
            output_path: output.to_path_buf(),
            sources,
            lines_written: report.lines_written,
            write_errors: report.write_errors,
            drain_timed_out: report.drain_timed_out,
            unwritten: backlog.len(),
            in_flight: context.in_flight(),
            checkpoint_skipped_lines: checkpoint.skipped_lines(),
        };
        if summary.stranded() > 0 {
            warn!(
                unwritten = summary.unwritten,
                in_flight = summary.in_flight,
                "results did not reach the output before it closed"
            );
        }
        info!(
            reason = ?summary.stop_reason,
            lines = summary.lines_written,
            elapsed_ms = summary.elapsed_ms,
            "run finished"
        );
        Ok(summary)
    }

    fn spawn_workers(
        &self,
        context: &Arc<PipelineContext>,
        queues: &[Arc<DispatchQueue>],
        results: &Sender<FetchResult>,
    ) -> Result<(), HarvestError> {
        for (adapter, queue) in self.adapters.iter().zip(queues) {
            let worker = FetchWorker {
                context: Arc::clone(context),
                queue: Arc::clone(queue),
                adapter: Arc::clone(adapter),
                pos: self.options.part_of_speech,
                results: results.clone(),
            };
            for index in 0..self.options.workers_per_source {
                // Detached: a worker stuck in a slow request must not hold up shutdown.
                worker.clone().spawn(index)?;
            }
        }
        info!(
            sources = self.adapters.len(),
            per_source = self.options.workers_per_source,
            "fetch workers started"
        );
        Ok(())
    }

    /// Waits for natural completion or an outside stop, whichever comes first.
    fn coordinate(&self, stop: &StopSignal, idle: Box<dyn Fn() -> bool + Send>) {
        let poll = self.options.progress_interval.min(MAX_COORDINATOR_POLL);
        loop {
            if idle() {
                stop.trigger(StopReason::Completed);
                return;
            }
            if stop.wait_timeout(poll) {
                return;
            }
        }
    }
}

/// True when no queue holds a key, no worker holds one, and the writer has
/// nothing buffered.
fn idle_probe(
    queues: &[Arc<DispatchQueue>],
    backlog: &Receiver<FetchResult>,
    context: &Arc<PipelineContext>,
) -> Box<dyn Fn() -> bool + Send> {
    let queues = queues.to_vec();
    let backlog = backlog.clone();
    let context = Arc::clone(context);
    Box::new(move || {
        queues.iter().all(|queue| queue.is_empty())
            && context.in_flight() == 0
            && backlog.is_empty()
    })
}

fn join_writer(handle: JoinHandle<WriterReport>) -> Result<WriterReport, HarvestError> {
    handle.join().map_err(|_| HarvestError::WriterPanicked)
}
