use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::info;

use crate::context::PipelineContext;
use crate::error::HarvestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub percent: u8,
    pub requests: u64,
    pub expected: u64,
    pub elapsed: Duration,
}

pub trait ProgressSink: Send + Sync {
    fn event(&self, event: ProgressEvent);

    fn finish(&self) {}
}

/// `\rNN%` on stderr.
pub struct TerminalProgress;

impl ProgressSink for TerminalProgress {
    fn event(&self, event: ProgressEvent) {
        let mut stderr = io::stderr();
        write!(stderr, "\r{}%", event.percent).ok();
        stderr.flush().ok();
    }

    fn finish(&self) {
        writeln!(io::stderr()).ok();
    }
}

pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn event(&self, event: ProgressEvent) {
        info!(
            percent = event.percent,
            requests = event.requests,
            expected = event.expected,
            elapsed_ms = event.elapsed.as_millis() as u64,
            "progress"
        );
    }
}

pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn event(&self, _event: ProgressEvent) {}
}

/// Integer completion percentage. Pairs settled by the checkpoint count as
/// done so a resumed run picks up where the last one stopped.
pub fn percent_complete(requests: u64, already_done: u64, expected: u64) -> u8 {
    if expected == 0 {
        return 100;
    }
    let done = (requests + already_done).min(expected);
    ((done as u128 * 100) / expected as u128) as u8
}

pub struct ProgressMonitor {
    pub context: Arc<PipelineContext>,
    pub sink: Arc<dyn ProgressSink>,
    pub interval: Duration,
    /// `sources × vocabulary size`.
    pub expected: u64,
    pub already_done: u64,
    /// True once every queue and the result channel are empty.
    pub idle: Box<dyn Fn() -> bool + Send>,
}

impl ProgressMonitor {
    pub fn spawn(self) -> Result<JoinHandle<()>, HarvestError> {
        thread::Builder::new()
            .name("progress".to_string())
            .spawn(move || self.run())
            .map_err(|err| HarvestError::ThreadSpawn {
                name: "progress".to_string(),
                message: err.to_string(),
            })
    }

    pub fn run(self) {
        let started = Instant::now();
        let mut last: Option<u8> = None;
        loop {
            let requests = self.context.total_requests();
            let percent = percent_complete(requests, self.already_done, self.expected);
            if last != Some(percent) {
                self.sink.event(ProgressEvent {
                    percent,
                    requests,
                    expected: self.expected,
                    elapsed: started.elapsed(),
                });
                last = Some(percent);
            }
            if (self.idle)() || self.context.stop().wait_timeout(self.interval) {
                break;
            }
        }
        self.sink.finish();
    }
}
