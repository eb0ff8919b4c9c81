use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Read, Seek, SeekFrom, Write};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use camino::Utf8Path;
use crossbeam_channel::{Receiver, RecvTimeoutError, select};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::domain::FetchResult;
use crate::error::HarvestError;
use crate::shutdown::StopSignal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriterReport {
    pub lines_written: u64,
    pub write_errors: u64,
    /// The grace period ran out while producers were still alive.
    pub drain_timed_out: bool,
}

/// Opens `path` for appending, creating it if needed. Never truncates: the
/// existing content is the checkpoint for this run. A last line cut short by
/// an earlier crash is terminated so the first new record starts on its own
/// line.
pub fn open_output(path: &Utf8Path) -> Result<File, HarvestError> {
    let open_error = |err: io::Error| HarvestError::OutputOpen {
        path: path.as_std_path().to_path_buf(),
        message: err.to_string(),
    };
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path.as_std_path())
        .map_err(open_error)?;
    if ends_mid_line(&mut file).map_err(open_error)? {
        warn!(path = %path, "previous output ends mid-line; terminating it");
        file.write_all(b"\n").map_err(open_error)?;
    }
    Ok(file)
}

fn ends_mid_line(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Sole owner of the output file.
pub struct ResultWriter<W: Write> {
    out: LineWriter<W>,
    results: Receiver<FetchResult>,
    stop: StopSignal,
    grace: Duration,
    report: WriterReport,
}

impl<W: Write + Send + 'static> ResultWriter<W> {
    pub fn new(out: W, results: Receiver<FetchResult>, stop: StopSignal, grace: Duration) -> Self {
        Self {
            out: LineWriter::new(out),
            results,
            stop,
            grace,
            report: WriterReport::default(),
        }
    }

    pub fn spawn(self) -> Result<JoinHandle<WriterReport>, HarvestError> {
        thread::Builder::new()
            .name("result-writer".to_string())
            .spawn(move || self.run())
            .map_err(|err| HarvestError::ThreadSpawn {
                name: "result-writer".to_string(),
                message: err.to_string(),
            })
    }

    pub fn run(mut self) -> WriterReport {
        loop {
            let next = select! {
                recv(self.results) -> msg => Some(msg),
                recv(self.stop.listener()) -> _ => None,
            };
            match next {
                Some(Ok(result)) => self.write(&result),
                Some(Err(_)) => {
                    debug!("all producers finished; writer closing");
                    return self.close();
                }
                None => break,
            }
        }

        self.drain();
        self.close()
    }

    /// Keeps writing until every producer is gone or the grace period ends.
    fn drain(&mut self) {
        let deadline = Instant::now() + self.grace;
        debug!(grace_ms = self.grace.as_millis() as u64, "draining buffered results");
        loop {
            match self.results.recv_deadline(deadline) {
                Ok(result) => self.write(&result),
                Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => {
                    self.report.drain_timed_out = true;
                    warn!(
                        grace_ms = self.grace.as_millis() as u64,
                        "grace period expired; results completing from now on are discarded"
                    );
                    return;
                }
            }
        }
    }

    fn write(&mut self, result: &FetchResult) {
        let line = result.to_line();
        if let Err(err) = writeln!(self.out, "{line}") {
            self.report.write_errors += 1;
            error!(source = %result.source, key = %result.key, error = %err, "failed to write result");
            return;
        }
        self.report.lines_written += 1;
    }

    fn close(mut self) -> WriterReport {
        if let Err(err) = self.out.flush() {
            self.report.write_errors += 1;
            error!(error = %err, "failed to flush output");
        }
        info!(
            lines = self.report.lines_written,
            write_errors = self.report.write_errors,
            "result writer closed"
        );
        self.report
    }
}
