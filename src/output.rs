use std::io::{self, Write};

use serde::Serialize;

use crate::pipeline::RunSummary;
use crate::shutdown::StopReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        Self::write_summary(&mut stdout, summary)
    }

    /// Per-source `successes/requests`, then the run totals.
    pub fn write_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
        if summary.stop_reason == StopReason::Cancelled {
            writeln!(out, "Run cancelled; rerun the same command to resume.")?;
        }
        for source in &summary.sources {
            writeln!(
                out,
                "{:<4}{:>8}/{:<8}({:.2}%)",
                source.source.tag(),
                source.successes,
                source.requests,
                source.success_rate()
            )?;
        }
        writeln!(out, "Vocabulary: {} keys", summary.vocabulary_size)?;
        writeln!(
            out,
            "Output:     {} (+{} lines)",
            summary.output_path, summary.lines_written
        )?;
        writeln!(out, "Elapsed:    {:.1}s", summary.elapsed_ms as f64 / 1000.0)?;
        if summary.write_errors > 0 {
            writeln!(out, "Warning: {} results failed to write", summary.write_errors)?;
        }
        if summary.stranded() > 0 {
            writeln!(
                out,
                "Warning: {} results did not reach the output before it closed",
                summary.stranded()
            )?;
        }
        if summary.checkpoint_skipped_lines > 0 {
            writeln!(
                out,
                "Warning: {} malformed lines in the existing output were ignored",
                summary.checkpoint_skipped_lines
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;
    use crate::domain::Source;
    use crate::pipeline::SourceSummary;

    fn summary() -> RunSummary {
        RunSummary {
            started_at: "2026-01-01T00:00:00+00:00".to_string(),
            finished_at: "2026-01-01T00:00:02+00:00".to_string(),
            elapsed_ms: 2000,
            stop_reason: StopReason::Completed,
            vocabulary_size: 2,
            output_path: Utf8PathBuf::from("words-definitions.txt"),
            sources: vec![SourceSummary {
                source: Source::Cambridge,
                requests: 2,
                successes: 1,
                skipped: 0,
                queued: 2,
            }],
            lines_written: 1,
            write_errors: 0,
            drain_timed_out: false,
            unwritten: 0,
            in_flight: 1,
            checkpoint_skipped_lines: 0,
        }
    }

    #[test]
    fn text_summary_lists_sources() {
        let mut buf = Vec::new();
        TextOutput::write_summary(&mut buf, &summary()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Cam"));
        assert!(text.contains("1/2"));
        assert!(text.contains("(50.00%)"));
        assert!(text.contains("1 results did not reach"));
    }

    #[test]
    fn json_summary_uses_tags() {
        let value = serde_json::to_value(summary()).unwrap();
        assert_eq!(value["sources"][0]["source"], "Cam");
        assert_eq!(value["stop_reason"], "completed");
        assert_eq!(value["output_path"], "words-definitions.txt");
    }
}
