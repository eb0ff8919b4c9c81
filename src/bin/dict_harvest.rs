use std::collections::HashSet;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dict_harvest::clean::Cleaner;
use dict_harvest::config::{ConfigLoader, Overrides, ResolvedConfig};
use dict_harvest::domain::{PartOfSpeech, Source};
use dict_harvest::error::HarvestError;
use dict_harvest::output::{JsonOutput, OutputMode, TextOutput};
use dict_harvest::pipeline::Pipeline;
use dict_harvest::progress::{LogProgress, NoopProgress, ProgressSink, TerminalProgress};
use dict_harvest::providers::build_adapters;
use dict_harvest::shutdown::{StopReason, StopSignal};
use dict_harvest::vocabulary::{Vocabulary, derive_output_path};

const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(name = "dict-harvest")]
#[command(about = "Download dictionary definitions for every word of a vocabulary; rerun to resume")]
#[command(version, author)]
struct Cli {
    /// Newline-delimited list of words.
    vocabulary: Utf8PathBuf,

    #[arg(long, value_enum, default_value_t = PartOfSpeech::All)]
    pos: PartOfSpeech,

    /// Repeat to query several dictionaries; defaults to all of them.
    #[arg(long = "source", value_enum)]
    sources: Vec<Source>,

    #[arg(long)]
    workers: Option<usize>,

    #[arg(long)]
    grace_secs: Option<u64>,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    stopwords: Option<PathBuf>,

    /// Write raw definitions instead of cleaned word tokens.
    #[arg(long)]
    no_clean: bool,

    /// Defaults to `<vocabulary>-definitions.txt`.
    #[arg(long)]
    output: Option<Utf8PathBuf>,

    #[arg(long)]
    json: bool,

    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(harvest) = report.downcast_ref::<HarvestError>() {
                return ExitCode::from(map_exit_code(harvest));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &HarvestError) -> u8 {
    match error {
        HarvestError::InvalidSource(_)
        | HarvestError::InvalidPartOfSpeech(_)
        | HarvestError::DuplicateSource(_)
        | HarvestError::NoSources
        | HarvestError::VocabularyRead { .. }
        | HarvestError::ConfigRead(_)
        | HarvestError::ConfigParse(_)
        | HarvestError::InvalidConfig(_)
        | HarvestError::StopwordsRead(_) => 2,
        HarvestError::OutputOpen { .. }
        | HarvestError::CheckpointRead { .. }
        | HarvestError::WriterPanicked => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let resolved = ConfigLoader::resolve(cli.config.as_deref())?.apply(Overrides {
        sources: cli.sources,
        workers_per_source: cli.workers,
        grace_period_secs: cli.grace_secs,
        stopwords: cli.stopwords,
        no_clean: cli.no_clean,
    })?;

    let vocabulary = Vocabulary::load(&cli.vocabulary)?;
    let output = cli
        .output
        .unwrap_or_else(|| derive_output_path(&cli.vocabulary));

    let cleaner = Arc::new(build_cleaner(&resolved)?);
    let adapters = build_adapters(&resolved.sources, &resolved.http, cleaner)?;
    let pipeline = Pipeline::new(adapters, resolved.pipeline_options(cli.pos))?;

    let stop = StopSignal::new();
    let handler = stop.clone();
    ctrlc::set_handler(move || handler.trigger(StopReason::Cancelled))
        .map_err(|err| HarvestError::InterruptHandler(err.to_string()))?;

    let sink: Arc<dyn ProgressSink> = if cli.quiet {
        Arc::new(NoopProgress)
    } else if std::io::stderr().is_terminal() {
        Arc::new(TerminalProgress)
    } else {
        Arc::new(LogProgress)
    };

    info!(
        output = %output,
        sources = resolved.sources.len(),
        workers_per_source = resolved.workers_per_source,
        pos = %cli.pos,
        "starting harvest"
    );
    let summary = pipeline.run(&vocabulary, &output, stop, sink)?;

    match mode {
        OutputMode::Json => JsonOutput::print_summary(&summary).into_diagnostic()?,
        OutputMode::Text => TextOutput::print_summary(&summary).into_diagnostic()?,
    }

    if summary.stop_reason == StopReason::Cancelled {
        return Ok(ExitCode::from(EXIT_CANCELLED));
    }
    Ok(ExitCode::SUCCESS)
}

fn build_cleaner(config: &ResolvedConfig) -> Result<Cleaner, HarvestError> {
    if !config.clean {
        return Ok(Cleaner::passthrough());
    }
    match &config.stopwords {
        Some(path) => Cleaner::from_stopwords_file(path),
        None => Ok(Cleaner::new(HashSet::new())),
    }
}
