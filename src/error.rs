use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarvestError {
    #[error("invalid source tag: {0}")]
    InvalidSource(String),

    #[error("invalid part of speech: {0}")]
    InvalidPartOfSpeech(String),

    #[error("source {0} is configured more than once")]
    DuplicateSource(String),

    #[error("no sources selected")]
    #[diagnostic(help("pass at least one --source or list sources in the config file"))]
    NoSources,

    #[error("failed to read vocabulary at {path}: {message}")]
    VocabularyRead { path: PathBuf, message: String },

    #[error("failed to read checkpoint at {path}: {message}")]
    CheckpointRead { path: PathBuf, message: String },

    #[error("output file {path} is not writable: {message}")]
    OutputOpen { path: PathBuf, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config value: {0}")]
    InvalidConfig(String),

    #[error("failed to read stopwords at {0}")]
    StopwordsRead(PathBuf),

    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),

    #[error("failed to spawn {name} thread: {message}")]
    ThreadSpawn { name: String, message: String },

    #[error("failed to install interrupt handler: {0}")]
    InterruptHandler(String),

    #[error("result writer thread panicked")]
    WriterPanicked,
}

/// Why a single fetch produced nothing. The pipeline treats every kind the
/// same way; the distinction only matters for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("HTTP status {status}")]
    Http { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("response decode failed: {0}")]
    Decode(String),

    #[error("unexpected page structure: {0}")]
    Structure(String),

    #[error("adapter panicked: {0}")]
    Panicked(String),
}
