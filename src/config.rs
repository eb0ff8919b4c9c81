use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{PartOfSpeech, Source};
use crate::error::HarvestError;
use crate::pipeline::{
    DEFAULT_GRACE_PERIOD, DEFAULT_PROGRESS_INTERVAL, PipelineOptions, default_workers_per_source,
};
use crate::providers::http::{
    DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, HttpSettings,
};

pub const DEFAULT_CONFIG_FILE: &str = "dict-harvest.json";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub workers_per_source: Option<usize>,
    #[serde(default)]
    pub grace_period_secs: Option<u64>,
    #[serde(default)]
    pub progress_interval_ms: Option<u64>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<usize>,
    /// Source tags (`Cam`) or names (`cambridge`).
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    #[serde(default)]
    pub clean: Option<bool>,
    #[serde(default)]
    pub stopwords: Option<PathBuf>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub workers_per_source: usize,
    pub grace_period: Duration,
    pub progress_interval: Duration,
    pub http: HttpSettings,
    pub sources: Vec<Source>,
    pub clean: bool,
    pub stopwords: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            workers_per_source: default_workers_per_source(),
            grace_period: DEFAULT_GRACE_PERIOD,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            http: HttpSettings::default(),
            sources: Source::ALL.to_vec(),
            clean: true,
            stopwords: None,
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub sources: Vec<Source>,
    pub workers_per_source: Option<usize>,
    pub grace_period_secs: Option<u64>,
    pub stopwords: Option<PathBuf>,
    pub no_clean: bool,
}

impl ResolvedConfig {
    pub fn apply(mut self, overrides: Overrides) -> Result<Self, HarvestError> {
        if !overrides.sources.is_empty() {
            self.sources = dedup_sources(overrides.sources)?;
        }
        if let Some(workers) = overrides.workers_per_source {
            self.workers_per_source = validate_workers(workers)?;
        }
        if let Some(secs) = overrides.grace_period_secs {
            self.grace_period = Duration::from_secs(secs);
        }
        if overrides.stopwords.is_some() {
            self.stopwords = overrides.stopwords;
        }
        if overrides.no_clean {
            self.clean = false;
        }
        Ok(self)
    }

    pub fn pipeline_options(&self, part_of_speech: PartOfSpeech) -> PipelineOptions {
        PipelineOptions {
            workers_per_source: self.workers_per_source,
            grace_period: self.grace_period,
            progress_interval: self.progress_interval,
            part_of_speech,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist. Without one, `dict-harvest.json` in the
    /// working directory is used if present, otherwise the defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, HarvestError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| HarvestError::ConfigRead(config_path.clone()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<ResolvedConfig, HarvestError> {
        let config: Config = serde_json::from_str(content)
            .map_err(|err| HarvestError::ConfigParse(err.to_string()))?;
        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, HarvestError> {
        let defaults = ResolvedConfig::default();

        let workers_per_source = match config.workers_per_source {
            Some(workers) => validate_workers(workers)?,
            None => defaults.workers_per_source,
        };

        let progress_interval = match config.progress_interval_ms {
            Some(0) => {
                return Err(HarvestError::InvalidConfig(
                    "progress_interval_ms must be positive".to_string(),
                ));
            }
            Some(ms) => Duration::from_millis(ms),
            None => defaults.progress_interval,
        };

        let timeout = match config.request_timeout_secs {
            Some(0) => {
                return Err(HarvestError::InvalidConfig(
                    "request_timeout_secs must be positive".to_string(),
                ));
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        let sources = match config.sources {
            Some(values) => {
                let parsed = values
                    .iter()
                    .map(|value| value.parse())
                    .collect::<Result<Vec<Source>, HarvestError>>()?;
                if parsed.is_empty() {
                    return Err(HarvestError::NoSources);
                }
                dedup_sources(parsed)?
            }
            None => defaults.sources,
        };

        Ok(ResolvedConfig {
            workers_per_source,
            grace_period: config
                .grace_period_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.grace_period),
            progress_interval,
            http: HttpSettings {
                timeout,
                max_retries: config.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
                user_agent: config
                    .user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            },
            sources,
            clean: config.clean.unwrap_or(true),
            stopwords: config.stopwords,
        })
    }
}

fn validate_workers(workers: usize) -> Result<usize, HarvestError> {
    if workers == 0 {
        return Err(HarvestError::InvalidConfig(
            "workers_per_source must be at least 1".to_string(),
        ));
    }
    Ok(workers)
}

fn dedup_sources(sources: Vec<Source>) -> Result<Vec<Source>, HarvestError> {
    let mut unique: Vec<Source> = Vec::with_capacity(sources.len());
    for source in sources {
        if unique.contains(&source) {
            return Err(HarvestError::DuplicateSource(source.to_string()));
        }
        unique.push(source);
    }
    Ok(unique)
}
