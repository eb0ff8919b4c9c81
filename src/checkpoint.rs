use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;

use camino::Utf8Path;
use tracing::{info, warn};

use crate::domain::Source;
use crate::error::HarvestError;

/// (source, key) pairs already present in a previous output file.
#[derive(Debug, Clone, Default)]
pub struct Checkpoint {
    completed: HashMap<Source, HashSet<String>>,
    skipped_lines: usize,
}

impl Checkpoint {
    /// A missing file is an empty checkpoint, not an error.
    pub fn load(path: &Utf8Path) -> Result<Self, HarvestError> {
        let content = match fs::read(path.as_std_path()) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path, "no previous output; starting fresh");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(HarvestError::CheckpointRead {
                    path: path.as_std_path().to_path_buf(),
                    message: err.to_string(),
                });
            }
        };

        let checkpoint = Self::parse_bytes(&content);
        info!(
            path = %path,
            completed = checkpoint.total(),
            skipped_lines = checkpoint.skipped_lines,
            "loaded checkpoint"
        );
        Ok(checkpoint)
    }

    pub fn parse(content: &str) -> Self {
        Self::parse_bytes(content.as_bytes())
    }

    /// Lines that are not valid UTF-8, such as one cut inside a multibyte
    /// character, are skipped like any other malformed line.
    pub fn parse_bytes(content: &[u8]) -> Self {
        let mut checkpoint = Self::default();
        if content.is_empty() {
            return checkpoint;
        }
        let body = content.strip_suffix(b"\n").unwrap_or(content);
        for (index, raw) in body.split(|byte| *byte == b'\n').enumerate() {
            let Ok(line) = std::str::from_utf8(raw) else {
                warn!(line = index + 1, "skipping checkpoint line that is not valid UTF-8");
                checkpoint.skipped_lines += 1;
                continue;
            };
            let mut tokens = line.split_whitespace();
            let (Some(tag), Some(key)) = (tokens.next(), tokens.next()) else {
                warn!(line = index + 1, "skipping checkpoint line with fewer than two tokens");
                checkpoint.skipped_lines += 1;
                continue;
            };
            let Ok(source) = tag.parse::<Source>() else {
                warn!(line = index + 1, tag, "skipping checkpoint line with unknown source");
                checkpoint.skipped_lines += 1;
                continue;
            };
            checkpoint.insert(source, key);
        }
        checkpoint
    }

    pub fn insert(&mut self, source: Source, key: &str) {
        self.completed
            .entry(source)
            .or_default()
            .insert(key.to_string());
    }

    pub fn contains(&self, source: Source, key: &str) -> bool {
        self.completed
            .get(&source)
            .is_some_and(|keys| keys.contains(key))
    }

    pub fn completed(&self, source: Source) -> usize {
        self.completed.get(&source).map_or(0, HashSet::len)
    }

    pub fn total(&self) -> usize {
        self.completed.values().map(HashSet::len).sum()
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }
}
