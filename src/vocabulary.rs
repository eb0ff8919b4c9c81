use std::collections::HashSet;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{info, warn};

use crate::error::HarvestError;

/// Deduplicated keys in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    keys: Vec<String>,
}

impl Vocabulary {
    pub fn load(path: &Utf8Path) -> Result<Self, HarvestError> {
        let content =
            fs::read_to_string(path.as_std_path()).map_err(|err| HarvestError::VocabularyRead {
                path: path.as_std_path().to_path_buf(),
                message: err.to_string(),
            })?;
        let vocabulary = Self::parse(&content);
        info!(path = %path, keys = vocabulary.len(), "loaded vocabulary");
        Ok(vocabulary)
    }

    pub fn parse(content: &str) -> Self {
        Self::from_keys(content.lines())
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for (index, raw) in keys.into_iter().enumerate() {
            let key = raw.as_ref().trim();
            if key.is_empty() {
                continue;
            }
            // Output lines are space separated, so such a key could never be
            // read back from a checkpoint.
            if key.contains(char::is_whitespace) {
                warn!(line = index + 1, key, "skipping vocabulary entry with inner whitespace");
                continue;
            }
            if seen.insert(key.to_string()) {
                ordered.push(key.to_string());
            }
        }
        Self { keys: ordered }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

/// `words.txt` becomes `words-definitions.txt` next to it.
pub fn derive_output_path(vocabulary: &Utf8Path) -> Utf8PathBuf {
    let stem = vocabulary.with_extension("");
    Utf8PathBuf::from(format!("{stem}-definitions.txt"))
}
