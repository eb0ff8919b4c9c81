use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::HarvestError;

/// Reduces raw definitions to lowercase ASCII word tokens without stopwords.
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    enabled: bool,
    stopwords: HashSet<String>,
}

impl Cleaner {
    pub fn new(stopwords: HashSet<String>) -> Self {
        Self {
            enabled: true,
            stopwords,
        }
    }

    /// Keeps every definition as one fragment, with its whitespace collapsed
    /// to single spaces.
    pub fn passthrough() -> Self {
        Self::default()
    }

    pub fn from_stopwords_file(path: &Path) -> Result<Self, HarvestError> {
        let content = fs::read_to_string(path)
            .map_err(|_| HarvestError::StopwordsRead(path.to_path_buf()))?;
        let stopwords: HashSet<String> = content
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|line| !line.is_empty())
            .collect();
        info!(path = %path.display(), count = stopwords.len(), "loaded stopwords");
        Ok(Self::new(stopwords))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn clean(&self, definitions: &[String]) -> Vec<String> {
        if !self.enabled {
            return definitions
                .iter()
                .map(|definition| definition.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|definition| !definition.is_empty())
                .collect();
        }

        let mut tokens = Vec::new();
        for definition in definitions {
            for word in definition.split_whitespace() {
                let token: String = word
                    .chars()
                    .filter(char::is_ascii_alphabetic)
                    .map(|ch| ch.to_ascii_lowercase())
                    .collect();
                if token.is_empty() || self.stopwords.contains(&token) {
                    continue;
                }
                tokens.push(token);
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stopwords(words: &[&str]) -> HashSet<String> {
        words.iter().map(|word| word.to_string()).collect()
    }

    #[test]
    fn strips_punctuation_and_stopwords() {
        let cleaner = Cleaner::new(stopwords(&["a", "of", "the"]));
        let definitions = vec![
            "A piece of cord in a candle.".to_string(),
            "The (small) café -- thing".to_string(),
        ];
        assert_eq!(
            cleaner.clean(&definitions),
            vec!["piece", "cord", "in", "candle", "small", "caf", "thing"]
        );
    }

    #[test]
    fn passthrough_keeps_definitions() {
        let cleaner = Cleaner::passthrough();
        let definitions = vec![" to burn slowly ".to_string(), "   ".to_string()];
        assert_eq!(cleaner.clean(&definitions), vec!["to burn slowly"]);
    }

    #[test]
    fn passthrough_joins_wrapped_definitions() {
        let cleaner = Cleaner::passthrough();
        let definitions = vec!["to burn\n   slowly\r\n".to_string()];
        assert_eq!(cleaner.clean(&definitions), vec!["to burn slowly"]);
    }
}
