use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::HarvestError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
pub enum Source {
    #[serde(rename = "Cam")]
    #[value(name = "cam")]
    Cambridge,
    #[serde(rename = "Dic")]
    #[value(name = "dic")]
    DictionaryCom,
    #[serde(rename = "Col")]
    #[value(name = "col")]
    Collins,
    #[serde(rename = "Oxf")]
    #[value(name = "oxf")]
    Oxford,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::Cambridge,
        Source::DictionaryCom,
        Source::Collins,
        Source::Oxford,
    ];

    /// Tag written as the first token of every output line.
    pub fn tag(self) -> &'static str {
        match self {
            Source::Cambridge => "Cam",
            Source::DictionaryCom => "Dic",
            Source::Collins => "Col",
            Source::Oxford => "Oxf",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Source::Cambridge => "Cambridge",
            Source::DictionaryCom => "dictionary.com",
            Source::Collins => "Collins",
            Source::Oxford => "Oxford",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Source {
    type Err = HarvestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "cam" | "cambridge" => Ok(Source::Cambridge),
            "dic" | "dictionary" | "dictionary.com" => Ok(Source::DictionaryCom),
            "col" | "collins" => Ok(Source::Collins),
            "oxf" | "oxford" => Ok(Source::Oxford),
            _ => Err(HarvestError::InvalidSource(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    #[default]
    All,
}

impl PartOfSpeech {
    pub fn label(self) -> Option<&'static str> {
        match self {
            PartOfSpeech::Noun => Some("noun"),
            PartOfSpeech::Verb => Some("verb"),
            PartOfSpeech::Adjective => Some("adjective"),
            PartOfSpeech::All => None,
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().unwrap_or("all"))
    }
}

impl FromStr for PartOfSpeech {
    type Err = HarvestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "noun" => Ok(PartOfSpeech::Noun),
            "verb" => Ok(PartOfSpeech::Verb),
            "adjective" | "adj" => Ok(PartOfSpeech::Adjective),
            "all" => Ok(PartOfSpeech::All),
            _ => Err(HarvestError::InvalidPartOfSpeech(value.to_string())),
        }
    }
}

/// A successful fetch: at least one fragment for one (source, key) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub source: Source,
    pub key: String,
    pub fragments: Vec<String>,
}

impl FetchResult {
    /// One output record. Whitespace inside fragments collapses to single
    /// spaces so a record never spans two lines.
    pub fn to_line(&self) -> String {
        let mut line = format!("{} {}", self.source.tag(), self.key);
        for word in self.fragments.iter().flat_map(|f| f.split_whitespace()) {
            line.push(' ');
            line.push_str(word);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_source_tag_and_name() {
        assert_eq!("Cam".parse::<Source>().unwrap(), Source::Cambridge);
        assert_eq!("oxford".parse::<Source>().unwrap(), Source::Oxford);
        assert_eq!(" DIC ".parse::<Source>().unwrap(), Source::DictionaryCom);
    }

    #[test]
    fn parse_source_invalid() {
        let err = "Web".parse::<Source>().unwrap_err();
        assert_matches!(err, HarvestError::InvalidSource(_));
    }

    #[test]
    fn fetch_result_line_layout() {
        let result = FetchResult {
            source: Source::Collins,
            key: "wick".to_string(),
            fragments: vec!["string".to_string(), "candle".to_string()],
        };
        assert_eq!(result.to_line(), "Col wick string candle");
    }

    #[test]
    fn line_stays_on_one_line() {
        let result = FetchResult {
            source: Source::Oxford,
            key: "light".to_string(),
            fragments: vec!["the natural\nagent".to_string(), "\t".to_string()],
        };
        assert_eq!(result.to_line(), "Oxf light the natural agent");
    }
}
