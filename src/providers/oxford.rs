use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{PartOfSpeech, Source};
use crate::error::{FetchFailure, HarvestError};
use crate::providers::http::{HttpSettings, PageClient};
use crate::providers::{PageAdapter, captures, strip_tags};

pub const BASE_URL: &str = "https://en.oxforddictionaries.com/definition/";

static GRAMMAR_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<section class="gramb">(.*?)</section>"#).unwrap());
static DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<span class="ind">(.*?)</span>"#).unwrap());
static POS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)class="pos">(.*?)</span>"#).unwrap());

pub fn adapter(settings: &HttpSettings) -> Result<PageAdapter, HarvestError> {
    PageAdapter::new(
        Source::Oxford,
        PageClient::new(settings)?,
        BASE_URL,
        extract_definitions,
    )
}

/// Every `gramb` section carries exactly one part-of-speech label; a section
/// without one means the page layout changed.
pub fn extract_definitions(html: &str, pos: PartOfSpeech) -> Result<Vec<String>, FetchFailure> {
    let blocks = captures(&GRAMMAR_BLOCK, html);
    let raw: Vec<String> = match pos.label() {
        None => captures(&DEFINITION, &blocks.concat()),
        Some(label) => {
            let mut raw = Vec::new();
            for block in &blocks {
                let found = POS
                    .captures(block)
                    .and_then(|caps| caps.get(1))
                    .ok_or_else(|| {
                        FetchFailure::Structure("grammar block without part of speech".to_string())
                    })?;
                if found.as_str().trim() == label {
                    raw.extend(captures(&DEFINITION, block));
                }
            }
            raw
        }
    };
    Ok(raw
        .iter()
        .map(|definition| strip_tags(definition).trim().to_string())
        .filter(|definition| !definition.is_empty())
        .collect())
}
