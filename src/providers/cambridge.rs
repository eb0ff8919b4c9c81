use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{PartOfSpeech, Source};
use crate::error::{FetchFailure, HarvestError};
use crate::providers::http::{HttpSettings, PageClient};
use crate::providers::{PageAdapter, captures, regions, strip_tags};

pub const BASE_URL: &str = "https://dictionary.cambridge.org/dictionary/english/";

static DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<(?:b|div) class="def(?:\s[^"]*)?">(.*?)</(?:b|div)>"#).unwrap()
});
static ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<div class="entry-body__el[\s"]"#).unwrap());
static POS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)class="pos(?:\s[^"]*)?"[^>]*>(.*?)</span>"#).unwrap());

pub fn adapter(settings: &HttpSettings) -> Result<PageAdapter, HarvestError> {
    PageAdapter::new(
        Source::Cambridge,
        PageClient::new(settings)?,
        BASE_URL,
        extract_definitions,
    )
}

/// Entries are split on `entry-body__el` blocks; an entry is kept when its
/// part-of-speech label equals the filter exactly. Entries without a label
/// (irregular plurals, for one) are skipped under a filter.
pub fn extract_definitions(html: &str, pos: PartOfSpeech) -> Result<Vec<String>, FetchFailure> {
    let raw = match pos.label() {
        None => captures(&DEFINITION, html),
        Some(label) => regions(html, &ENTRY)
            .into_iter()
            .filter(|entry| {
                POS.captures(entry)
                    .and_then(|caps| caps.get(1))
                    .is_some_and(|found| strip_tags(found.as_str()).trim() == label)
            })
            .flat_map(|entry| captures(&DEFINITION, entry))
            .collect(),
    };
    Ok(raw
        .iter()
        .map(|definition| strip_tags(definition).trim().to_string())
        .filter(|definition| !definition.is_empty())
        .collect())
}
