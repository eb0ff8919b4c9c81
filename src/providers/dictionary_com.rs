use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{PartOfSpeech, Source};
use crate::error::{FetchFailure, HarvestError};
use crate::providers::http::{HttpSettings, PageClient};
use crate::providers::{PageAdapter, captures, strip_tags};

pub const BASE_URL: &str = "https://www.dictionary.com/browse/";

static SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<section class="css-1sdcacc(.*?)</section>"#).unwrap());
static DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<span class="css-9sn2pa.+?>(.*?)</span>"#).unwrap());
static POS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)class="[^"]*pos">(.*?)</span>"#).unwrap());
static EXAMPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<span class="luna-example.+$"#).unwrap());

pub fn adapter(settings: &HttpSettings) -> Result<PageAdapter, HarvestError> {
    PageAdapter::new(
        Source::DictionaryCom,
        PageClient::new(settings)?,
        BASE_URL,
        extract_definitions,
    )
}

/// One `<section>` per part of speech. Labels such as "verb (used with
/// object)" match the filter by substring.
pub fn extract_definitions(html: &str, pos: PartOfSpeech) -> Result<Vec<String>, FetchFailure> {
    let sections = captures(&SECTION, html);
    let raw: Vec<String> = match pos.label() {
        None => captures(&DEFINITION, &sections.join(" ")),
        Some(label) => sections
            .iter()
            .filter(|section| {
                POS.captures(section)
                    .and_then(|caps| caps.get(1))
                    .is_some_and(|found| found.as_str().contains(label))
            })
            .flat_map(|section| captures(&DEFINITION, section))
            .collect(),
    };
    Ok(raw
        .iter()
        .map(|definition| EXAMPLE.replace(definition, ""))
        .map(|definition| strip_tags(&definition).trim().to_string())
        .filter(|definition| !definition.is_empty())
        .collect())
}
