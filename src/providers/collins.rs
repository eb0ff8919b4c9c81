use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{PartOfSpeech, Source};
use crate::error::{FetchFailure, HarvestError};
use crate::providers::http::{HttpSettings, PageClient};
use crate::providers::{PageAdapter, captures, regions, strip_tags};

pub const BASE_URL: &str = "https://www.collinsdictionary.com/dictionary/english/";

/// Collins rejects requests that do not look like a browser.
const BROWSER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.11 (KHTML, like Gecko) Chrome/23.0.1271.64 Safari/537.11";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

static CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div class="content definitions.+?"(.*?)<div class="div copyright"#).unwrap()
});
static DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<div class="def">(.+?)</div>"#).unwrap());
static SENSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)<div class="hom">"#).unwrap());
static POS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)class="pos">(.*?)</span>"#).unwrap());

pub fn adapter(settings: &HttpSettings) -> Result<PageAdapter, HarvestError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));
    PageAdapter::new(
        Source::Collins,
        PageClient::with_headers(settings, headers)?,
        BASE_URL,
        extract_definitions,
    )
}

/// Senses live in `<div class="hom">` blocks inside the definitions content.
/// Labels like "countable noun" or "transitive verb" match by substring.
pub fn extract_definitions(html: &str, pos: PartOfSpeech) -> Result<Vec<String>, FetchFailure> {
    let content = captures(&CONTENT, html).join(" ");
    let raw: Vec<String> = match pos.label() {
        None => captures(&DEFINITION, &content),
        Some(label) => regions(&content, &SENSE)
            .into_iter()
            .filter(|sense| {
                POS.captures(sense)
                    .and_then(|caps| caps.get(1))
                    .is_some_and(|found| found.as_str().contains(label))
            })
            .flat_map(|sense| captures(&DEFINITION, sense))
            .collect(),
    };
    Ok(raw
        .iter()
        .map(|definition| strip_tags(definition).replace('\n', " ").trim().to_string())
        .filter(|definition| !definition.is_empty())
        .collect())
}
