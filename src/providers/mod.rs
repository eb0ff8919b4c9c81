//! Online dictionaries, one module per site.
//!
//! Every site is scraped the same way: download the entry page for a key and
//! run a set of regular expressions over the HTML. Only the patterns and the
//! part-of-speech matching differ, so each module exposes a pure
//! `extract_definitions` function and a constructor for [`PageAdapter`].

pub mod cambridge;
pub mod collins;
pub mod dictionary_com;
pub mod http;
pub mod oxford;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use reqwest::Url;

use crate::adapter::{Cleaned, FetchOutcome, SourceAdapter};
use crate::clean::Cleaner;
use crate::domain::{PartOfSpeech, Source};
use crate::error::{FetchFailure, HarvestError};
use crate::providers::http::{HttpSettings, PageClient, page_url};

pub type Extractor = fn(&str, PartOfSpeech) -> Result<Vec<String>, FetchFailure>;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<.+?>").unwrap());

pub struct PageAdapter {
    source: Source,
    client: PageClient,
    base: Url,
    extract: Extractor,
}

impl PageAdapter {
    pub fn new(
        source: Source,
        client: PageClient,
        base_url: &str,
        extract: Extractor,
    ) -> Result<Self, HarvestError> {
        let base = Url::parse(base_url)
            .map_err(|err| HarvestError::HttpClient(format!("{base_url}: {err}")))?;
        Ok(Self {
            source,
            client,
            base,
            extract,
        })
    }
}

impl SourceAdapter for PageAdapter {
    fn source(&self) -> Source {
        self.source
    }

    fn fetch(&self, key: &str, pos: PartOfSpeech) -> FetchOutcome {
        let url = page_url(&self.base, key)?;
        let html = self.client.get_text(&url)?;
        (self.extract)(&html, pos)
    }
}

pub fn adapter_for(source: Source, settings: &HttpSettings) -> Result<PageAdapter, HarvestError> {
    match source {
        Source::Cambridge => cambridge::adapter(settings),
        Source::DictionaryCom => dictionary_com::adapter(settings),
        Source::Collins => collins::adapter(settings),
        Source::Oxford => oxford::adapter(settings),
    }
}

/// One HTTP adapter per source, each wrapped in the shared cleaner.
pub fn build_adapters(
    sources: &[Source],
    settings: &HttpSettings,
    cleaner: Arc<Cleaner>,
) -> Result<Vec<Arc<dyn SourceAdapter>>, HarvestError> {
    sources
        .iter()
        .map(|source| {
            let adapter = adapter_for(*source, settings)?;
            Ok(Arc::new(Cleaned::new(adapter, Arc::clone(&cleaner))) as Arc<dyn SourceAdapter>)
        })
        .collect()
}

pub(crate) fn strip_tags(fragment: &str) -> String {
    TAG.replace_all(fragment, "").into_owned()
}

/// Splits `html` into the regions that start at each match of `start`; the
/// last region runs to the end of the document.
pub(crate) fn regions<'a>(html: &'a str, start: &Regex) -> Vec<&'a str> {
    let mut offsets: Vec<usize> = start.find_iter(html).map(|m| m.start()).collect();
    offsets.push(html.len());
    offsets
        .windows(2)
        .map(|pair| &html[pair[0]..pair[1]])
        .collect()
}

pub(crate) fn captures(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
