use std::thread;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::error::{FetchFailure, HarvestError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: usize = 2;
pub const DEFAULT_USER_AGENT: &str = concat!("dict-harvest/", env!("CARGO_PKG_VERSION"));
const BASE_DELAY_MS: u64 = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
    /// Extra attempts for 429/5xx and connection errors within one fetch.
    pub max_retries: usize,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Blocking HTML page fetcher shared by the dictionary adapters.
#[derive(Clone)]
pub struct PageClient {
    client: Client,
    max_retries: usize,
}

impl PageClient {
    pub fn new(settings: &HttpSettings) -> Result<Self, HarvestError> {
        Self::with_headers(settings, HeaderMap::new())
    }

    /// `headers` win over the configured user agent when both set one.
    pub fn with_headers(
        settings: &HttpSettings,
        mut headers: HeaderMap,
    ) -> Result<Self, HarvestError> {
        if !headers.contains_key(USER_AGENT) {
            headers.insert(
                USER_AGENT,
                HeaderValue::from_str(&settings.user_agent)
                    .map_err(|err| HarvestError::HttpClient(err.to_string()))?,
            );
        }
        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| HarvestError::HttpClient(err.to_string()))?;
        Ok(Self {
            client,
            max_retries: settings.max_retries,
        })
    }

    pub fn get_text(&self, url: &Url) -> Result<String, FetchFailure> {
        let response = self.send_with_retries(|| self.client.get(url.clone()))?;
        let response = handle_status(response)?;
        response
            .text()
            .map_err(|err| FetchFailure::Decode(err.to_string()))
    }

    fn send_with_retries<F>(&self, mut make_req: F) -> Result<Response, FetchFailure>
    where
        F: FnMut() -> RequestBuilder,
    {
        let mut attempt = 0usize;
        loop {
            match make_req().send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < self.max_retries && is_retryable_status(status) {
                        debug!(status, attempt, "retrying request");
                        backoff(attempt);
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < self.max_retries && is_retryable_error(&err) {
                        debug!(error = %err, attempt, "retrying request");
                        backoff(attempt);
                        attempt += 1;
                        continue;
                    }
                    return Err(FetchFailure::Network(err.to_string()));
                }
            }
        }
    }
}

/// Appends `key` to `base` as one percent-encoded path segment.
pub fn page_url(base: &Url, key: &str) -> Result<Url, FetchFailure> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| FetchFailure::Structure(format!("{base} cannot carry a path")))?
        .pop_if_empty()
        .push(key);
    Ok(url)
}

fn handle_status(response: Response) -> Result<Response, FetchFailure> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(FetchFailure::Http {
        status: response.status().as_u16(),
    })
}

fn backoff(attempt: usize) {
    thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
