use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::clean::Cleaner;
use crate::domain::{PartOfSpeech, Source};
use crate::error::FetchFailure;

pub type FetchOutcome = Result<Vec<String>, FetchFailure>;

/// Turns one key into fragments for a single source.
///
/// Implementations block for the whole request; the pipeline runs each call
/// on its own worker thread. An empty `Ok` is a valid answer (nothing found)
/// and is counted as a request without a success.
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    fn fetch(&self, key: &str, pos: PartOfSpeech) -> FetchOutcome;
}

/// Runs `adapter.fetch`, turning a panic into [`FetchFailure::Panicked`] so
/// one faulty call cannot take its worker down.
pub fn fetch_isolated(adapter: &dyn SourceAdapter, key: &str, pos: PartOfSpeech) -> FetchOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| adapter.fetch(key, pos))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|value| value.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(FetchFailure::Panicked(message))
        }
    }
}

/// Applies the definition cleaner to whatever the inner adapter returns.
pub struct Cleaned<A> {
    inner: A,
    cleaner: Arc<Cleaner>,
}

impl<A: SourceAdapter> Cleaned<A> {
    pub fn new(inner: A, cleaner: Arc<Cleaner>) -> Self {
        Self { inner, cleaner }
    }
}

impl<A: SourceAdapter> SourceAdapter for Cleaned<A> {
    fn source(&self) -> Source {
        self.inner.source()
    }

    fn fetch(&self, key: &str, pos: PartOfSpeech) -> FetchOutcome {
        let definitions = self.inner.fetch(key, pos)?;
        Ok(self.cleaner.clean(&definitions))
    }
}
