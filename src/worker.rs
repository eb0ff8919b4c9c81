use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use tracing::{debug, warn};

use crate::adapter::{SourceAdapter, fetch_isolated};
use crate::context::PipelineContext;
use crate::domain::{FetchResult, PartOfSpeech, Source};
use crate::error::HarvestError;
use crate::queue::{DispatchQueue, Take};

/// Everything one fetch worker needs; cloned once per spawned thread.
#[derive(Clone)]
pub struct FetchWorker {
    pub context: Arc<PipelineContext>,
    pub queue: Arc<DispatchQueue>,
    pub adapter: Arc<dyn SourceAdapter>,
    pub pos: PartOfSpeech,
    pub results: Sender<FetchResult>,
}

impl FetchWorker {
    pub fn spawn(self, index: usize) -> Result<JoinHandle<()>, HarvestError> {
        let name = format!("fetch-{}-{index}", self.queue.source().tag());
        thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run())
            .map_err(|err| HarvestError::ThreadSpawn {
                name,
                message: err.to_string(),
            })
    }

    /// Drains the queue until it is exhausted or the run is stopped. A key
    /// that has been taken is always fetched and accounted for, even if the
    /// stop signal fires during the call.
    pub fn run(self) {
        let source = self.queue.source();
        loop {
            // Raised before the take so a key is never outside both its queue
            // and the in-flight gauge.
            self.context.begin_fetch();
            let key = match self.queue.take(self.context.stop()) {
                Take::Key(key) => key,
                Take::Exhausted => {
                    self.context.end_fetch();
                    debug!(%source, "queue exhausted; worker exiting");
                    return;
                }
                Take::Stopped => {
                    self.context.end_fetch();
                    debug!(%source, "stop observed; worker exiting");
                    return;
                }
            };

            self.settle(source, key);
            self.context.end_fetch();
        }
    }

    fn settle(&self, source: Source, key: String) {
        let fragments = match fetch_isolated(self.adapter.as_ref(), &key, self.pos) {
            Ok(fragments) => fragments,
            Err(failure) => {
                debug!(%source, key = %key, error = %failure, "fetch failed");
                Vec::new()
            }
        };

        let success = !fragments.is_empty();
        self.context.record(source, success);
        if !success {
            return;
        }

        let result = FetchResult {
            source,
            key,
            fragments,
        };
        if let Err(err) = self.results.send(result) {
            warn!(%source, key = %err.0.key, "result channel closed; result discarded");
        }
    }
}
