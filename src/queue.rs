use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, select};

use crate::checkpoint::Checkpoint;
use crate::domain::Source;
use crate::shutdown::StopSignal;
use crate::vocabulary::Vocabulary;

/// Pending keys for one source.
///
/// Backed by an unbounded channel so every key is handed to exactly one
/// taker. The queue keeps its own sender until [`DispatchQueue::seal`]; after
/// that, an empty queue reports exhaustion instead of blocking.
pub struct DispatchQueue {
    source: Source,
    sender: Mutex<Option<Sender<String>>>,
    receiver: Receiver<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Take {
    Key(String),
    Exhausted,
    Stopped,
}

impl DispatchQueue {
    pub fn new(source: Source) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            source,
            sender: Mutex::new(Some(sender)),
            receiver,
        }
    }

    /// Builds a sealed queue holding every vocabulary key the checkpoint has
    /// not seen for `source`. Returns the queue and the number of keys skipped.
    pub fn populate(
        source: Source,
        vocabulary: &Vocabulary,
        checkpoint: &Checkpoint,
    ) -> (Self, usize) {
        let queue = Self::new(source);
        let mut skipped = 0usize;
        for key in vocabulary.iter() {
            if checkpoint.contains(source, key) {
                skipped += 1;
                continue;
            }
            queue.push(key);
        }
        queue.seal();
        (queue, skipped)
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Returns `false` if the queue was already sealed.
    pub fn push(&self, key: &str) -> bool {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(sender) => sender.send(key.to_string()).is_ok(),
            None => false,
        }
    }

    pub fn seal(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Blocks until a key is available, the queue is sealed and drained, or
    /// the stop signal fires. Stop is checked first so a stopped worker never
    /// starts new work.
    pub fn take(&self, stop: &StopSignal) -> Take {
        if stop.is_stopped() {
            return Take::Stopped;
        }
        select! {
            recv(self.receiver) -> msg => match msg {
                Ok(key) => Take::Key(key),
                Err(_) => Take::Exhausted,
            },
            recv(stop.listener()) -> _ => Take::Stopped,
        }
    }
}
