use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    Completed,
    Cancelled,
}

/// Shared stop flag with a broadcast wake-up.
///
/// Triggering drops the only sender of an internal channel, so every thread
/// blocked in `select!` on [`StopSignal::listener`] wakes at once. The first
/// trigger wins; its reason is kept.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

struct StopInner {
    stopped: AtomicBool,
    reason: Mutex<Option<StopReason>>,
    trigger: Mutex<Option<Sender<()>>>,
    listener: Receiver<()>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (trigger, listener) = crossbeam_channel::bounded(0);
        Self {
            inner: Arc::new(StopInner {
                stopped: AtomicBool::new(false),
                reason: Mutex::new(None),
                trigger: Mutex::new(Some(trigger)),
                listener,
            }),
        }
    }

    pub fn trigger(&self, reason: StopReason) {
        {
            let mut current = self
                .inner
                .reason
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if current.is_some() {
                return;
            }
            *current = Some(reason);
        }
        self.inner.stopped.store(true, Ordering::SeqCst);
        let sender = self
            .inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);
        info!(?reason, "stop signal raised");
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    pub fn reason(&self) -> Option<StopReason> {
        *self
            .inner
            .reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Becomes disconnected (ready) once the signal is triggered. Never
    /// carries a message.
    pub fn listener(&self) -> &Receiver<()> {
        &self.inner.listener
    }

    /// Sleeps up to `timeout`; returns `true` as soon as the signal fires.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.inner.listener.recv_timeout(timeout) {
            Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) | Ok(()) => self.is_stopped(),
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
