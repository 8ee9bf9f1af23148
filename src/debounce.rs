//! Cancellable, revision-tagged debounce timer

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Delays an action until input pauses.
///
/// Each [`Debouncer::schedule`] call bumps the revision, aborts the pending
/// timer and starts a new one. When a timer elapses it sends the event built
/// for its revision; the receiver confirms it with [`Debouncer::fire`], which
/// only accepts the latest revision.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    revision: u64,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            revision: 0,
            pending: None,
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether a timer has been scheduled and not yet fired or cancelled
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Restart the timer; `make` builds the event sent when it elapses
    pub fn schedule<T, F>(&mut self, tx: UnboundedSender<T>, make: F) -> u64
    where
        T: Send + 'static,
        F: FnOnce(u64) -> T + Send + 'static,
    {
        self.cancel();
        self.revision += 1;
        let revision = self.revision;
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the session ended
            let _ = tx.send(make(revision));
        }));
        revision
    }

    /// Abort the pending timer, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Accept an elapsed timer; false for superseded revisions
    pub fn fire(&mut self, revision: u64) -> bool {
        if revision != self.revision || self.pending.is_none() {
            return false;
        }
        self.pending = None;
        true
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
