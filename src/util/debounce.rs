//! Fixed-delay debouncing for interactive inputs: each new input cancels the
//! pending timer and schedules a fresh one, so only the last value in a burst
//! triggers work. This cancels the scheduling only; an already-dispatched
//! call keeps running, and a slow response can still race a newer one.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Default delay, in the 300-400ms band interactive search uses.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(350);

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedules `task` after the delay, cancelling whatever was pending.
    pub fn call<F, Fut>(&mut self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            task().await;
        }));
    }

    /// Drops the pending timer without running it.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
