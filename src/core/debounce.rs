//! Trailing-edge debouncing of raw input into committed values.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Coalesces bursts of values into a single commit sent once `delay` has
/// elapsed without a newer value.
///
/// Every call to [`Debouncer::schedule`] cancels the pending timer before
/// arming a new one. Once [`Debouncer::cancel`] returns, or the debouncer is
/// dropped, a pending commit can no longer be delivered.
pub struct Debouncer<T> {
    delay: Duration,
    generation: Arc<Mutex<u64>>,
    timer: Option<JoinHandle<()>>,
    commits: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (commits, receiver) = mpsc::unbounded_channel();
        let debouncer = Self {
            delay,
            generation: Arc::new(Mutex::new(0)),
            timer: None,
            commits,
        };
        (debouncer, receiver)
    }

    pub fn schedule(&mut self, value: T) {
        let armed = self.cancel();
        let delay = self.delay;
        let generation = Arc::clone(&self.generation);
        let commits = self.commits.clone();

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let current = generation.lock().unwrap_or_else(PoisonError::into_inner);
            if *current == armed && commits.send(value).is_ok() {
                debug!("Debounce window elapsed, value committed");
            }
        }));
    }

    /// Disarms the pending timer, if any, and returns the new generation.
    pub fn cancel(&mut self) -> u64 {
        let mut current = self
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *current += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        *current
    }

    pub fn is_pending(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let mut current = self
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *current += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
