use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

/// Runs only the last job submitted within `delay` of the previous one.
#[derive(Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    pub fn call<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = self.delay;
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(prev) = pending.take() {
            prev.abort();
        }

        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            job();
        }));
    }

    pub fn cancel(&self) {
        if let Some(prev) = self.pending.lock().unwrap_or_else(|p| p.into_inner()).take() {
            prev.abort();
        }
    }
}
