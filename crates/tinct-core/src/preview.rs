//! Trailing-edge debouncing for live preview writes.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// Runs only the last of a burst of scheduled tasks.
///
/// Each `schedule` aborts the task still waiting from the previous call and
/// starts a new timer. Dropping the debouncer or calling `cancel` aborts the
/// waiting task, so nothing fires after teardown.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `task` after the delay unless another call comes first.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Aborts the waiting task, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                trace!("Cancelling pending preview");
            }
            handle.abort();
        }
    }

    /// True while a scheduled task has not finished.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_task(counter: &Arc<AtomicUsize>, value: usize) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.store(value, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_last_task_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        for i in 1..=5 {
            debouncer.schedule(counter_task(&fired, i));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 5);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_write() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        debouncer.schedule(counter_task(&fired, 1));
        debouncer.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let mut debouncer = Debouncer::new(Duration::from_millis(300));
            debouncer.schedule(counter_task(&fired, 1));
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
