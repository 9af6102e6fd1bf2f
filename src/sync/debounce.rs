use crate::{
    prelude::{Duration, Future},
    runtime::{async_delay, spawn, AsyncHandle},
};

/// Coalesces bursts of triggers into a single delayed action.
///
/// Every [`schedule`](Self::schedule) rearms one timer; only the most recent
/// action runs, once `delay` passes without another call. When the timer
/// fires the action is spawned as its own task, so rearming or cancelling
/// later never interrupts an action that already started.
pub struct DebounceScheduler {
    delay: Duration,
    timer: Option<Box<dyn AsyncHandle>>,
}

impl DebounceScheduler {
    pub fn new(delay: Duration) -> Self {
        Self { delay, timer: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule<F, Fut>(&mut self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.timer = Some(spawn(async move {
            async_delay(delay).await;
            // Detach: the action outlives this timer.
            drop(spawn(action()));
        }));
    }

    /// Drops the pending action, if any, without running it
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            if !timer.is_finished() {
                timer.cancel();
                log::trace!("debounce timer cancelled");
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.timer
            .as_ref()
            .map(|timer| !timer.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_only_the_last_action() {
        let runs = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = DebounceScheduler::new(Duration::from_millis(300));

        for n in 0..5 {
            let runs = runs.clone();
            scheduler.schedule(move || async move {
                runs.lock().unwrap().push(n);
            });
            async_delay(Duration::from_millis(100)).await;
        }
        assert!(scheduler.is_pending());
        assert!(runs.lock().unwrap().is_empty());

        async_delay(Duration::from_millis(250)).await;
        assert_eq!(*runs.lock().unwrap(), vec![4]);
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_execution() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = DebounceScheduler::new(Duration::from_millis(300));

        let counter = count.clone();
        scheduler.schedule(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        scheduler.cancel();
        assert!(!scheduler.is_pending());

        async_delay(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_does_not_abort_running_action() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut scheduler = DebounceScheduler::new(Duration::from_millis(100));

        let done = finished.clone();
        scheduler.schedule(move || async move {
            async_delay(Duration::from_millis(1_000)).await;
            done.fetch_add(1, Ordering::SeqCst);
        });
        // first action starts at 100ms and is still sleeping when we rearm
        async_delay(Duration::from_millis(150)).await;
        scheduler.schedule(|| async {});

        async_delay(Duration::from_millis(1_000)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
