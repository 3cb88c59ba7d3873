use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use uuid::Uuid;

/// Cancellable one-slot timer for the debounced context sync.
///
/// At most one task is pending at a time: scheduling replaces and aborts any
/// timer still waiting, so the "single PendingSync" rule holds structurally
/// instead of by manual handle bookkeeping. Once the quiet period elapses the
/// task is detached onto its own tokio task, so a later `schedule` or
/// `cancel` can only ever kill a timer, never work already dispatched.
#[derive(Debug, Default)]
pub struct DebounceScheduler {
    pending: Mutex<Option<Pending>>,
}

#[derive(Debug)]
struct Pending {
    token: Uuid,
    handle: JoinHandle<()>,
}

impl DebounceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `task` to run after `delay`, superseding any pending timer.
    /// Returns a token identifying this timer.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> Uuid
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = Uuid::new_v4();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(task);
        });

        let mut pending = self.pending.lock().expect("scheduler lock poisoned");
        if let Some(prev) = pending.replace(Pending { token, handle }) {
            prev.handle.abort();
        }
        token
    }

    /// Cancels the pending timer, if one is still waiting to fire. Returns
    /// whether a live timer was cancelled.
    pub fn cancel(&self) -> bool {
        let mut pending = self.pending.lock().expect("scheduler lock poisoned");
        match pending.take() {
            Some(prev) => {
                let live = !prev.handle.is_finished();
                prev.handle.abort();
                live
            }
            None => false,
        }
    }

    /// True while a scheduled task is waiting for its quiet period to elapse.
    pub fn is_scheduled(&self) -> bool {
        self.pending
            .lock()
            .expect("scheduler lock poisoned")
            .as_ref()
            .map(|p| !p.handle.is_finished())
            .unwrap_or(false)
    }

    /// Token of the pending timer, if any.
    pub fn pending_token(&self) -> Option<Uuid> {
        self.pending
            .lock()
            .expect("scheduler lock poisoned")
            .as_ref()
            .filter(|p| !p.handle.is_finished())
            .map(|p| p.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Lets timer tasks and their detached payloads run to completion on the
    /// current-thread test runtime.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let scheduler = DebounceScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        scheduler.schedule(Duration::from_millis(1000), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(scheduler.is_scheduled());

        tokio::time::advance(Duration::from_millis(1100)).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_supersedes_pending_timer() {
        let scheduler = DebounceScheduler::new();
        let fired = Arc::new(Mutex::new(Vec::new()));

        let sink = fired.clone();
        let first = scheduler.schedule(Duration::from_millis(1000), async move {
            sink.lock().unwrap().push("first");
        });

        tokio::time::advance(Duration::from_millis(200)).await;

        let sink = fired.clone();
        let second = scheduler.schedule(Duration::from_millis(1000), async move {
            sink.lock().unwrap().push("second");
        });
        assert_ne!(first, second);
        assert_eq!(scheduler.pending_token(), Some(second));

        tokio::time::advance(Duration::from_millis(1100)).await;
        settle().await;

        assert_eq!(*fired.lock().unwrap(), vec!["second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let scheduler = DebounceScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        scheduler.schedule(Duration::from_millis(1000), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(scheduler.cancel());
        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!scheduler.is_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_reports_no_live_timer() {
        let scheduler = DebounceScheduler::new();

        scheduler.schedule(Duration::from_millis(10), async {});
        tokio::time::advance(Duration::from_millis(50)).await;
        settle().await;

        assert!(!scheduler.cancel());
        assert!(!scheduler.cancel());
    }
}
