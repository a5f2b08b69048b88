use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(200);

#[derive(Debug)]
struct Pending {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct Slot {
    next_id: u64,
    pending: Option<Pending>,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<Slot>,
    idle: Notify,
}

impl Shared {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// 任務結束、被中止或 panic 時都會觸發
struct Completion {
    shared: Arc<Shared>,
    id: u64,
}

impl Drop for Completion {
    fn drop(&mut self) {
        if std::thread::panicking() {
            tracing::warn!("⚠️ Scheduled update panicked");
        }
        {
            let mut slot = self.shared.lock_slot();
            if slot.pending.as_ref().is_some_and(|p| p.id == self.id) {
                slot.pending = None;
            }
        }
        self.shared.idle.notify_waiters();
    }
}

/// Debounces recompute requests: each `schedule` aborts the pending task and
/// starts a new quiet period, so only the last task of a burst runs.
#[derive(Debug)]
pub struct UpdateScheduler {
    quiet: Duration,
    shared: Arc<Shared>,
}

impl UpdateScheduler {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let quiet = self.quiet;
        let previous = {
            // 持有鎖直到新任務登記完成，任務的 Completion 才能看到自己的 id
            let mut slot = self.shared.lock_slot();
            slot.next_id += 1;
            let completion = Completion {
                shared: Arc::clone(&self.shared),
                id: slot.next_id,
            };
            let handle = tokio::spawn(async move {
                let _completion = completion;
                tokio::time::sleep(quiet).await;
                task.await;
            });
            let id = slot.next_id;
            slot.pending.replace(Pending { id, handle })
        };

        if let Some(previous) = previous {
            previous.handle.abort();
        }
    }

    pub fn cancel(&self) {
        let previous = self.shared.lock_slot().pending.take();
        if let Some(previous) = previous {
            previous.handle.abort();
        }
        self.shared.idle.notify_waiters();
    }

    pub fn is_pending(&self) -> bool {
        self.shared.lock_slot().pending.is_some()
    }

    /// Waits until no scheduled task is outstanding. The pending handle stays
    /// in place, so a concurrent `schedule` still aborts it.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.is_pending() {
                break;
            }
            notified.await;
        }
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl Drop for UpdateScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_once() {
        let scheduler = UpdateScheduler::default();
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let runs = Arc::clone(&runs);
            scheduler.schedule(async move {
                runs.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_pending());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_observes_state_at_execution() {
        let scheduler = UpdateScheduler::new(Duration::from_millis(200));
        let state = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(AtomicUsize::new(usize::MAX));

        for value in 1..=3 {
            state.store(value, Ordering::SeqCst);
            let state = Arc::clone(&state);
            let seen = Arc::clone(&seen);
            scheduler.schedule(async move {
                seen.store(state.load(Ordering::SeqCst), Ordering::SeqCst);
            });
        }
        // 最後一次排程後才改變狀態
        state.store(7, Ordering::SeqCst);

        scheduler.wait_idle().await;
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_each_run() {
        let scheduler = UpdateScheduler::new(Duration::from_millis(200));
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let r = Arc::clone(&runs);
            scheduler.schedule(async move {
                r.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_task() {
        let scheduler = UpdateScheduler::default();
        let runs = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&runs);
        scheduler.schedule(async move {
            r.fetch_add(1, Ordering::SeqCst);
        });
        scheduler.cancel();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        scheduler.wait_idle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_while_waiting_still_debounces() {
        let scheduler = Arc::new(UpdateScheduler::new(Duration::from_millis(200)));
        let runs = Arc::new(AtomicUsize::new(0));

        let r = Arc::clone(&runs);
        scheduler.schedule(async move {
            r.fetch_add(1, Ordering::SeqCst);
        });

        let waiter = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.wait_idle().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let r = Arc::clone(&runs);
        scheduler.schedule(async move {
            r.fetch_add(1, Ordering::SeqCst);
        });

        waiter.await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_idle_returns_after_panicking_task() {
        let scheduler = UpdateScheduler::new(Duration::from_millis(10));
        scheduler.schedule(async {
            panic!("boom");
        });
        scheduler.wait_idle().await;
        assert!(!scheduler.is_pending());
    }
}
