//! Deferred execution of assistant replies.
//!
//! A [`ReplyScheduler`] runs a one-shot task after a delay and hands back a
//! [`ReplyHandle`] that can cancel it. A cancelled task never runs; a task that
//! already ran is unaffected by `cancel`.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One-shot deferred work.
pub type ReplyTask = Box<dyn FnOnce() + Send + 'static>;

/// Schedules one-shot tasks after a delay.
pub trait ReplyScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: ReplyTask) -> ReplyHandle;
}

// =============================================================================
// ReplyHandle
// =============================================================================

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const FINISHED: u8 = 2;
const CANCELLED: u8 = 3;

/// Cancellation handle for a scheduled task.
///
/// The task and `cancel` race for the single `Pending` state: whichever claims
/// it first wins, so a task is either run or cancelled, never both.
#[derive(Debug, Clone)]
pub struct ReplyHandle {
    state: Arc<AtomicU8>,
}

impl Default for ReplyHandle {
    fn default() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(PENDING)),
        }
    }
}

impl ReplyHandle {
    /// Wrap `task` so it only runs while the returned handle is not cancelled.
    pub fn guard(task: ReplyTask) -> (ReplyHandle, ReplyTask) {
        let handle = ReplyHandle::default();
        let state = Arc::clone(&handle.state);
        let guarded: ReplyTask = Box::new(move || {
            if state
                .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }
            task();
            state.store(FINISHED, Ordering::Release);
        });
        (handle, guarded)
    }

    /// Prevent the task from running. Returns `true` if it had not started,
    /// in which case it never will.
    pub fn cancel(&self) -> bool {
        self.state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    /// The task has started and not yet returned.
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }

    pub fn is_finished(&self) -> bool {
        self.state.load(Ordering::Acquire) == FINISHED
    }

    /// Neither started nor cancelled yet.
    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }
}

// =============================================================================
// TokioScheduler
// =============================================================================

/// Runs tasks on a Tokio runtime after a timer.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: tokio::runtime::Handle,
}

impl TokioScheduler {
    /// Bind to the runtime of the calling context.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn current() -> Self {
        Self {
            runtime: tokio::runtime::Handle::current(),
        }
    }

    pub fn with_handle(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }
}

impl ReplyScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: ReplyTask) -> ReplyHandle {
        let (handle, guarded) = ReplyHandle::guard(task);
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            guarded();
        });
        handle
    }
}

// =============================================================================
// ManualScheduler
// =============================================================================

struct Scheduled {
    due: Duration,
    seq: u64,
    task: ReplyTask,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    next_seq: u64,
    queue: Vec<Scheduled>,
}

/// A scheduler driven by an explicit clock. Nothing runs until
/// [`ManualScheduler::advance`] moves time past a task's due point.
#[derive(Default)]
pub struct ManualScheduler {
    clock: Mutex<ManualClock>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the manual clock.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Tasks queued and not yet due, including cancelled ones.
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// Advance the clock and run every task that became due, in due order
    /// (ties in scheduling order). Returns how many tasks were invoked.
    pub fn advance(&self, by: Duration) -> usize {
        let due = {
            let mut clock = self.lock();
            clock.now += by;
            let now = clock.now;
            let queue = std::mem::take(&mut clock.queue);
            let (mut due, later): (Vec<_>, Vec<_>) = queue.into_iter().partition(|s| s.due <= now);
            clock.queue = later;
            due.sort_by_key(|s| (s.due, s.seq));
            due
        };
        // Run outside the lock so tasks may schedule more work.
        let count = due.len();
        for scheduled in due {
            (scheduled.task)();
        }
        count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualClock> {
        self.clock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ReplyScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: ReplyTask) -> ReplyHandle {
        let (handle, guarded) = ReplyHandle::guard(task);
        let mut clock = self.lock();
        let seq = clock.next_seq;
        clock.next_seq += 1;
        let due = clock.now + delay;
        clock.queue.push(Scheduled {
            due,
            seq,
            task: guarded,
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    fn counter_task(counter: &Arc<AtomicUsize>) -> ReplyTask {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_guarded_task_runs_and_finishes() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (handle, task) = ReplyHandle::guard(counter_task(&counter));
        assert!(handle.is_pending());
        task();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
        assert!(!handle.cancel());
    }

    #[test]
    fn test_cancelled_task_never_runs() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (handle, task) = ReplyHandle::guard(counter_task(&counter));
        assert!(handle.cancel());
        assert!(!handle.cancel());
        task();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(handle.is_cancelled());
        assert!(!handle.is_finished());
    }

    #[test]
    fn test_running_task_cannot_be_cancelled() {
        let observed = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&observed);
        let handle_slot: Arc<Mutex<Option<ReplyHandle>>> = Arc::new(Mutex::new(None));
        let inner = Arc::clone(&handle_slot);
        let (handle, task) = ReplyHandle::guard(Box::new(move || {
            let handle = inner.lock().unwrap().clone().unwrap();
            *slot.lock().unwrap() = Some((handle.is_running(), handle.cancel()));
        }));
        *handle_slot.lock().unwrap() = Some(handle.clone());

        task();
        assert_eq!(*observed.lock().unwrap(), Some((true, false)));
        assert!(handle.is_finished());
        assert!(!handle.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancel_and_run_are_exclusive_across_threads() {
        for _ in 0..500 {
            let ran = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&ran);
            let (handle, task) = ReplyHandle::guard(Box::new(move || {
                flag.store(true, Ordering::SeqCst);
            }));

            let runner = tokio::spawn(async move { task() });
            let canceller = {
                let handle = handle.clone();
                tokio::spawn(async move { handle.cancel() })
            };
            let cancelled = canceller.await.unwrap();
            runner.await.unwrap();

            assert_ne!(cancelled, ran.load(Ordering::SeqCst));
            assert_eq!(cancelled, handle.is_cancelled());
            assert_eq!(!cancelled, handle.is_finished());
        }
    }

    #[test]
    fn test_manual_scheduler_waits_for_due_time() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.schedule(Duration::from_millis(1500), counter_task(&counter));

        assert_eq!(scheduler.advance(Duration::from_millis(1499)), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.advance(Duration::from_millis(1)), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.queued(), 0);
        assert_eq!(scheduler.now(), Duration::from_millis(1500));
    }

    #[test]
    fn test_manual_scheduler_runs_in_due_order() {
        let scheduler = ManualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for (label, delay) in [("late", 300u64), ("early", 100), ("tie-a", 200), ("tie-b", 200)] {
            let order = Arc::clone(&order);
            scheduler.schedule(
                Duration::from_millis(delay),
                Box::new(move || order.lock().unwrap().push(label)),
            );
        }
        scheduler.advance(Duration::from_secs(1));
        assert_eq!(*order.lock().unwrap(), vec!["early", "tie-a", "tie-b", "late"]);
    }

    #[test]
    fn test_manual_scheduler_skips_cancelled() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule(Duration::from_millis(10), counter_task(&counter));
        handle.cancel();
        scheduler.advance(Duration::from_millis(10));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_fires_after_delay() {
        let scheduler = TokioScheduler::current();
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule(Duration::from_millis(1500), counter_task(&counter));

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(handle.is_pending());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_cancel() {
        let scheduler = TokioScheduler::current();
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule(Duration::from_millis(100), counter_task(&counter));
        assert!(handle.cancel());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
