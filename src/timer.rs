//! One-shot delayed tasks on a dedicated timer runtime
//!
//! Used for the stage-music hand-off: a few seconds after a level starts the
//! intro sting is swapped for the background loop. At most one task is
//! pending at a time; scheduling a new one supersedes the old.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tokio::task::AbortHandle;

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const DONE: u8 = 2;
const CANCELLED: u8 = 3;

/// Handle to a scheduled task
#[derive(Debug, Clone)]
pub struct TaskHandle {
    state: Arc<AtomicU8>,
    abort: Option<Arc<AbortHandle>>,
}

impl TaskHandle {
    /// Handle for a task that was never accepted
    fn rejected() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(CANCELLED)),
            abort: None,
        }
    }

    /// Cancel if the task hasn't started. Returns true if this call cancelled it.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if cancelled {
            if let Some(abort) = &self.abort {
                abort.abort();
            }
        }
        cancelled
    }

    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }

    pub fn is_done(&self) -> bool {
        self.state.load(Ordering::Acquire) == DONE
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }
}

/// Single-worker scheduler for cancellable one-shot tasks
pub struct DelayedTaskScheduler {
    runtime: Option<Runtime>,
    pending: Option<TaskHandle>,
}

impl Default for DelayedTaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayedTaskScheduler {
    pub fn new() -> Self {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("stage-timer")
            .enable_time()
            .build();

        match runtime {
            Ok(runtime) => Self {
                runtime: Some(runtime),
                pending: None,
            },
            Err(e) => {
                // Tasks scheduled on a scheduler without a runtime never run
                log::warn!("Failed to start timer runtime: {e}");
                Self {
                    runtime: None,
                    pending: None,
                }
            }
        }
    }

    /// Run `task` after `delay`, replacing any task still waiting
    pub fn schedule<F>(&mut self, delay: Duration, task: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(previous) = self.pending.take() {
            previous.cancel();
        }

        let Some(runtime) = &self.runtime else {
            log::warn!("Timer runtime not running; task dropped");
            return TaskHandle::rejected();
        };

        let state = Arc::new(AtomicU8::new(PENDING));
        let task_state = Arc::clone(&state);
        let join = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if task_state
                .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                task();
                task_state.store(DONE, Ordering::Release);
            }
        });

        let handle = TaskHandle {
            state,
            abort: Some(Arc::new(join.abort_handle())),
        };
        self.pending = Some(handle.clone());
        handle
    }

    pub fn is_running(&self) -> bool {
        self.runtime.is_some()
    }

    /// Stop the runtime, waiting at most `timeout`.
    ///
    /// A pending task is discarded. A task still running past the timeout is
    /// left to finish on its own thread.
    pub fn shutdown(&mut self, timeout: Duration) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(timeout);
            log::info!("Timer runtime stopped");
        }
    }
}

impl Drop for DelayedTaskScheduler {
    fn drop(&mut self) {
        self.shutdown(Duration::from_secs(2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Instant;

    fn wait_until(cond: impl Fn() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(2) {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_task_runs_after_delay() {
        let mut scheduler = DelayedTaskScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let handle = scheduler.schedule(Duration::from_millis(20), move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert!(wait_until(|| handle.is_done()));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!handle.cancel());
    }

    #[test]
    fn test_cancel_prevents_run() {
        let mut scheduler = DelayedTaskScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let handle = scheduler.schedule(Duration::from_millis(50), move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert!(handle.cancel());
        assert!(handle.is_cancelled());
        thread::sleep(Duration::from_millis(120));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_new_task_supersedes_pending() {
        let mut scheduler = DelayedTaskScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h1 = Arc::clone(&hits);
        let first = scheduler.schedule(Duration::from_secs(10), move || {
            h1.fetch_add(10, Ordering::SeqCst);
        });
        let h2 = Arc::clone(&hits);
        let second = scheduler.schedule(Duration::from_millis(10), move || {
            h2.fetch_add(1, Ordering::SeqCst);
        });
        assert!(wait_until(|| second.is_done()));
        assert!(first.is_cancelled());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shutdown_discards_pending() {
        let mut scheduler = DelayedTaskScheduler::new();
        let handle = scheduler.schedule(Duration::from_secs(10), || {});
        let start = Instant::now();
        scheduler.shutdown(Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(!scheduler.is_running());
        assert!(handle.is_cancelled());
        // Scheduling after shutdown is a no-op
        let late = scheduler.schedule(Duration::from_millis(1), || {});
        assert!(late.is_cancelled());
    }
}
