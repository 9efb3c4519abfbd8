//! One-shot scheduling primitive.
//!
//! The monitor never uses a fixed-period interval: every poll computes its
//! own delay and re-arms a fresh one-shot. A [`TimerHandle`] is the only way
//! to cancel a scheduled callback. Dropping the handle detaches the timer
//! rather than cancelling it, so a callback may replace its own handle while
//! it runs.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Handle to a scheduled one-shot callback.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Cancel the callback if it has not started yet.
    pub fn cancel(self) {
        self.task.abort();
    }

    /// Whether the callback has run or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Run `callback` once after `delay` on `runtime`.
pub fn schedule<F>(runtime: &Handle, delay: Duration, callback: F) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    // deadline is fixed now, not when the task is first polled
    let deadline = Instant::now() + delay;
    let task = runtime.spawn(async move {
        tokio::time::sleep_until(deadline).await;
        callback();
    });
    TimerHandle { task }
}
