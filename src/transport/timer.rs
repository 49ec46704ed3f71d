//! Cancellable one-shot timers.
//!
//! A [`Timer`] owns at most one armed callback. Scheduling replaces the
//! previous callback and cancelling disarms it; both take effect before the
//! call returns, even though the underlying tokio task is only aborted
//! asynchronously. Every arming gets a generation number and a woken task
//! fires only if its generation is still current.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::core::lock;

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

/// Owned, replaceable timer handle.
///
/// Dropping the timer cancels it.
#[derive(Debug)]
pub struct Timer {
    slot: Arc<Mutex<Slot>>,
    runtime: Handle,
}

impl Timer {
    /// Create a disarmed timer whose callbacks run on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
            runtime,
        }
    }

    /// Cancel any armed callback, then arm `callback` to run after `delay`.
    pub fn schedule<F>(&self, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        slot.generation = slot.generation.wrapping_add(1);
        if let Some(task) = slot.task.take() {
            task.abort();
        }

        let armed = slot.generation;
        let shared = Arc::clone(&self.slot);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slot = lock(&shared);
                if slot.generation != armed {
                    return;
                }
                slot.task = None;
            }
            callback();
        });
        slot.task = Some(task);
    }

    /// Disarm the timer. A cancelled callback never runs.
    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        slot.generation = slot.generation.wrapping_add(1);
        if let Some(task) = slot.task.take() {
            task.abort();
        }
    }

    /// Check if a callback is armed and has not fired yet.
    pub fn is_armed(&self) -> bool {
        lock(&self.slot).task.is_some()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
