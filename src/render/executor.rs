use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{SlideError, SlideResult};

/// Cooperative cancellation flag shared between a task handle and its job.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub enum JobOutcome<T> {
    Done(T),
    /// Cancelled before it ran or before it could publish. Never an error.
    Cancelled,
    /// The job panicked. Carries the panic message.
    Panicked(String),
}

/// Fixed-capacity pool for synchronous rasterization jobs.
///
/// Submissions beyond `capacity` wait in the pool's queue and start in submission order.
pub struct BoundedExecutor {
    pool: rayon::ThreadPool,
    capacity: usize,
}

impl BoundedExecutor {
    pub fn new(capacity: usize) -> SlideResult<Self> {
        if capacity == 0 {
            return Err(SlideError::validation("executor capacity must be >= 1"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(capacity)
            .thread_name(|i| format!("slide-render-{i}"))
            .build()
            .map_err(|e| SlideError::render(format!("failed to build render thread pool: {e}")))?;
        Ok(Self { pool, capacity })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queue `work`. `deliver` is called exactly once, on the worker thread, with the result,
    /// with [`JobOutcome::Cancelled`] when `cancel` was raised before the job started or before
    /// it finished, or with [`JobOutcome::Panicked`] when `work` panicked.
    pub fn submit<T, W, D>(&self, cancel: CancelFlag, work: W, deliver: D)
    where
        T: Send + 'static,
        W: FnOnce() -> T + Send + 'static,
        D: FnOnce(JobOutcome<T>) + Send + 'static,
    {
        self.pool.spawn_fifo(move || {
            if cancel.is_cancelled() {
                deliver(JobOutcome::Cancelled);
                return;
            }
            let out = match panic::catch_unwind(AssertUnwindSafe(work)) {
                Ok(out) => out,
                Err(payload) => {
                    deliver(JobOutcome::Panicked(panic_message(payload.as_ref())));
                    return;
                }
            };
            if cancel.is_cancelled() {
                deliver(JobOutcome::Cancelled);
                return;
            }
            deliver(JobOutcome::Done(out));
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/executor.rs"]
mod tests;
