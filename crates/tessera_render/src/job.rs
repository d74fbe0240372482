//! Job executors for render work.

use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

/// Unit of render work handed to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs render jobs somewhere.
pub trait JobExecutor {
    /// Schedules `job`. It may run before this call returns.
    fn execute(&self, job: Job);
}

/// Runs every job immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl JobExecutor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}

/// Runs each job on its own OS thread until [`ThreadExecutor::wait`].
#[derive(Debug, Default)]
pub struct ThreadExecutor {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadExecutor {
    /// Creates an executor with no jobs in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs spawned and not yet joined.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.handles.lock().len()
    }

    /// Joins every spawned job. Returns how many completed without panicking.
    pub fn wait(&self) -> usize {
        let handles = std::mem::take(&mut *self.handles.lock());
        let mut completed = 0;
        for handle in handles {
            match handle.join() {
                Ok(()) => completed += 1,
                Err(_) => tracing::error!("render job panicked"),
            }
        }
        completed
    }
}

impl JobExecutor for ThreadExecutor {
    fn execute(&self, job: Job) {
        let handle = thread::spawn(job);
        self.handles.lock().push(handle);
    }
}

impl Drop for ThreadExecutor {
    fn drop(&mut self) {
        self.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_inline_runs_immediately() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        InlineExecutor.execute(Box::new(move || {
            seen.fetch_add(1, Ordering::Relaxed);
        }));
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_thread_executor_joins() {
        let executor = ThreadExecutor::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let seen = Arc::clone(&counter);
            executor.execute(Box::new(move || {
                seen.fetch_add(1, Ordering::Relaxed);
            }));
        }

        assert_eq!(executor.wait(), 8);
        assert_eq!(executor.pending(), 0);
        assert_eq!(counter.load(Ordering::Relaxed), 8);
    }
}
