//! Completion barrier: fan-in point for the dispatcher.
//!
//! The barrier is armed with the number of launched units. Each unit owns one
//! [`CompletionGuard`] and the guard signals when it is dropped, so a unit
//! signals exactly once whether it returns normally, bails out on an error,
//! or unwinds from a panic. [`CompletionBarrier::wait`] resolves once the
//! outstanding count reaches zero.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::error;

/// Counts outstanding units and wakes waiters when the last one signals.
#[derive(Debug)]
pub struct CompletionBarrier {
    outstanding: AtomicUsize,
    done: Notify,
}

/// Returned when a barrier is signalled more often than it was armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverSignalled;

impl CompletionBarrier {
    /// A barrier waiting for `count` signals.
    pub fn new(count: usize) -> Arc<Self> {
        Arc::new(Self {
            outstanding: AtomicUsize::new(count),
            done: Notify::new(),
        })
    }

    /// Signals still expected.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Record one finished unit.
    ///
    /// The count never drops below zero: a signal beyond the armed count is
    /// rejected and leaves the barrier untouched.
    pub fn signal(&self) -> Result<(), OverSignalled> {
        let previous = self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .map_err(|_| OverSignalled)?;
        if previous == 1 {
            self.done.notify_waiters();
        }
        Ok(())
    }

    /// Hand out the guard a unit holds for its whole lifetime.
    pub fn guard(self: &Arc<Self>) -> CompletionGuard {
        CompletionGuard {
            barrier: Arc::clone(self),
        }
    }

    /// Resolve once every armed unit has signalled.
    pub async fn wait(&self) {
        loop {
            // Register interest before checking, so a signal landing between
            // the check and the await still wakes us.
            let notified = self.done.notified();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Signals its barrier exactly once, when dropped.
#[derive(Debug)]
pub struct CompletionGuard {
    barrier: Arc<CompletionBarrier>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self.barrier.signal().is_err() {
            error!("Completion barrier signalled more times than units were launched");
        }
    }
}
