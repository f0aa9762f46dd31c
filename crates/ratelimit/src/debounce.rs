//! Trailing-edge debouncing
//!
//! Every call cancels the previously scheduled run and schedules a fresh one
//! `wait` later, so only the last call of a burst reaches the action.

use crate::Result;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use steady_core::{Error, Scheduler, TimerHandle};
use tracing::{debug, trace};

/// Debounced wrapper around an action taking `A`
///
/// Clones share the same pending timer.
pub struct Debounced<A> {
    inner: Arc<Inner<A>>,
}

struct Inner<A> {
    action: Arc<dyn Fn(A) + Send + Sync>,
    wait: Duration,
    scheduler: Arc<dyn Scheduler>,
    pending: Mutex<Pending>,
}

#[derive(Default)]
struct Pending {
    /// Bumped on every call; a firing timer only clears its own slot
    generation: u64,
    timer: Option<TimerHandle>,
}

/// Wrap `action` so it runs once `wait` has passed without another call
///
/// Fails with [`Error::InvalidArgument`] when `wait` is zero.
pub fn debounce<A, F>(scheduler: Arc<dyn Scheduler>, wait: Duration, action: F) -> Result<Debounced<A>>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    if wait.is_zero() {
        return Err(Error::invalid("wait", "debounce wait must be greater than zero"));
    }

    debug!(?wait, "Created debounced action");
    Ok(Debounced {
        inner: Arc::new(Inner {
            action: Arc::new(action),
            wait,
            scheduler,
            pending: Mutex::new(Pending::default()),
        }),
    })
}

impl<A: Send + 'static> Debounced<A> {
    /// Schedule the action with `args`, superseding any pending call
    pub fn call(&self, args: A) {
        let mut pending = self.inner.pending.lock();

        if let Some(previous) = pending.timer.take() {
            if self.inner.scheduler.cancel(previous) {
                trace!(timer = previous.id(), "superseded pending call");
            }
        }

        pending.generation += 1;
        let generation = pending.generation;
        let action = Arc::clone(&self.inner.action);
        let owner: Weak<Inner<A>> = Arc::downgrade(&self.inner);

        let timer = self.inner.scheduler.schedule(
            self.inner.wait,
            Box::new(move || {
                if let Some(inner) = owner.upgrade() {
                    let mut pending = inner.pending.lock();
                    if pending.generation == generation {
                        pending.timer = None;
                    }
                }
                action(args);
            }),
        );

        pending.timer = Some(timer);
    }
}

impl<A> Debounced<A> {
    /// Whether a call is waiting for its quiet period
    pub fn is_pending(&self) -> bool {
        self.inner.pending.lock().timer.is_some()
    }

    /// Quiet period this wrapper waits for
    pub fn wait(&self) -> Duration {
        self.inner.wait
    }
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> Drop for Inner<A> {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.get_mut().timer.take() {
            self.scheduler.cancel(timer);
        }
    }
}
