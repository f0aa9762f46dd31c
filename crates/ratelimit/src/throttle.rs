//! Leading-edge throttling
//!
//! The first call runs immediately and opens a cooldown window of `limit`.
//! Calls arriving inside the window are dropped outright: they are neither
//! queued nor replayed when the window closes.

use crate::Result;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use steady_core::{Error, Scheduler, TimerHandle};
use tracing::{debug, trace};

/// Throttled wrapper around an action taking `A`
///
/// Clones share the same cooldown window.
pub struct Throttled<A> {
    inner: Arc<Inner<A>>,
}

struct Inner<A> {
    action: Arc<dyn Fn(A) + Send + Sync>,
    limit: Duration,
    scheduler: Arc<dyn Scheduler>,
    /// Timer that closes the open cooldown window, if any
    window: Mutex<Option<TimerHandle>>,
}

/// Wrap `action` so it runs at most once per `limit`
///
/// Fails with [`Error::InvalidArgument`] when `limit` is zero.
pub fn throttle<A, F>(scheduler: Arc<dyn Scheduler>, limit: Duration, action: F) -> Result<Throttled<A>>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    if limit.is_zero() {
        return Err(Error::invalid("limit", "throttle limit must be greater than zero"));
    }

    debug!(?limit, "Created throttled action");
    Ok(Throttled {
        inner: Arc::new(Inner {
            action: Arc::new(action),
            limit,
            scheduler,
            window: Mutex::new(None),
        }),
    })
}

impl<A: Send + 'static> Throttled<A> {
    /// Run the action now unless a cooldown window is open
    ///
    /// Returns true when the action ran, false when the call was dropped.
    pub fn call(&self, args: A) -> bool {
        {
            let mut window = self.inner.window.lock();
            if window.is_some() {
                trace!("dropped call during cooldown");
                return false;
            }

            // Window opens before the action runs so re-entrant calls are dropped.
            let owner: Weak<Inner<A>> = Arc::downgrade(&self.inner);
            let timer = self.inner.scheduler.schedule(
                self.inner.limit,
                Box::new(move || {
                    if let Some(inner) = owner.upgrade() {
                        *inner.window.lock() = None;
                    }
                }),
            );
            *window = Some(timer);
        }

        (self.inner.action)(args);
        true
    }
}

impl<A> Throttled<A> {
    /// Whether calls are currently being dropped
    pub fn in_cooldown(&self) -> bool {
        self.inner.window.lock().is_some()
    }

    /// Cooldown length
    pub fn limit(&self) -> Duration {
        self.inner.limit
    }
}

impl<A> Clone for Throttled<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> Drop for Inner<A> {
    fn drop(&mut self) {
        if let Some(timer) = self.window.get_mut().take() {
            self.scheduler.cancel(timer);
        }
    }
}
