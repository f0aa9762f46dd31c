//! Explicit timer scheduling
//!
//! Rate limiters never reach for an ambient event loop. They are handed a
//! [`Scheduler`] and every deferred action goes through it, so each timer
//! has an owner and a handle that can be cancelled.
//!
//! Two implementations are provided:
//! - [`ManualScheduler`]: virtual clock advanced by hand, fully deterministic
//! - [`TokioScheduler`]: one sleeping tokio task per timer

use crate::error::{Error, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, trace};

/// Deferred unit of work
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Opaque identifier for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Raw numeric id, unique per scheduler
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Source of time and deferred execution
pub trait Scheduler: Send + Sync {
    /// Time elapsed since the scheduler's epoch
    fn now(&self) -> Duration;

    /// Run `task` once `delay` has elapsed
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;

    /// Cancel a scheduled task
    ///
    /// Returns false when the task already ran or was already cancelled.
    fn cancel(&self, handle: TimerHandle) -> bool;

    /// Number of tasks scheduled but not yet run
    fn pending(&self) -> usize;
}

/// Convert a millisecond count into a [`Duration`]
///
/// Rejects NaN, infinite, negative and out-of-range values.
pub fn millis(ms: f64) -> Result<Duration> {
    if !ms.is_finite() {
        return Err(Error::invalid("millis", format!("{} is not a finite number", ms)));
    }
    if ms < 0.0 {
        return Err(Error::invalid("millis", format!("{} is negative", ms)));
    }
    Duration::try_from_secs_f64(ms / 1000.0)
        .map_err(|e| Error::invalid("millis", format!("{} ms is out of range: {}", ms, e)))
}

/// Virtual-time scheduler
///
/// Time only moves when [`ManualScheduler::advance`] is called. Tasks fire
/// in deadline order; tasks sharing a deadline fire in the order they were
/// scheduled.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    /// (deadline, id) -> task
    queue: BTreeMap<(Duration, u64), Task>,
    /// id -> deadline, for cancellation
    deadlines: HashMap<u64, Duration>,
}

impl ManualScheduler {
    /// Create a scheduler with its clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `by`, running every task that comes due
    ///
    /// The clock is set to each task's deadline before the task runs, so
    /// tasks observe the time they were due. Tasks scheduled by a running
    /// task fire in the same call if their deadline falls inside the window.
    /// Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = {
            let state = self.state.lock();
            state.now.checked_add(by).unwrap_or(Duration::MAX)
        };
        self.run_while(|deadline| deadline <= target, Some(target))
    }

    /// Move the clock to an absolute time (no-op when it is in the past)
    pub fn advance_to(&self, at: Duration) -> usize {
        let now = self.now();
        self.advance(at.saturating_sub(now))
    }

    /// Run every outstanding task regardless of deadline
    ///
    /// A task that keeps rescheduling itself will keep this from returning.
    pub fn run_until_idle(&self) -> usize {
        self.run_while(|_| true, None)
    }

    fn run_while(&self, due: impl Fn(Duration) -> bool, settle_at: Option<Duration>) -> usize {
        let mut fired = 0;

        loop {
            // Lock is released before the task runs; tasks may schedule more work.
            let task = {
                let mut state = self.state.lock();
                let next = state.queue.keys().next().copied();
                match next {
                    Some(key) if due(key.0) => {
                        state.deadlines.remove(&key.1);
                        state.now = state.now.max(key.0);
                        state.queue.remove(&key)
                    }
                    _ => {
                        if let Some(at) = settle_at {
                            state.now = state.now.max(at);
                        }
                        None
                    }
                }
            };

            match task {
                Some(task) => {
                    task();
                    fired += 1;
                }
                None => break,
            }
        }

        fired
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.state.lock().now
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;

        let deadline = state.now.checked_add(delay).unwrap_or(Duration::MAX);
        state.queue.insert((deadline, id), task);
        state.deadlines.insert(id, deadline);

        trace!(id, ?deadline, "scheduled virtual timer");
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let mut state = self.state.lock();
        match state.deadlines.remove(&handle.0) {
            Some(deadline) => {
                state.queue.remove(&(deadline, handle.0));
                trace!(id = handle.0, "cancelled virtual timer");
                true
            }
            None => false,
        }
    }

    fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }
}

/// Scheduler backed by the tokio timer wheel
///
/// Each scheduled task is a spawned tokio task that sleeps for the delay
/// and then runs. Cancelling aborts the sleeping task. Dropping the
/// scheduler aborts everything still pending.
pub struct TokioScheduler {
    runtime: Handle,
    epoch: tokio::time::Instant,
    next_id: AtomicU64,
    /// id -> abort handle; `None` until the spawn has returned
    timers: Arc<DashMap<u64, Option<AbortHandle>>>,
}

impl TokioScheduler {
    /// Create a scheduler on the runtime the caller is running in
    pub fn current() -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::invalid("runtime", format!("no tokio runtime available: {}", e)))?;
        Ok(Self::from_handle(runtime))
    }

    /// Create a scheduler that spawns onto the given runtime
    pub fn from_handle(runtime: Handle) -> Self {
        debug!("Starting tokio scheduler");
        Self {
            runtime,
            epoch: tokio::time::Instant::now(),
            next_id: AtomicU64::new(0),
            timers: Arc::new(DashMap::new()),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        tokio::time::Instant::now().duration_since(self.epoch)
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        // Registered before spawning so a fast timer still finds its entry.
        self.timers.insert(id, None);

        let timers = Arc::clone(&self.timers);
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if timers.remove(&id).is_some() {
                task();
            }
        });

        if let Some(mut entry) = self.timers.get_mut(&id) {
            *entry = Some(join.abort_handle());
        }

        trace!(id, ?delay, "scheduled tokio timer");
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        match self.timers.remove(&handle.0) {
            Some((_, abort)) => {
                if let Some(abort) = abort {
                    abort.abort();
                }
                trace!(id = handle.0, "cancelled tokio timer");
                true
            }
            None => false,
        }
    }

    fn pending(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for entry in self.timers.iter() {
            if let Some(abort) = entry.value() {
                abort.abort();
            }
        }
        self.timers.clear();
    }
}
