//! Change-tracked resources
//!
//! [`ChangeSource`] is the seam between the guard and whatever hosts the
//! forms. A browser binding would forward DOM `input` and `submit` events;
//! [`MemoryForm`] is the in-process implementation used by the CLI and tests.

use parking_lot::Mutex;
use std::sync::Arc;

/// Callback invoked on a change or commit event
pub type Listener = Box<dyn Fn() + Send + Sync>;

/// A resource that can be edited and committed
pub trait ChangeSource {
    /// Identifier used in logs and dirty-form listings
    fn name(&self) -> &str;

    /// Whether the resource opted into guarding via `marker`
    fn has_marker(&self, marker: &str) -> bool;

    /// Subscribe to edits
    fn on_change(&self, listener: Listener);

    /// Subscribe to commits (form submission)
    fn on_commit(&self, listener: Listener);
}

type SharedListener = Arc<dyn Fn() + Send + Sync>;

/// In-memory form that dispatches events to its subscribers
pub struct MemoryForm {
    name: String,
    markers: Vec<String>,
    change_listeners: Mutex<Vec<SharedListener>>,
    commit_listeners: Mutex<Vec<SharedListener>>,
}

impl MemoryForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markers: Vec::new(),
            change_listeners: Mutex::new(Vec::new()),
            commit_listeners: Mutex::new(Vec::new()),
        }
    }

    /// Add a marker (the analogue of a CSS class)
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into());
        self
    }

    /// Simulate an input event
    pub fn input(&self) {
        dispatch(&self.change_listeners);
    }

    /// Simulate a submit event
    pub fn submit(&self) {
        dispatch(&self.commit_listeners);
    }
}

/// Listeners are copied out first so a listener may subscribe more.
fn dispatch(listeners: &Mutex<Vec<SharedListener>>) {
    let snapshot: Vec<SharedListener> = listeners.lock().iter().cloned().collect();
    for listener in snapshot {
        listener();
    }
}

impl ChangeSource for MemoryForm {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_marker(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| m == marker)
    }

    fn on_change(&self, listener: Listener) {
        self.change_listeners.lock().push(Arc::from(listener));
    }

    fn on_commit(&self, listener: Listener) {
        self.commit_listeners.lock().push(Arc::from(listener));
    }
}
