//! Per-form dirty state

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Whether a form holds unsaved edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    Clean,
    Dirty,
}

/// Dirty flag for one guarded form
///
/// `Clean -> Dirty` on input, `Dirty -> Clean` on submit. Starts clean.
#[derive(Debug)]
pub struct TrackedForm {
    name: String,
    dirty: AtomicBool,
}

impl TrackedForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dirty: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> FormState {
        if self.is_dirty() {
            FormState::Dirty
        } else {
            FormState::Clean
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Record an edit; returns true if the form was clean before
    pub fn mark_dirty(&self) -> bool {
        let was_dirty = self.dirty.swap(true, Ordering::SeqCst);
        if !was_dirty {
            debug!(form = %self.name, "form became dirty");
        }
        !was_dirty
    }

    /// Record a submit; returns true if the form was dirty before
    pub fn mark_clean(&self) -> bool {
        let was_dirty = self.dirty.swap(false, Ordering::SeqCst);
        if was_dirty {
            debug!(form = %self.name, "form committed");
        }
        was_dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_clean() {
        let form = TrackedForm::new("upload");
        assert_eq!(form.state(), FormState::Clean);
        assert_eq!(form.name(), "upload");
    }

    #[test]
    fn test_transitions() {
        let form = TrackedForm::new("upload");

        assert!(form.mark_dirty());
        assert!(!form.mark_dirty());
        assert_eq!(form.state(), FormState::Dirty);

        assert!(form.mark_clean());
        assert!(!form.mark_clean());
        assert_eq!(form.state(), FormState::Clean);
    }
}
