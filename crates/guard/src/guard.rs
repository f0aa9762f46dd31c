//! Unload guard
//!
//! Forms are installed once; each gets its own [`TrackedForm`]. On an unload
//! attempt the guard looks at every installed form and, if any is dirty,
//! asks the host for confirmation through the unload event. The guard only
//! asks: whether the user actually leaves is decided by the host's prompt.

use crate::source::ChangeSource;
use crate::state::{FormState, TrackedForm};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use steady_core::{Error, GuardConfig};
use tracing::{debug, info};

/// Host unload event, following the browser `beforeunload` convention
///
/// Setting a return value and preventing the default action both signal
/// that the host should show its confirmation prompt.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnloadEvent {
    return_value: Option<String>,
    default_prevented: bool,
}

impl UnloadEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn set_return_value(&mut self, message: impl Into<String>) {
        self.return_value = Some(message.into());
    }

    pub fn return_value(&self) -> Option<&str> {
        self.return_value.as_deref()
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Whether a handler asked the host to confirm
    pub fn confirmation_requested(&self) -> bool {
        self.default_prevented || self.return_value.is_some()
    }
}

/// Outcome of [`FormGuard::on_unload`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum UnloadDecision {
    /// Nothing unsaved; leave without asking
    Proceed,
    /// Confirmation requested with `message`
    Confirm {
        message: String,
        dirty_forms: Vec<String>,
    },
}

/// Point-in-time view of every guarded form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardSnapshot {
    pub forms: Vec<(String, FormState)>,
    pub dirty: bool,
}

/// Tracks guarded forms and answers unload attempts
pub struct FormGuard {
    marker: String,
    message: String,
    forms: Vec<Arc<TrackedForm>>,
}

impl FormGuard {
    /// Create a guard from configuration
    pub fn new(config: &GuardConfig) -> Result<Self> {
        Self::with_message(config.marker.clone(), config.warning_message.clone())
    }

    /// Create a guard with an explicit marker and warning message
    pub fn with_message(marker: impl Into<String>, message: impl Into<String>) -> Result<Self> {
        let marker = marker.into();
        let message = message.into();

        if marker.trim().is_empty() {
            return Err(Error::invalid("marker", "marker must not be empty"));
        }
        if message.trim().is_empty() {
            return Err(Error::invalid("message", "warning message must not be empty"));
        }

        Ok(Self {
            marker,
            message,
            forms: Vec::new(),
        })
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Guard `source` regardless of its markers
    ///
    /// Input marks the form dirty, submit marks it clean.
    pub fn install(&mut self, source: &dyn ChangeSource) -> Arc<TrackedForm> {
        let tracked = Arc::new(TrackedForm::new(source.name()));

        let on_change = Arc::clone(&tracked);
        source.on_change(Box::new(move || {
            on_change.mark_dirty();
        }));

        let on_commit = Arc::clone(&tracked);
        source.on_commit(Box::new(move || {
            on_commit.mark_clean();
        }));

        debug!(form = source.name(), "guarding form");
        self.forms.push(Arc::clone(&tracked));
        tracked
    }

    /// Guard every source carrying this guard's marker
    ///
    /// Returns how many were installed.
    pub fn install_marked<'a, S>(&mut self, sources: impl IntoIterator<Item = &'a S>) -> usize
    where
        S: ChangeSource + 'a,
    {
        let mut installed = 0;
        for source in sources {
            if source.has_marker(&self.marker) {
                self.install(source);
                installed += 1;
            }
        }
        installed
    }

    pub fn forms(&self) -> &[Arc<TrackedForm>] {
        &self.forms
    }

    /// True when any guarded form is dirty
    pub fn is_dirty(&self) -> bool {
        self.forms.iter().any(|form| form.is_dirty())
    }

    /// Names of the dirty forms, in installation order
    pub fn dirty_forms(&self) -> Vec<String> {
        self.forms
            .iter()
            .filter(|form| form.is_dirty())
            .map(|form| form.name().to_string())
            .collect()
    }

    /// Handle an unload attempt
    ///
    /// When any form is dirty the warning message is set as the event's
    /// return value and the default action is prevented.
    pub fn on_unload(&self, event: &mut UnloadEvent) -> UnloadDecision {
        let dirty_forms = self.dirty_forms();
        if dirty_forms.is_empty() {
            return UnloadDecision::Proceed;
        }

        info!(forms = ?dirty_forms, "unsaved changes, requesting unload confirmation");
        event.set_return_value(self.message.clone());
        event.prevent_default();

        UnloadDecision::Confirm {
            message: self.message.clone(),
            dirty_forms,
        }
    }

    pub fn snapshot(&self) -> GuardSnapshot {
        GuardSnapshot {
            forms: self
                .forms
                .iter()
                .map(|form| (form.name().to_string(), form.state()))
                .collect(),
            dirty: self.is_dirty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryForm;

    fn guard() -> FormGuard {
        FormGuard::new(&GuardConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_empty_settings() {
        assert!(FormGuard::with_message("", "leave?").is_err());
        assert!(FormGuard::with_message("protect-form", " ").is_err());
    }

    #[test]
    fn test_marker_and_message_from_config() {
        let guard = guard();
        assert_eq!(guard.marker(), "protect-form");
        assert_eq!(guard.message(), GuardConfig::default().warning_message);

        let custom = FormGuard::with_message("needs-guard", "leave?").unwrap();
        assert_eq!(custom.marker(), "needs-guard");
    }

    #[test]
    fn test_clean_unload_proceeds() {
        let mut guard = guard();
        let form = MemoryForm::new("upload");
        guard.install(&form);

        let mut event = UnloadEvent::new();
        assert_eq!(guard.on_unload(&mut event), UnloadDecision::Proceed);
        assert!(!event.confirmation_requested());
        assert_eq!(event.return_value(), None);
    }

    #[test]
    fn test_dirty_unload_requests_confirmation() {
        let mut guard = guard();
        let form = MemoryForm::new("upload");
        guard.install(&form);
        form.input();

        let mut event = UnloadEvent::new();
        let decision = guard.on_unload(&mut event);

        assert_eq!(
            decision,
            UnloadDecision::Confirm {
                message: GuardConfig::default().warning_message,
                dirty_forms: vec!["upload".to_string()],
            }
        );
        assert!(event.default_prevented());
        assert_eq!(event.return_value(), Some(guard.message()));
    }

    #[test]
    fn test_install_marked_skips_unmarked() {
        let mut guard = guard();
        let forms = vec![
            MemoryForm::new("task").with_marker("protect-form"),
            MemoryForm::new("search"),
            MemoryForm::new("prompt").with_marker("protect-form"),
        ];

        assert_eq!(guard.install_marked(&forms), 2);

        forms[1].input();
        assert!(!guard.is_dirty());

        forms[2].input();
        assert_eq!(guard.dirty_forms(), vec!["prompt".to_string()]);
    }

    #[test]
    fn test_snapshot() {
        let mut guard = guard();
        let a = MemoryForm::new("a");
        let b = MemoryForm::new("b");
        guard.install(&a);
        guard.install(&b);
        b.input();

        let snapshot = guard.snapshot();
        assert!(snapshot.dirty);
        assert_eq!(
            snapshot.forms,
            vec![
                ("a".to_string(), FormState::Clean),
                ("b".to_string(), FormState::Dirty),
            ]
        );
    }
}
