//! Unsaved-changes protection
//!
//! This crate provides:
//! - The [`ChangeSource`] seam: anything that emits change and commit events
//! - Per-form dirty tracking ([`TrackedForm`])
//! - The unload guard that asks the host to confirm leaving while any
//!   guarded form is dirty ([`FormGuard`])

pub mod guard;
pub mod source;
pub mod state;

// Re-exports
pub use guard::{FormGuard, GuardSnapshot, UnloadDecision, UnloadEvent};
pub use source::{ChangeSource, Listener, MemoryForm};
pub use state::{FormState, TrackedForm};

/// Result type for guard operations
pub type Result<T> = steady_core::Result<T>;
