//! arkfs-key: interactive key retrieval for protected archive resources.
//!
//! The [`PromptingKeyProvider`] obtains encryption keys by prompting the
//! user through a pluggable [`View`] (console, dialog, web, ...). The
//! provider is a small state machine which caches a cancellation so that
//! repeated accesses to the same resource do not prompt endlessly, supports
//! transparent re-prompting on invalid-key feedback, and honors a
//! change-password request without losing the old key if the change is
//! abandoned.
//!
//! During a prompt the view talks to the provider exclusively through a
//! short-lived [`Controller`] handle; outside of a prompt the view has no
//! way to mutate the provider.

pub mod error;
pub mod provider;

pub use error::KeyError;
pub use provider::{Controller, PromptingKeyProvider, View};
