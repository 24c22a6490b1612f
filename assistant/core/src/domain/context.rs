// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Profile Context Aggregate
//!
//! The set-once identity container bound to one execution scope. Every
//! policy decision made on behalf of a child goes through the context that
//! carries that child's identity.
//!
//! ## Lifecycle
//!
//! ```text
//! Unset ──set_child──▶ Set ──dispose──▶ Disposed
//!   └───────────────dispose─────────────▶ ⬑ idempotent
//! ```
//!
//! ## Invariants
//!
//! - The bound profile is assignable exactly **once**; a second `set_child`
//!   fails even with an identical value.
//! - Every accessor fails deterministically after `dispose()`, including
//!   `set_child`.
//! - `created_at` is recorded on successful binding and is never in the
//!   future.
//! - Disposal clears the bound profile so nothing identity-bearing outlives
//!   the scope.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::profile::ChildProfile;

/// Opaque identifier for one execution scope (one per bound context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub Uuid);

impl ScopeId {
    /// Generate a new random scope ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle errors raised by [`ProfileContext`]. These are programming or
/// lifecycle faults: they fail fast and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("no child profile is bound to this context")]
    Unbound,

    #[error("a child profile is already bound to this context")]
    AlreadyBound,

    #[error("context {0} has been disposed")]
    Disposed(ScopeId),

    #[error("child profile identity must not be empty")]
    EmptyProfile,

    #[error("context {0} failed the integrity check")]
    Integrity(ScopeId),

    #[error("context {0} binding exceeded its maximum lifetime")]
    Expired(ScopeId),
}

#[derive(Debug)]
struct ContextState {
    child: Option<ChildProfile>,
    created_at: DateTime<Utc>,
    disposed: bool,
}

/// Set-once, disposable identity container for one execution scope.
///
/// Interior mutability keeps the aggregate shareable (`Arc`) between the
/// secure services of a single scope while the state machine stays enforced
/// in one place.
#[derive(Debug)]
pub struct ProfileContext {
    scope_id: ScopeId,
    state: Mutex<ContextState>,
}

impl ProfileContext {
    pub fn new() -> Self {
        Self {
            scope_id: ScopeId::new(),
            state: Mutex::new(ContextState {
                child: None,
                created_at: Utc::now(),
                disposed: false,
            }),
        }
    }

    pub fn scope_id(&self) -> ScopeId {
        self.scope_id
    }

    /// Bind a child profile to this context. Allowed exactly once.
    ///
    /// # Errors
    ///
    /// - [`ContextError::Disposed`] — the context was already disposed
    /// - [`ContextError::AlreadyBound`] — a profile is already bound, even
    ///   if the new value is identical
    /// - [`ContextError::EmptyProfile`] — the profile has a blank name part
    pub fn set_child(&self, child: ChildProfile) -> Result<(), ContextError> {
        let mut state = self.state.lock();
        if state.disposed {
            tracing::error!(
                scope_id = %self.scope_id,
                attempted = %child.key(),
                "refused to bind child profile: context disposed"
            );
            return Err(ContextError::Disposed(self.scope_id));
        }
        if let Some(bound) = &state.child {
            tracing::error!(
                scope_id = %self.scope_id,
                bound = %bound.key(),
                attempted = %child.key(),
                "refused to rebind child profile on an already-bound context"
            );
            return Err(ContextError::AlreadyBound);
        }
        if child.is_empty() {
            tracing::error!(
                scope_id = %self.scope_id,
                "refused to bind child profile with empty identity"
            );
            return Err(ContextError::EmptyProfile);
        }
        state.created_at = Utc::now();
        tracing::info!(
            scope_id = %self.scope_id,
            child = %child.key(),
            "child profile bound to execution scope"
        );
        state.child = Some(child);
        Ok(())
    }

    /// Return the context to `Unset`. Teardown and testing only; a context
    /// is never reassigned mid-use.
    pub fn clear_child(&self) -> Result<(), ContextError> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(ContextError::Disposed(self.scope_id));
        }
        state.child = None;
        Ok(())
    }

    /// Fail fast unless a profile is bound and the context is live.
    pub fn validate(&self) -> Result<(), ContextError> {
        let state = self.state.lock();
        if state.disposed {
            return Err(ContextError::Disposed(self.scope_id));
        }
        if state.child.is_none() {
            return Err(ContextError::Unbound);
        }
        Ok(())
    }

    /// The bound child profile.
    ///
    /// # Errors
    ///
    /// [`ContextError::Disposed`] after disposal, [`ContextError::Unbound`]
    /// before binding.
    pub fn current_child(&self) -> Result<ChildProfile, ContextError> {
        let state = self.state.lock();
        if state.disposed {
            return Err(ContextError::Disposed(self.scope_id));
        }
        state.child.clone().ok_or(ContextError::Unbound)
    }

    /// Non-failing view used by the stateless validators: `None` when the
    /// context is unset *or* disposed (disposal clears the binding).
    pub fn bound_child(&self) -> Option<ChildProfile> {
        self.state.lock().child.clone()
    }

    /// When the current binding was established (construction time before
    /// the first `set_child`).
    pub fn created_at(&self) -> DateTime<Utc> {
        self.state.lock().created_at
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// Clear the bound profile and mark the context disposed. Idempotent.
    pub fn dispose(&self) {
        let mut state = self.state.lock();
        if state.disposed {
            return;
        }
        state.child = None;
        state.disposed = true;
        tracing::debug!(scope_id = %self.scope_id, "profile context disposed");
    }
}

impl Default for ProfileContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child() -> ChildProfile {
        ChildProfile::new("Alice", "Example")
    }

    #[test]
    fn test_set_child_once_succeeds() {
        let ctx = ProfileContext::new();
        assert!(ctx.validate().is_err());
        ctx.set_child(child()).unwrap();
        assert!(ctx.validate().is_ok());
        assert_eq!(ctx.current_child().unwrap().key(), "Alice Example");
    }

    #[test]
    fn test_set_child_twice_fails_even_with_identical_value() {
        let ctx = ProfileContext::new();
        ctx.set_child(child()).unwrap();
        assert_eq!(ctx.set_child(child()), Err(ContextError::AlreadyBound));
    }

    #[test]
    fn test_set_child_rejects_empty_profile() {
        let ctx = ProfileContext::new();
        assert_eq!(
            ctx.set_child(ChildProfile::new("", "Example")),
            Err(ContextError::EmptyProfile)
        );
        // The refusal must not have transitioned the context to Set.
        assert_eq!(ctx.validate(), Err(ContextError::Unbound));
    }

    #[test]
    fn test_every_accessor_fails_after_dispose() {
        let ctx = ProfileContext::new();
        ctx.set_child(child()).unwrap();
        ctx.dispose();

        let disposed = ContextError::Disposed(ctx.scope_id());
        assert_eq!(ctx.set_child(child()), Err(disposed.clone()));
        assert_eq!(ctx.current_child(), Err(disposed.clone()));
        assert_eq!(ctx.validate(), Err(disposed.clone()));
        assert_eq!(ctx.clear_child(), Err(disposed));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let ctx = ProfileContext::new();
        ctx.set_child(child()).unwrap();
        ctx.dispose();
        ctx.dispose();
        assert!(ctx.is_disposed());
    }

    #[test]
    fn test_dispose_reachable_from_unset() {
        let ctx = ProfileContext::new();
        ctx.dispose();
        assert_eq!(
            ctx.set_child(child()),
            Err(ContextError::Disposed(ctx.scope_id()))
        );
    }

    #[test]
    fn test_clear_child_returns_to_unset() {
        let ctx = ProfileContext::new();
        ctx.set_child(child()).unwrap();
        ctx.clear_child().unwrap();
        assert_eq!(ctx.validate(), Err(ContextError::Unbound));
    }

    #[test]
    fn test_created_at_not_in_future() {
        let ctx = ProfileContext::new();
        ctx.set_child(child()).unwrap();
        assert!(ctx.created_at() <= Utc::now());
    }
}
