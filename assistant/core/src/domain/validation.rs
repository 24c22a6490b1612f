// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Stateless context validation.
//!
//! Pure predicates composed by the secure pipeline before any delegated
//! call. None of these have side effects; the original "context is null"
//! case has no analog here because references cannot be null.

use chrono::Utc;
use std::time::Duration;

use crate::domain::context::ProfileContext;
use crate::domain::permissions::PermissionCatalog;
use crate::domain::profile::ChildProfile;

/// Structural soundness of a context: a profile is bound, the scope id is
/// not the nil UUID, and `created_at` is not in the future (clock-skew
/// guard).
pub fn validate_context_integrity(context: &ProfileContext) -> bool {
    if context.scope_id().is_nil() {
        return false;
    }
    let Some(child) = context.bound_child() else {
        return false;
    };
    if child.is_empty() {
        return false;
    }
    context.created_at() <= Utc::now()
}

/// Fail-closed permission check. Empty profile identity or blank operation
/// always denies; otherwise a case-insensitive catalog membership test.
pub fn validate_child_permissions(
    catalog: &PermissionCatalog,
    child: &ChildProfile,
    operation: &str,
) -> bool {
    if child.is_empty() || operation.trim().is_empty() {
        return false;
    }
    catalog.permits(operation)
}

/// True only if the context's bound profile identity equals `expected`'s
/// identity; false when the context is unset or disposed.
pub fn validate_context_matches_child(context: &ProfileContext, expected: &ChildProfile) -> bool {
    match context.bound_child() {
        Some(bound) => bound.key() == expected.key(),
        None => false,
    }
}

/// True iff the context binding is no older than `max_lifetime`.
pub fn validate_context_lifetime(context: &ProfileContext, max_lifetime: Duration) -> bool {
    let max = chrono::Duration::from_std(max_lifetime).unwrap_or(chrono::Duration::MAX);
    Utc::now().signed_duration_since(context.created_at()) <= max
}
