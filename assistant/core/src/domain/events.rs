// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::context::ScopeId;

/// Execution-scope lifecycle events, published to the event bus for
/// observers (CLI streaming, diagnostics). The authoritative record remains
/// the audit trail; these events are best-effort notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScopeEvent {
    ScopeCreated {
        scope_id: ScopeId,
        profile: String,
        created_at: DateTime<Utc>,
    },
    ScopeDisposed {
        scope_id: ScopeId,
        profile: String,
        disposed_at: DateTime<Utc>,
    },
}

/// Policy-decision events: every refusal the secure pipeline makes on
/// behalf of a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PolicyEvent {
    PermissionDenied {
        profile: String,
        operation: String,
        denied_at: DateTime<Utc>,
    },
    RateLimitExceeded {
        profile: String,
        operation: String,
        ceiling: u32,
        denied_at: DateTime<Utc>,
    },
    UnsafeInputBlocked {
        profile: String,
        operation: String,
        reason: String,
        blocked_at: DateTime<Utc>,
    },
}

impl ScopeEvent {
    pub fn profile(&self) -> &str {
        match self {
            ScopeEvent::ScopeCreated { profile, .. } => profile,
            ScopeEvent::ScopeDisposed { profile, .. } => profile,
        }
    }
}

impl PolicyEvent {
    pub fn profile(&self) -> &str {
        match self {
            PolicyEvent::PermissionDenied { profile, .. } => profile,
            PolicyEvent::RateLimitExceeded { profile, .. } => profile,
            PolicyEvent::UnsafeInputBlocked { profile, .. } => profile,
        }
    }
}
