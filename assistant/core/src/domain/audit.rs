// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Audit Trail Contract
//!
//! Append-only record of every policy decision and delegated-call outcome.
//! The contract lives in the domain layer, the concrete store in
//! `crate::infrastructure::audit_log`, following the repository pattern used
//! across the codebase.
//!
//! ## Invariants
//!
//! - An entry is immutable once written; the public contract has no mutate
//!   or delete operation (retention and rotation are external concerns).
//! - Timestamps are assigned by the log at write time and are monotonic
//!   non-decreasing.
//! - Writes without a profile are attributed to [`SYSTEM_PROFILE`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile name recorded for entries not attributable to a child.
pub const SYSTEM_PROFILE: &str = "System";

/// Unique identifier for a single [`AuditEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEntryId(pub Uuid);

impl AuditEntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AuditEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of decision or outcome an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventType {
    AuthenticationAttempt,
    DataAccess,
    SessionInvalidation,
    SessionTimeout,
    SecurityEvent,
    PermissionDenied,
    RateLimitExceeded,
}

/// Severity drives the level of the log line emitted on write; it does not
/// affect storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// One immutable audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    /// Assigned by the log at write time; monotonic non-decreasing.
    pub timestamp: DateTime<Utc>,
    /// Natural key of the profile, or [`SYSTEM_PROFILE`].
    pub profile: String,
    pub event_type: AuditEventType,
    pub operation: String,
    pub resource: String,
    pub success: bool,
    pub details: String,
    /// Scope id of the execution scope the entry was written under.
    pub session_id: String,
    pub severity: AuditSeverity,
}

/// A write submitted to the log. The log assigns the entry id and the
/// monotonic timestamp.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    /// `None` attributes the entry to [`SYSTEM_PROFILE`].
    pub profile: Option<String>,
    pub event_type: AuditEventType,
    pub operation: String,
    pub resource: String,
    pub success: bool,
    pub details: String,
    pub session_id: String,
    pub severity: AuditSeverity,
}

impl AuditRecord {
    pub fn new(event_type: AuditEventType, severity: AuditSeverity) -> Self {
        Self {
            profile: None,
            event_type,
            operation: String::new(),
            resource: String::new(),
            success: false,
            details: String::new(),
            session_id: String::new(),
            severity,
        }
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }
}

/// Append-only, thread-safe audit store, queryable per profile and time
/// range.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append one entry. Never fails from the caller's perspective; the
    /// written entry (with assigned id and timestamp) is returned.
    async fn record(&self, record: AuditRecord) -> AuditEntry;

    /// Entries for `profile` with timestamp in `[from, to]`, in write
    /// order, regardless of interleaved writes for other profiles.
    async fn trail(
        &self,
        profile: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<AuditEntry>;
}
