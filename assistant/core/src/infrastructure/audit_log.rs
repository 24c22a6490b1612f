// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! In-memory implementation of the [`AuditLog`] contract.
//!
//! Entries are bucketed per profile in a `DashMap`, so concurrent writers
//! for different profiles never contend on the same shard and the structure
//! is never locked as a whole. A single write clock keeps timestamps
//! monotonic non-decreasing across all profiles.
//!
//! In-memory storage is the development/testing backend; production
//! retention is an external concern behind the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::domain::audit::{
    AuditEntry, AuditEntryId, AuditEventType, AuditLog, AuditRecord, AuditSeverity,
    SYSTEM_PROFILE,
};

pub struct InMemoryAuditLog {
    entries: DashMap<String, Vec<AuditEntry>>,
    write_clock: Mutex<DateTime<Utc>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            write_clock: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Monotonic non-decreasing write timestamp. A write that lands on the
    /// same instant as the previous one is nudged forward by one
    /// microsecond so range queries stay well-ordered.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.write_clock.lock();
        let mut now = Utc::now();
        if now <= *last {
            now = *last + chrono::Duration::microseconds(1);
        }
        *last = now;
        now
    }

    /// Total number of stored entries, across all profiles.
    pub fn entry_count(&self) -> usize {
        self.entries.iter().map(|bucket| bucket.value().len()).sum()
    }

    /// Number of distinct profile buckets.
    pub fn profile_count(&self) -> usize {
        self.entries.len()
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, record: AuditRecord) -> AuditEntry {
        let profile = record
            .profile
            .unwrap_or_else(|| SYSTEM_PROFILE.to_string());
        let entry = AuditEntry {
            id: AuditEntryId::new(),
            timestamp: self.next_timestamp(),
            profile: profile.clone(),
            event_type: record.event_type,
            operation: record.operation,
            resource: record.resource,
            success: record.success,
            details: record.details,
            session_id: record.session_id,
            severity: record.severity,
        };

        match entry.severity {
            AuditSeverity::Info => tracing::info!(
                profile = %entry.profile,
                event = ?entry.event_type,
                operation = %entry.operation,
                resource = %entry.resource,
                success = entry.success,
                "audit"
            ),
            AuditSeverity::Warning => tracing::warn!(
                profile = %entry.profile,
                event = ?entry.event_type,
                operation = %entry.operation,
                resource = %entry.resource,
                details = %entry.details,
                "audit"
            ),
            AuditSeverity::Error | AuditSeverity::Critical => tracing::error!(
                profile = %entry.profile,
                event = ?entry.event_type,
                operation = %entry.operation,
                resource = %entry.resource,
                details = %entry.details,
                severity = ?entry.severity,
                "audit"
            ),
        }

        self.entries
            .entry(profile)
            .or_default()
            .push(entry.clone());
        entry
    }

    async fn trail(
        &self,
        profile: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<AuditEntry> {
        self.entries
            .get(profile)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|entry| entry.timestamp >= from && entry.timestamp <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Convenience constructor for a record attributed to the system rather
/// than a profile.
pub fn system_record(event_type: AuditEventType, details: impl Into<String>) -> AuditRecord {
    AuditRecord::new(event_type, AuditSeverity::Info).details(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_for(profile: &str) -> AuditRecord {
        AuditRecord::new(AuditEventType::DataAccess, AuditSeverity::Info)
            .profile(profile)
            .operation("read:letter")
            .resource("letter:2026-02-11")
            .success(true)
    }

    #[tokio::test]
    async fn test_record_assigns_monotonic_timestamps() {
        let log = InMemoryAuditLog::new();
        let mut last = DateTime::<Utc>::MIN_UTC;
        for _ in 0..50 {
            let entry = log.record(record_for("Alice Example")).await;
            assert!(entry.timestamp > last);
            last = entry.timestamp;
        }
    }

    #[tokio::test]
    async fn test_missing_profile_is_attributed_to_system() {
        let log = InMemoryAuditLog::new();
        let entry = log
            .record(system_record(AuditEventType::SecurityEvent, "startup"))
            .await;
        assert_eq!(entry.profile, SYSTEM_PROFILE);
    }

    #[tokio::test]
    async fn test_trail_filters_profile_and_range() {
        let log = InMemoryAuditLog::new();
        let before = Utc::now();
        log.record(record_for("Alice Example")).await;
        let mid = log.record(record_for("Bob Example")).await;
        log.record(record_for("Alice Example")).await;
        let after = Utc::now();

        let alice = log.trail("Alice Example", before, after).await;
        assert_eq!(alice.len(), 2);
        assert!(alice.iter().all(|e| e.profile == "Alice Example"));

        // A range covering only Bob's write returns nothing for Alice.
        let nothing = log
            .trail("Alice Example", mid.timestamp, mid.timestamp)
            .await;
        assert!(nothing.is_empty());
    }

    #[tokio::test]
    async fn test_trail_unknown_profile_is_empty() {
        let log = InMemoryAuditLog::new();
        assert!(log
            .trail("Nobody", DateTime::<Utc>::MIN_UTC, Utc::now())
            .await
            .is_empty());
    }
}
