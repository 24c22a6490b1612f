// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Per-(profile, operation) fixed-window rate limiting.
//!
//! Counters live in a `DashMap` keyed by `(profile key, operation)`, so
//! concurrent scopes only contend when they throttle the same pair. A
//! window that has expired is reset transparently on the next access;
//! stale pairs therefore never accumulate count and the map stays bounded
//! by the set of (profile, operation) pairs actually in use.
//!
//! The check/record split is deliberate: the secure pipeline asks
//! [`RateLimiter::is_allowed`] *before* delegating and calls
//! [`RateLimiter::record_operation`] only after the inner capability
//! succeeded, so refused and failed calls do not consume budget.

use dashmap::DashMap;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::domain::config::RateLimitSettings;

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    window: Duration,
    default_ceiling: u32,
    per_operation: HashMap<String, u32>,
    counters: DashMap<(String, String), Window>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        let per_operation = settings
            .per_operation
            .into_iter()
            .map(|(op, ceiling)| (op.to_ascii_lowercase(), ceiling))
            .collect();
        Self {
            window: settings.window,
            default_ceiling: settings.default_ceiling,
            per_operation,
            counters: DashMap::new(),
        }
    }

    /// The ceiling applied to `operation` (case-insensitive).
    pub fn ceiling_for(&self, operation: &str) -> u32 {
        self.per_operation
            .get(&operation.to_ascii_lowercase())
            .copied()
            .unwrap_or(self.default_ceiling)
    }

    /// Whether one more call for `(profile, operation)` fits in the current
    /// window. Resets an expired window as a side effect.
    pub fn is_allowed(&self, profile_key: &str, operation: &str) -> bool {
        let operation = operation.to_ascii_lowercase();
        let ceiling = self.ceiling_for(&operation);
        let key = (profile_key.to_string(), operation);
        let mut entry = self.counters.entry(key).or_insert_with(|| Window {
            started: Instant::now(),
            count: 0,
        });
        if entry.started.elapsed() >= self.window {
            entry.started = Instant::now();
            entry.count = 0;
        }
        entry.count < ceiling
    }

    /// Count one successfully allowed operation for `(profile, operation)`.
    pub fn record_operation(&self, profile_key: &str, operation: &str) {
        let operation = operation.to_ascii_lowercase();
        let key = (profile_key.to_string(), operation);
        let mut entry = self.counters.entry(key).or_insert_with(|| Window {
            started: Instant::now(),
            count: 0,
        });
        if entry.started.elapsed() >= self.window {
            entry.started = Instant::now();
            entry.count = 0;
        }
        entry.count = entry.count.saturating_add(1);
    }

    /// Number of (profile, operation) pairs currently tracked.
    pub fn tracked_pairs(&self) -> usize {
        self.counters.len()
    }
}
