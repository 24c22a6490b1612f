// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Child profile identity.
//!
//! Profiles are owned by configuration and only *referenced* by the
//! isolation core. The natural key is the caller-supplied name pair; the
//! core never invents a surrogate identity for it.

use serde::{Deserialize, Serialize};

/// Identity of one managed child profile.
///
/// Two profiles are the same profile iff their [`ChildProfile::key`] values
/// are equal. The configuration owner is responsible for keeping the name
/// pair stable and unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChildProfile {
    pub first_name: String,
    pub last_name: String,
}

impl ChildProfile {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Natural key used to attribute audit entries, rate-limit counters and
    /// coordinator results to this profile.
    pub fn key(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// A profile with a blank name part carries no usable identity.
    pub fn is_empty(&self) -> bool {
        self.first_name.trim().is_empty() || self.last_name.trim().is_empty()
    }
}

impl std::fmt::Display for ChildProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
