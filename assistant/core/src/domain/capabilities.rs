// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Consumed Capability Contracts
//!
//! The three external collaborators the isolation core delegates to, kept as
//! domain traits so the core stays free of transport and vendor details
//! (anti-corruption layer, same role as the envelope verifier abstraction in
//! earlier services). Concrete adapters live outside the core; offline
//! in-memory implementations for development and testing are in
//! `crate::infrastructure::offline`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::profile::ChildProfile;

/// Failure reported by an inner capability. Always audited by the secure
/// pipeline; never silently swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("portal authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("portal session rejected: {0}")]
    SessionRejected(String),

    #[error("artifact store failure: {0}")]
    Storage(String),

    #[error("assistant model failure: {0}")]
    Model(String),
}

/// An authenticated school-portal session for one child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalSession {
    pub token: String,
    /// Natural key of the child the session was issued for.
    pub child_key: String,
    pub issued_at: DateTime<Utc>,
}

/// A dated letter fetched from the portal for one child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Letter {
    pub key: String,
    pub date: NaiveDate,
    pub subject: String,
    pub body: String,
}

/// A keyed reminder written on behalf of one child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub key: String,
    pub due: DateTime<Utc>,
    pub message: String,
}

/// School-portal authentication: login, session check, invalidation.
#[async_trait]
pub trait PortalAuthClient: Send + Sync {
    async fn login(&self, child: &ChildProfile) -> Result<PortalSession, CapabilityError>;

    /// Whether the session is still accepted by the portal.
    async fn check_session(&self, session: &PortalSession) -> Result<bool, CapabilityError>;

    async fn invalidate_session(&self, session: &PortalSession) -> Result<(), CapabilityError>;
}

/// Dated/keyed artifact access for the bound child.
#[async_trait]
pub trait LetterStore: Send + Sync {
    async fn fetch_letter(
        &self,
        child: &ChildProfile,
        date: NaiveDate,
    ) -> Result<Option<Letter>, CapabilityError>;

    async fn store_reminder(
        &self,
        child: &ChildProfile,
        reminder: Reminder,
    ) -> Result<(), CapabilityError>;

    /// Returns whether an artifact with `key` existed and was removed.
    async fn delete_artifact(
        &self,
        child: &ChildProfile,
        key: &str,
    ) -> Result<bool, CapabilityError>;
}

/// AI summarization/query over already-sanitized text.
#[async_trait]
pub trait AssistantModel: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, CapabilityError>;

    async fn query(&self, prompt: &str) -> Result<String, CapabilityError>;
}
