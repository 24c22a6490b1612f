// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Secure data surface: dated/keyed artifact access for the bound child.
//!
//! Every call goes through the shared [`SecurePipeline`]. Reads map a
//! permission refusal to `Ok(None)` (the contract expects a value); writes
//! and deletes surface the refusal as an error because their contracts have
//! no refusal value.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::application::pipeline::{SecureCallError, SecurePipeline};
use crate::domain::audit::AuditEventType;
use crate::domain::capabilities::{Letter, LetterStore, Reminder};
use crate::domain::permissions::Operation;

pub struct SecureLetterService {
    pipeline: Arc<SecurePipeline>,
    inner: Arc<dyn LetterStore>,
}

impl SecureLetterService {
    pub fn new(pipeline: Arc<SecurePipeline>, inner: Arc<dyn LetterStore>) -> Self {
        Self { pipeline, inner }
    }

    /// Fetch the bound child's letter for `date`. A permission refusal is
    /// returned as `Ok(None)`.
    pub async fn read_letter(&self, date: NaiveDate) -> Result<Option<Letter>, SecureCallError> {
        let inner = Arc::clone(&self.inner);
        let resource = format!("letter:{date}");
        let result = self
            .pipeline
            .run(
                Operation::ReadLetter,
                &resource,
                AuditEventType::DataAccess,
                move |child| async move { inner.fetch_letter(&child, date).await },
            )
            .await;
        match result {
            Err(SecureCallError::PermissionDenied { .. }) => Ok(None),
            other => other,
        }
    }

    /// Store a reminder for the bound child.
    pub async fn write_reminder(&self, reminder: Reminder) -> Result<(), SecureCallError> {
        let inner = Arc::clone(&self.inner);
        let resource = format!("reminder:{}", reminder.key);
        self.pipeline
            .run(
                Operation::WriteReminder,
                &resource,
                AuditEventType::DataAccess,
                move |child| async move { inner.store_reminder(&child, reminder).await },
            )
            .await
    }

    /// Delete a keyed artifact of the bound child. Returns whether the
    /// artifact existed.
    pub async fn delete_data(&self, key: &str) -> Result<bool, SecureCallError> {
        let inner = Arc::clone(&self.inner);
        let key = key.to_string();
        let resource = format!("artifact:{key}");
        self.pipeline
            .run(
                Operation::DeleteData,
                &resource,
                AuditEventType::DataAccess,
                move |child| async move { inner.delete_artifact(&child, &key).await },
            )
            .await
    }
}
