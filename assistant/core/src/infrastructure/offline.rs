// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Offline in-memory capability adapters.
//!
//! Stand-ins for the external collaborators (school portal, artifact store,
//! assistant model) used for development, testing and the CLI's offline
//! mode. They emulate the *external* side of the capability contracts and
//! are deliberately not part of the isolation core's own state.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::domain::capabilities::{
    AssistantModel, CapabilityError, Letter, LetterStore, PortalAuthClient, PortalSession,
    Reminder,
};
use crate::domain::profile::ChildProfile;

/// Portal client that issues opaque tokens and remembers which are valid.
pub struct OfflinePortalClient {
    valid_tokens: Mutex<HashSet<String>>,
}

impl OfflinePortalClient {
    pub fn new() -> Self {
        Self {
            valid_tokens: Mutex::new(HashSet::new()),
        }
    }
}

impl Default for OfflinePortalClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PortalAuthClient for OfflinePortalClient {
    async fn login(&self, child: &ChildProfile) -> Result<PortalSession, CapabilityError> {
        let session = PortalSession {
            token: Uuid::new_v4().to_string(),
            child_key: child.key(),
            issued_at: Utc::now(),
        };
        self.valid_tokens.lock().insert(session.token.clone());
        Ok(session)
    }

    async fn check_session(&self, session: &PortalSession) -> Result<bool, CapabilityError> {
        Ok(self.valid_tokens.lock().contains(&session.token))
    }

    async fn invalidate_session(&self, session: &PortalSession) -> Result<(), CapabilityError> {
        self.valid_tokens.lock().remove(&session.token);
        Ok(())
    }
}

/// Artifact store keeping letters and reminders per child key.
pub struct OfflineLetterStore {
    letters: Mutex<HashMap<(String, NaiveDate), Letter>>,
    reminders: Mutex<HashMap<(String, String), Reminder>>,
}

impl OfflineLetterStore {
    pub fn new() -> Self {
        Self {
            letters: Mutex::new(HashMap::new()),
            reminders: Mutex::new(HashMap::new()),
        }
    }

    /// Seed a letter for a child, as if the portal had delivered it.
    pub fn seed_letter(&self, child: &ChildProfile, letter: Letter) {
        self.letters
            .lock()
            .insert((child.key(), letter.date), letter);
    }

    pub fn reminder_count(&self) -> usize {
        self.reminders.lock().len()
    }
}

impl Default for OfflineLetterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LetterStore for OfflineLetterStore {
    async fn fetch_letter(
        &self,
        child: &ChildProfile,
        date: NaiveDate,
    ) -> Result<Option<Letter>, CapabilityError> {
        Ok(self.letters.lock().get(&(child.key(), date)).cloned())
    }

    async fn store_reminder(
        &self,
        child: &ChildProfile,
        reminder: Reminder,
    ) -> Result<(), CapabilityError> {
        self.reminders
            .lock()
            .insert((child.key(), reminder.key.clone()), reminder);
        Ok(())
    }

    async fn delete_artifact(
        &self,
        child: &ChildProfile,
        key: &str,
    ) -> Result<bool, CapabilityError> {
        let removed_reminder = self
            .reminders
            .lock()
            .remove(&(child.key(), key.to_string()))
            .is_some();
        let removed_letter = {
            let mut letters = self.letters.lock();
            let found = letters
                .iter()
                .find(|((owner, _), letter)| owner == &child.key() && letter.key == key)
                .map(|(k, _)| k.clone());
            match found {
                Some(k) => letters.remove(&k).is_some(),
                None => false,
            }
        };
        Ok(removed_reminder || removed_letter)
    }
}

/// Deterministic model stand-in: truncating "summaries" and echo answers.
pub struct OfflineAssistantModel;

impl OfflineAssistantModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OfflineAssistantModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssistantModel for OfflineAssistantModel {
    async fn summarize(&self, text: &str) -> Result<String, CapabilityError> {
        let excerpt: String = text.chars().take(120).collect();
        Ok(format!("Summary: {}", excerpt.trim()))
    }

    async fn query(&self, prompt: &str) -> Result<String, CapabilityError> {
        let excerpt: String = prompt.chars().take(120).collect();
        Ok(format!("Offline answer to: {}", excerpt.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> ChildProfile {
        ChildProfile::new("Alice", "Example")
    }

    #[tokio::test]
    async fn test_portal_session_round_trip() {
        let portal = OfflinePortalClient::new();
        let session = portal.login(&alice()).await.unwrap();
        assert_eq!(session.child_key, "Alice Example");
        assert!(portal.check_session(&session).await.unwrap());
        portal.invalidate_session(&session).await.unwrap();
        assert!(!portal.check_session(&session).await.unwrap());
    }

    #[tokio::test]
    async fn test_letter_store_is_keyed_per_child() {
        let store = OfflineLetterStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 2, 11).unwrap();
        store.seed_letter(
            &alice(),
            Letter {
                key: "letter-1".to_string(),
                date,
                subject: "Field trip".to_string(),
                body: "Please pack lunch.".to_string(),
            },
        );

        let found = store.fetch_letter(&alice(), date).await.unwrap();
        assert!(found.is_some());

        let bob = ChildProfile::new("Bob", "Example");
        assert!(store.fetch_letter(&bob, date).await.unwrap().is_none());
    }

    #[test]
    fn test_offline_model_is_deterministic() {
        let model = OfflineAssistantModel::new();
        let reply = tokio_test::block_on(model.summarize("hello")).unwrap();
        assert_eq!(reply, "Summary: hello");
    }

    #[tokio::test]
    async fn test_delete_artifact_removes_reminder() {
        let store = OfflineLetterStore::new();
        store
            .store_reminder(
                &alice(),
                Reminder {
                    key: "pack-lunch".to_string(),
                    due: Utc::now(),
                    message: "Pack lunch".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(store.delete_artifact(&alice(), "pack-lunch").await.unwrap());
        assert!(!store.delete_artifact(&alice(), "pack-lunch").await.unwrap());
    }
}
