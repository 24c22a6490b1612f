// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Profile Coordinator
//!
//! Runs the same operation across many profiles, one execution scope per
//! profile, and aggregates per-profile outcomes. A single profile's failure
//! (error or panic) is caught, logged and recorded as that profile's
//! result; it never aborts the sibling scopes or the batch.

use futures::FutureExt;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::application::pipeline::SecureCallError;
use crate::application::scope::{ExecutionScope, ScopeFactory, ScopeServices};
use crate::domain::audit::{AuditEventType, SYSTEM_PROFILE};
use crate::domain::capabilities::PortalSession;
use crate::domain::context::ContextError;
use crate::domain::profile::ChildProfile;
use crate::infrastructure::audit_log::system_record;

/// Capability names reported by [`ProfileCoordinator::health_check`].
pub const REQUIRED_CAPABILITIES: [&str; 7] = [
    "assistant_model",
    "audit_log",
    "letter_store",
    "permission_catalog",
    "portal_auth",
    "profile_context",
    "rate_limiter",
];

/// Per-profile outcome of a coordinated operation.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Call(#[from] SecureCallError),

    #[error("profile task aborted: {0}")]
    Aborted(String),
}

pub struct ProfileCoordinator {
    factory: Arc<ScopeFactory>,
}

impl ProfileCoordinator {
    pub fn new(factory: Arc<ScopeFactory>) -> Self {
        Self { factory }
    }

    /// Create a scope for one profile. The caller owns its lifecycle.
    pub fn create_scope(&self, child: &ChildProfile) -> Result<ExecutionScope, ContextError> {
        self.factory.create_scope(child)
    }

    /// Create a scope for `child`, run `operation` in it, dispose the
    /// scope, and return the operation's result.
    pub async fn execute_in_scope<T, F, Fut>(
        &self,
        child: &ChildProfile,
        operation: F,
    ) -> Result<T, CoordinatorError>
    where
        F: FnOnce(Arc<ScopeServices>) -> Fut,
        Fut: Future<Output = Result<T, SecureCallError>>,
    {
        let scope = self.factory.create_scope(child)?;
        let result = scope.execute(operation).await?;
        scope.dispose();
        Ok(result?)
    }

    /// Run `operation` for every profile concurrently, one scope each, and
    /// collect a profile-key → outcome map. Failures are isolated per
    /// profile.
    pub async fn execute_for_all<T, F, Fut>(
        &self,
        profiles: &[ChildProfile],
        operation: F,
    ) -> HashMap<String, Result<T, CoordinatorError>>
    where
        T: Send + 'static,
        F: Fn(Arc<ScopeServices>) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = Result<T, SecureCallError>> + Send + 'static,
    {
        let mut join_set = JoinSet::new();
        for child in profiles {
            let factory = Arc::clone(&self.factory);
            let operation = operation.clone();
            let child = child.clone();
            join_set.spawn(async move {
                let key = child.key();
                let work = async {
                    let scope = factory.create_scope(&child)?;
                    let result = scope.execute(operation).await?;
                    scope.dispose();
                    result.map_err(CoordinatorError::from)
                };
                // A panicking operation must not take the batch down; it
                // becomes this profile's recorded failure.
                let outcome = match AssertUnwindSafe(work).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(panic) => Err(CoordinatorError::Aborted(panic_message(panic))),
                };
                (key, outcome)
            });
        }

        let mut results = HashMap::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((key, outcome)) => {
                    if let Err(error) = &outcome {
                        tracing::warn!(profile = %key, %error, "profile operation failed");
                    }
                    results.insert(key, outcome);
                }
                Err(join_error) => {
                    tracing::error!(%join_error, "profile task failed to join");
                }
            }
        }
        results
    }

    /// Startup self-validation: resolve the fixed set of required
    /// capabilities inside one probe scope and report which responded.
    pub async fn health_check(&self) -> BTreeMap<String, bool> {
        let mut report: BTreeMap<String, bool> = REQUIRED_CAPABILITIES
            .iter()
            .map(|name| (name.to_string(), false))
            .collect();

        report.insert(
            "permission_catalog".to_string(),
            !self.factory.catalog().is_empty(),
        );

        // The audit log must accept a write and return it from a trail
        // query.
        let audit = Arc::clone(self.factory.audit());
        let written = audit
            .record(
                system_record(AuditEventType::SecurityEvent, "startup self-validation")
                    .operation("health:check")
                    .success(true),
            )
            .await;
        let found = audit
            .trail(SYSTEM_PROFILE, written.timestamp, written.timestamp)
            .await;
        report.insert("audit_log".to_string(), !found.is_empty());

        let probe = ChildProfile::new("Vesta", "Probe");
        let scope = match self.factory.create_scope(&probe) {
            Ok(scope) => scope,
            Err(error) => {
                tracing::error!(%error, "health check could not create probe scope");
                return report;
            }
        };

        report.insert(
            "rate_limiter".to_string(),
            self.factory.limiter().ceiling_for("auth:check") > 0,
        );

        let resolved = scope
            .execute(|services| async move {
                let mut checks = Vec::new();
                checks.push(("profile_context", services.context.validate().is_ok()));

                let today = chrono::Utc::now().date_naive();
                checks.push((
                    "letter_store",
                    services.letters.read_letter(today).await.is_ok(),
                ));

                // A synthetic, never-issued session: the check only needs
                // the surface to answer, not to be valid.
                let session = PortalSession {
                    token: String::new(),
                    child_key: services
                        .context
                        .current_child()
                        .map(|c| c.key())
                        .unwrap_or_default(),
                    issued_at: chrono::Utc::now(),
                };
                checks.push((
                    "portal_auth",
                    services.portal.check_session(&session).await.is_ok(),
                ));

                checks.push((
                    "assistant_model",
                    services.assistant.summarize("health check probe").await.is_ok(),
                ));
                checks
            })
            .await;

        match resolved {
            Ok(checks) => {
                for (name, healthy) in checks {
                    report.insert(name.to_string(), healthy);
                }
            }
            Err(error) => {
                tracing::error!(%error, "health check probe scope failed");
            }
        }
        scope.dispose();

        let unhealthy: Vec<&str> = report
            .iter()
            .filter(|(_, healthy)| !**healthy)
            .map(|(name, _)| name.as_str())
            .collect();
        if unhealthy.is_empty() {
            tracing::info!("health check passed for all required capabilities");
        } else {
            tracing::warn!(?unhealthy, "health check found unhealthy capabilities");
        }
        report
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
