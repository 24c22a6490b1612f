// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Secure Call Pipeline
//!
//! The single enforcement point every capability surface goes through.
//! Implemented once and parameterized by operation, resource and audit
//! event type instead of hand-copied per method.
//!
//! [`SecurePipeline::run`] enforces the following checks **in order** (first
//! failure returns immediately, without touching the inner capability):
//! 1. Context lifecycle — bound and not disposed
//! 2. Context integrity and lifetime
//! 3. Permission catalog membership (fail-closed)
//! 4. Rate-limit ceiling for the (profile, operation) pair
//! 5. Delegation to the inner capability
//! 6. Success: rate-limit accounting + success audit entry.
//!    Failure: failure audit entry + propagation — never silently swallowed.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::audit::{AuditEventType, AuditLog, AuditRecord, AuditSeverity};
use crate::domain::capabilities::CapabilityError;
use crate::domain::context::{ContextError, ProfileContext};
use crate::domain::events::PolicyEvent;
use crate::domain::permissions::{Operation, PermissionCatalog};
use crate::domain::profile::ChildProfile;
use crate::domain::sanitizer::UnsafeInput;
use crate::domain::validation;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::rate_limiter::RateLimiter;

/// Errors surfaced by a secure capability call.
///
/// `PermissionDenied` and `RateLimitExceeded` are expected, recoverable
/// refusals; `Context` failures are lifecycle faults that fail fast;
/// `SecurityViolation` display text deliberately carries no detail — the
/// raw reason lives in the audit trail only.
#[derive(Debug, Error)]
pub enum SecureCallError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("operation '{operation}' is not permitted for {profile}")]
    PermissionDenied { profile: String, operation: String },

    #[error("rate limit exceeded for '{operation}' by {profile} (ceiling {ceiling})")]
    RateLimitExceeded {
        profile: String,
        operation: String,
        ceiling: u32,
    },

    #[error("unsafe input rejected")]
    SecurityViolation { reason: String },

    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

/// The validate→authorize→throttle→delegate→audit sequence, shared by all
/// secure services of one execution scope.
pub struct SecurePipeline {
    context: Arc<ProfileContext>,
    catalog: Arc<PermissionCatalog>,
    limiter: Arc<RateLimiter>,
    audit: Arc<dyn AuditLog>,
    events: EventBus,
    max_context_lifetime: Duration,
}

impl SecurePipeline {
    pub fn new(
        context: Arc<ProfileContext>,
        catalog: Arc<PermissionCatalog>,
        limiter: Arc<RateLimiter>,
        audit: Arc<dyn AuditLog>,
        events: EventBus,
        max_context_lifetime: Duration,
    ) -> Self {
        Self {
            context,
            catalog,
            limiter,
            audit,
            events,
            max_context_lifetime,
        }
    }

    pub fn context(&self) -> &Arc<ProfileContext> {
        &self.context
    }

    fn session_id(&self) -> String {
        self.context.scope_id().to_string()
    }

    /// Run `call` under the full policy pipeline.
    ///
    /// `call` receives the bound child profile; its result is audited under
    /// `event_type` with `resource` as the touched artifact.
    pub async fn run<T, F, Fut>(
        &self,
        operation: Operation,
        resource: &str,
        event_type: AuditEventType,
        call: F,
    ) -> Result<T, SecureCallError>
    where
        F: FnOnce(ChildProfile) -> Fut,
        Fut: Future<Output = Result<T, CapabilityError>>,
    {
        // 1. Lifecycle: unset or disposed contexts fail before any policy
        //    work.
        self.context.validate()?;
        let child = self.context.current_child()?;
        let profile_key = child.key();
        let op = operation.as_str();

        // 2. Structural integrity and binding age.
        if !validation::validate_context_integrity(&self.context) {
            return Err(ContextError::Integrity(self.context.scope_id()).into());
        }
        if !validation::validate_context_lifetime(&self.context, self.max_context_lifetime) {
            self.audit
                .record(
                    AuditRecord::new(AuditEventType::SessionTimeout, AuditSeverity::Warning)
                        .profile(profile_key.clone())
                        .operation(op)
                        .resource(resource)
                        .details("context binding exceeded the configured lifetime")
                        .session(self.session_id()),
                )
                .await;
            return Err(ContextError::Expired(self.context.scope_id()).into());
        }

        // 3. Fail-closed permission check.
        if !validation::validate_child_permissions(&self.catalog, &child, op) {
            self.audit
                .record(
                    AuditRecord::new(AuditEventType::PermissionDenied, AuditSeverity::Warning)
                        .profile(profile_key.clone())
                        .operation(op)
                        .resource(resource)
                        .details("operation not in permission catalog")
                        .session(self.session_id()),
                )
                .await;
            self.events.publish_policy_event(PolicyEvent::PermissionDenied {
                profile: profile_key.clone(),
                operation: op.to_string(),
                denied_at: Utc::now(),
            });
            return Err(SecureCallError::PermissionDenied {
                profile: profile_key,
                operation: op.to_string(),
            });
        }

        // 4. Throttle.
        if !self.limiter.is_allowed(&profile_key, op) {
            let ceiling = self.limiter.ceiling_for(op);
            self.audit
                .record(
                    AuditRecord::new(AuditEventType::RateLimitExceeded, AuditSeverity::Warning)
                        .profile(profile_key.clone())
                        .operation(op)
                        .resource(resource)
                        .details(format!("ceiling {ceiling} reached in current window"))
                        .session(self.session_id()),
                )
                .await;
            self.events.publish_policy_event(PolicyEvent::RateLimitExceeded {
                profile: profile_key.clone(),
                operation: op.to_string(),
                ceiling,
                denied_at: Utc::now(),
            });
            return Err(SecureCallError::RateLimitExceeded {
                profile: profile_key,
                operation: op.to_string(),
                ceiling,
            });
        }

        // 5. Delegate.
        match call(child).await {
            Ok(value) => {
                self.limiter.record_operation(&profile_key, op);
                self.audit
                    .record(
                        AuditRecord::new(event_type, AuditSeverity::Info)
                            .profile(profile_key)
                            .operation(op)
                            .resource(resource)
                            .success(true)
                            .session(self.session_id()),
                    )
                    .await;
                Ok(value)
            }
            Err(err) => {
                self.audit
                    .record(
                        AuditRecord::new(event_type, AuditSeverity::Error)
                            .profile(profile_key)
                            .operation(op)
                            .resource(resource)
                            .details(err.to_string())
                            .session(self.session_id()),
                    )
                    .await;
                Err(err.into())
            }
        }
    }

    /// Record a sanitizer refusal as a Critical security event and return
    /// the error the caller must surface. The raw violation detail goes to
    /// the audit trail, never to the end user.
    pub async fn report_unsafe_input(
        &self,
        operation: Operation,
        resource: &str,
        violation: &UnsafeInput,
    ) -> SecureCallError {
        if let Err(context_err) = self.context.validate() {
            return context_err.into();
        }
        let profile_key = match self.context.current_child() {
            Ok(child) => child.key(),
            Err(context_err) => return context_err.into(),
        };
        let reason = violation.to_string();
        self.audit
            .record(
                AuditRecord::new(AuditEventType::SecurityEvent, AuditSeverity::Critical)
                    .profile(profile_key.clone())
                    .operation(operation.as_str())
                    .resource(resource)
                    .details(reason.clone())
                    .session(self.session_id()),
            )
            .await;
        self.events.publish_policy_event(PolicyEvent::UnsafeInputBlocked {
            profile: profile_key,
            operation: operation.as_str().to_string(),
            reason: reason.clone(),
            blocked_at: Utc::now(),
        });
        SecureCallError::SecurityViolation { reason }
    }
}
