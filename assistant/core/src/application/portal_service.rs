// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Secure authentication surface: portal session lifecycle for the bound
//! child.
//!
//! Sessions are tied to the child they were issued for; a scope can never
//! present another profile's session, regardless of what the caller passes
//! in. A permission refusal on `check_session` maps to `Ok(false)`.

use std::sync::Arc;

use crate::application::pipeline::{SecureCallError, SecurePipeline};
use crate::domain::audit::AuditEventType;
use crate::domain::capabilities::{CapabilityError, PortalAuthClient, PortalSession};
use crate::domain::permissions::Operation;

pub struct SecurePortalService {
    pipeline: Arc<SecurePipeline>,
    inner: Arc<dyn PortalAuthClient>,
}

impl SecurePortalService {
    pub fn new(pipeline: Arc<SecurePipeline>, inner: Arc<dyn PortalAuthClient>) -> Self {
        Self { pipeline, inner }
    }

    /// Authenticate the bound child against the school portal.
    pub async fn login(&self) -> Result<PortalSession, SecureCallError> {
        let inner = Arc::clone(&self.inner);
        self.pipeline
            .run(
                Operation::AuthLogin,
                "portal:login",
                AuditEventType::AuthenticationAttempt,
                move |child| async move { inner.login(&child).await },
            )
            .await
    }

    /// Whether `session` is still accepted by the portal. A permission
    /// refusal is reported as `Ok(false)`.
    pub async fn check_session(&self, session: &PortalSession) -> Result<bool, SecureCallError> {
        let inner = Arc::clone(&self.inner);
        let session = session.clone();
        let result = self
            .pipeline
            .run(
                Operation::AuthCheck,
                "portal:session",
                AuditEventType::AuthenticationAttempt,
                move |child| async move {
                    if session.child_key != child.key() {
                        return Err(CapabilityError::SessionRejected(
                            "session was issued for a different profile".to_string(),
                        ));
                    }
                    inner.check_session(&session).await
                },
            )
            .await;
        match result {
            Err(SecureCallError::PermissionDenied { .. }) => Ok(false),
            other => other,
        }
    }

    /// Invalidate `session` at the portal.
    pub async fn invalidate_session(&self, session: &PortalSession) -> Result<(), SecureCallError> {
        let inner = Arc::clone(&self.inner);
        let session = session.clone();
        self.pipeline
            .run(
                Operation::AuthInvalidate,
                "portal:session",
                AuditEventType::SessionInvalidation,
                move |child| async move {
                    if session.child_key != child.key() {
                        return Err(CapabilityError::SessionRejected(
                            "session was issued for a different profile".to_string(),
                        ));
                    }
                    inner.invalidate_session(&session).await
                },
            )
            .await
    }
}
