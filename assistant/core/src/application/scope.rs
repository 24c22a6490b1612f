// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Execution Scope
//!
//! One scope per profile per unit of work. Creating a scope allocates a
//! fresh [`ProfileContext`] plus fresh secure service instances wired to it,
//! so nothing identity-bearing is ever shared between two profiles' scopes.
//! The only structures a scope shares with its siblings are the append-only
//! audit log and the counter-only rate limiter, both injected through the
//! factory.
//!
//! ## Invariants
//!
//! - The scope exclusively owns its context; disposal clears the binding
//!   and makes every subsequent access fail immediately (never blocks).
//! - `execute` calls issued by the caller run in order within one scope;
//!   scopes of different profiles are fully independent.
//! - Disposal is idempotent and also runs on `Drop` (RAII), so a scope
//!   cannot leak its binding past its lifetime.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;

use crate::application::assist_service::SecureAssistService;
use crate::application::letter_service::SecureLetterService;
use crate::application::pipeline::SecurePipeline;
use crate::application::portal_service::SecurePortalService;
use crate::domain::audit::AuditLog;
use crate::domain::capabilities::{AssistantModel, LetterStore, PortalAuthClient};
use crate::domain::config::{AssistantConfig, AssistantSettings};
use crate::domain::context::{ContextError, ProfileContext, ScopeId};
use crate::domain::events::ScopeEvent;
use crate::domain::permissions::PermissionCatalog;
use crate::domain::profile::ChildProfile;
use crate::domain::validation;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::rate_limiter::RateLimiter;

/// The services resolvable inside one scope. Handed to the caller's
/// operation by [`ExecutionScope::execute`].
pub struct ScopeServices {
    pub context: Arc<ProfileContext>,
    pub letters: SecureLetterService,
    pub portal: SecurePortalService,
    pub assistant: SecureAssistService,
}

/// Builds execution scopes. Holds the shared structures (catalog, limiter,
/// audit log, event bus) and the inner capability clients; everything else
/// is created fresh per scope.
pub struct ScopeFactory {
    catalog: Arc<PermissionCatalog>,
    limiter: Arc<RateLimiter>,
    audit: Arc<dyn AuditLog>,
    events: EventBus,
    settings: AssistantSettings,
    letter_store: Arc<dyn LetterStore>,
    portal_client: Arc<dyn PortalAuthClient>,
    assistant_model: Arc<dyn AssistantModel>,
}

impl ScopeFactory {
    pub fn new(
        config: &AssistantConfig,
        letter_store: Arc<dyn LetterStore>,
        portal_client: Arc<dyn PortalAuthClient>,
        assistant_model: Arc<dyn AssistantModel>,
        audit: Arc<dyn AuditLog>,
        events: EventBus,
    ) -> Self {
        Self {
            catalog: Arc::new(config.catalog()),
            limiter: Arc::new(RateLimiter::new(config.rate_limit.clone())),
            audit,
            events,
            settings: config.assistant.clone(),
            letter_store,
            portal_client,
            assistant_model,
        }
    }

    pub fn catalog(&self) -> &Arc<PermissionCatalog> {
        &self.catalog
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn audit(&self) -> &Arc<dyn AuditLog> {
        &self.audit
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Create a scope bound to `child`. The context is bound immediately;
    /// construction fails on an empty profile.
    pub fn create_scope(&self, child: &ChildProfile) -> Result<ExecutionScope, ContextError> {
        let context = Arc::new(ProfileContext::new());
        context.set_child(child.clone())?;

        let pipeline = Arc::new(SecurePipeline::new(
            Arc::clone(&context),
            Arc::clone(&self.catalog),
            Arc::clone(&self.limiter),
            Arc::clone(&self.audit),
            self.events.clone(),
            self.settings.max_context_lifetime,
        ));

        let services = Arc::new(ScopeServices {
            context: Arc::clone(&context),
            letters: SecureLetterService::new(
                Arc::clone(&pipeline),
                Arc::clone(&self.letter_store),
            ),
            portal: SecurePortalService::new(
                Arc::clone(&pipeline),
                Arc::clone(&self.portal_client),
            ),
            assistant: SecureAssistService::new(
                Arc::clone(&pipeline),
                Arc::clone(&self.assistant_model),
                &self.settings,
            ),
        });

        self.events.publish_scope_event(ScopeEvent::ScopeCreated {
            scope_id: context.scope_id(),
            profile: child.key(),
            created_at: Utc::now(),
        });

        Ok(ExecutionScope {
            context,
            services,
            profile: child.clone(),
            events: self.events.clone(),
        })
    }
}

/// The execution boundary bound to exactly one profile's context.
pub struct ExecutionScope {
    context: Arc<ProfileContext>,
    services: Arc<ScopeServices>,
    profile: ChildProfile,
    events: EventBus,
}

impl ExecutionScope {
    pub fn scope_id(&self) -> ScopeId {
        self.context.scope_id()
    }

    pub fn context(&self) -> &Arc<ProfileContext> {
        &self.context
    }

    /// The profile this scope was created for.
    pub fn profile(&self) -> &ChildProfile {
        &self.profile
    }

    /// Run the caller's operation against this scope's services. The
    /// operation's own result type passes through unchanged.
    ///
    /// # Errors
    ///
    /// - [`ContextError::Disposed`] — the scope was disposed
    /// - [`ContextError::Integrity`] — the bound profile no longer matches
    ///   the profile the scope was created for
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, ContextError>
    where
        F: FnOnce(Arc<ScopeServices>) -> Fut,
        Fut: Future<Output = T>,
    {
        self.context.validate()?;
        if !validation::validate_context_matches_child(&self.context, &self.profile) {
            return Err(ContextError::Integrity(self.context.scope_id()));
        }
        Ok(operation(Arc::clone(&self.services)).await)
    }

    /// Tear the scope down: dispose the context (clearing the binding) and
    /// announce the disposal. Idempotent.
    pub fn dispose(&self) {
        if self.context.is_disposed() {
            return;
        }
        self.context.dispose();
        self.events.publish_scope_event(ScopeEvent::ScopeDisposed {
            scope_id: self.context.scope_id(),
            profile: self.profile.key(),
            disposed_at: Utc::now(),
        });
    }
}

impl Drop for ExecutionScope {
    fn drop(&mut self) {
        self.dispose();
    }
}
