// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Secure AI surface: summarization and queries for the bound child.
//!
//! Input is sanitized before delegation and model output is filtered before
//! returning; both are audited regardless of outcome. This surface never
//! propagates raw errors to its caller: refusals and inner failures come
//! back as configured user-safe replies, while lifecycle and throttle
//! errors still fail fast.

use std::sync::Arc;

use crate::application::pipeline::{SecureCallError, SecurePipeline};
use crate::domain::audit::AuditEventType;
use crate::domain::capabilities::AssistantModel;
use crate::domain::config::AssistantSettings;
use crate::domain::permissions::Operation;
use crate::domain::sanitizer::PromptSanitizer;

pub struct SecureAssistService {
    pipeline: Arc<SecurePipeline>,
    inner: Arc<dyn AssistantModel>,
    sanitizer: PromptSanitizer,
    refusal_reply: String,
    fallback_reply: String,
}

impl SecureAssistService {
    pub fn new(
        pipeline: Arc<SecurePipeline>,
        inner: Arc<dyn AssistantModel>,
        settings: &AssistantSettings,
    ) -> Self {
        Self {
            pipeline,
            inner,
            sanitizer: PromptSanitizer::with_max_length(settings.max_prompt_chars),
            refusal_reply: settings.refusal_reply.clone(),
            fallback_reply: settings.fallback_reply.clone(),
        }
    }

    /// Summarize `text` on behalf of the bound child.
    pub async fn summarize(&self, text: &str) -> Result<String, SecureCallError> {
        let resource = "assistant:summarize";
        let result = match self.sanitizer.sanitize(text) {
            Ok(clean) => {
                let inner = Arc::clone(&self.inner);
                self.pipeline
                    .run(
                        Operation::AiSummarize,
                        resource,
                        AuditEventType::DataAccess,
                        move |_child| async move { inner.summarize(&clean).await },
                    )
                    .await
            }
            Err(violation) => Err(self
                .pipeline
                .report_unsafe_input(Operation::AiSummarize, resource, &violation)
                .await),
        };
        self.map_reply(result)
    }

    /// Answer a free-form question on behalf of the bound child.
    pub async fn query(&self, prompt: &str) -> Result<String, SecureCallError> {
        let resource = "assistant:query";
        let result = match self.sanitizer.sanitize(prompt) {
            Ok(clean) => {
                let inner = Arc::clone(&self.inner);
                self.pipeline
                    .run(
                        Operation::AiQuery,
                        resource,
                        AuditEventType::DataAccess,
                        move |_child| async move { inner.query(&clean).await },
                    )
                    .await
            }
            Err(violation) => Err(self
                .pipeline
                .report_unsafe_input(Operation::AiQuery, resource, &violation)
                .await),
        };
        self.map_reply(result)
    }

    /// Translate pipeline outcomes into the user-facing contract: refusals
    /// become the configured safe replies, successful output is filtered,
    /// lifecycle and throttle errors propagate.
    fn map_reply(&self, result: Result<String, SecureCallError>) -> Result<String, SecureCallError> {
        match result {
            Ok(raw) => Ok(self.sanitizer.filter_output(&raw)),
            Err(SecureCallError::PermissionDenied { .. })
            | Err(SecureCallError::SecurityViolation { .. }) => Ok(self.refusal_reply.clone()),
            // Inner failure was already audited by the pipeline; the caller
            // gets the localized fallback, never the raw error.
            Err(SecureCallError::Capability(_)) => Ok(self.fallback_reply.clone()),
            Err(other) => Err(other),
        }
    }
}
