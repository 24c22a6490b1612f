// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Prompt Sanitizer Domain Service
//!
//! Validates and normalizes text before it reaches an AI-facing capability,
//! and filters model output before it is returned to a caller. This is a
//! domain service (not infrastructure) because input safety is a core
//! business rule for the assistant, not a technical concern.
//!
//! # Security Guarantees
//! - Rejects embedded control characters and ANSI escape sequences
//! - Rejects markup that could be re-rendered in a chat surface
//! - Enforces a maximum input length
//! - Output filtering strips control characters and truncates oversized
//!   replies

use thiserror::Error;

/// Markers that are refused outright. Matched case-insensitively against the
/// normalized input.
const BLOCKED_MARKERS: [&str; 3] = ["<script", "javascript:", "data:text/html"];

/// Sanitization errors. The variant text is safe to log; the secure pipeline
/// audits the detail but never echoes it back to an end user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsafeInput {
    #[error("input contains control characters")]
    ControlCharacters,

    #[error("input exceeds maximum length ({len} > {max})")]
    TooLong { len: usize, max: usize },

    #[error("input matches blocked marker '{0}'")]
    BlockedMarker(&'static str),

    #[error("input is empty after normalization")]
    Empty,
}

/// Prompt sanitizer domain service.
#[derive(Debug, Clone)]
pub struct PromptSanitizer {
    /// Maximum allowed input/output length in characters.
    max_len: usize,
}

impl PromptSanitizer {
    pub fn new() -> Self {
        Self { max_len: 8192 }
    }

    pub fn with_max_length(max_len: usize) -> Self {
        Self { max_len }
    }

    /// Normalize and validate text bound for an AI capability.
    ///
    /// # Errors
    ///
    /// - [`UnsafeInput::TooLong`] — input longer than the configured cap
    /// - [`UnsafeInput::ControlCharacters`] — embedded control characters
    ///   other than newline and tab
    /// - [`UnsafeInput::BlockedMarker`] — input carries a refused marker
    /// - [`UnsafeInput::Empty`] — nothing left after trimming
    pub fn sanitize(&self, input: &str) -> Result<String, UnsafeInput> {
        let len = input.chars().count();
        if len > self.max_len {
            tracing::warn!(len, max = self.max_len, "oversized prompt rejected");
            return Err(UnsafeInput::TooLong {
                len,
                max: self.max_len,
            });
        }

        // Carriage returns are normalized away; any other control character
        // besides newline and tab is a hard refusal.
        let normalized: String = input.replace("\r\n", "\n").replace('\r', "\n");
        if normalized
            .chars()
            .any(|c| c.is_control() && c != '\n' && c != '\t')
        {
            tracing::warn!("prompt with embedded control characters rejected");
            return Err(UnsafeInput::ControlCharacters);
        }

        let lowered = normalized.to_lowercase();
        for marker in BLOCKED_MARKERS {
            if lowered.contains(marker) {
                tracing::warn!(marker, "prompt with blocked marker rejected");
                return Err(UnsafeInput::BlockedMarker(marker));
            }
        }

        let trimmed = normalized.trim();
        if trimmed.is_empty() {
            return Err(UnsafeInput::Empty);
        }
        Ok(trimmed.to_string())
    }

    /// Filter model output before returning it to a caller: strip control
    /// characters (keeping newline and tab) and truncate to the configured
    /// cap.
    pub fn filter_output(&self, raw: &str) -> String {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect();
        if cleaned.chars().count() <= self.max_len {
            return cleaned.trim().to_string();
        }
        cleaned.chars().take(self.max_len).collect::<String>().trim().to_string()
    }
}

impl Default for PromptSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes() {
        let sanitizer = PromptSanitizer::new();
        let out = sanitizer.sanitize("  Please summarize this letter.\n").unwrap();
        assert_eq!(out, "Please summarize this letter.");
    }

    #[test]
    fn test_crlf_is_normalized() {
        let sanitizer = PromptSanitizer::new();
        let out = sanitizer.sanitize("line one\r\nline two").unwrap();
        assert_eq!(out, "line one\nline two");
    }

    #[test]
    fn test_control_characters_rejected() {
        let sanitizer = PromptSanitizer::new();
        assert_eq!(
            sanitizer.sanitize("hello\u{0}world"),
            Err(UnsafeInput::ControlCharacters)
        );
        assert_eq!(
            sanitizer.sanitize("hi\u{1b}[31m"),
            Err(UnsafeInput::ControlCharacters)
        );
    }

    #[test]
    fn test_blocked_markers_rejected() {
        let sanitizer = PromptSanitizer::new();
        assert!(matches!(
            sanitizer.sanitize("look <SCRIPT>alert(1)</script>"),
            Err(UnsafeInput::BlockedMarker("<script"))
        ));
    }

    #[test]
    fn test_oversized_input_rejected() {
        let sanitizer = PromptSanitizer::with_max_length(8);
        assert!(matches!(
            sanitizer.sanitize("123456789"),
            Err(UnsafeInput::TooLong { len: 9, max: 8 })
        ));
    }

    #[test]
    fn test_empty_after_trim_rejected() {
        let sanitizer = PromptSanitizer::new();
        assert_eq!(sanitizer.sanitize("   \n  "), Err(UnsafeInput::Empty));
    }

    #[test]
    fn test_output_filter_strips_and_truncates() {
        let sanitizer = PromptSanitizer::with_max_length(5);
        assert_eq!(sanitizer.filter_output("ab\u{0}cdefgh"), "abcde");
        assert_eq!(
            PromptSanitizer::new().filter_output("  clean reply\n"),
            "clean reply"
        );
    }
}
