// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Permission Catalog
//!
//! Fail-closed whitelist of the operations a scope may perform on behalf of
//! its bound child. The catalog is configured as strings (the boundary form)
//! but every grant is checked against the closed [`Operation`] enumeration
//! at startup so a typo cannot silently widen or narrow the whitelist.
//!
//! Unknown operation ⇒ deny. Lookup is case-insensitive. There is no
//! fail-open path.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Closed set of operations recognised by the isolation core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadLetter,
    WriteReminder,
    DeleteData,
    AiSummarize,
    AiQuery,
    AuthLogin,
    AuthCheck,
    AuthInvalidate,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::ReadLetter,
        Operation::WriteReminder,
        Operation::DeleteData,
        Operation::AiSummarize,
        Operation::AiQuery,
        Operation::AuthLogin,
        Operation::AuthCheck,
        Operation::AuthInvalidate,
    ];

    /// The configuration/boundary string form of this operation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Operation::ReadLetter => "read:letter",
            Operation::WriteReminder => "write:reminder",
            Operation::DeleteData => "delete:data",
            Operation::AiSummarize => "ai:summarize",
            Operation::AiQuery => "ai:query",
            Operation::AuthLogin => "auth:login",
            Operation::AuthCheck => "auth:check",
            Operation::AuthInvalidate => "auth:invalidate",
        }
    }

    /// Case-insensitive parse of the boundary string form.
    pub fn parse(value: &str) -> Option<Operation> {
        let needle = value.trim().to_ascii_lowercase();
        Operation::ALL.iter().copied().find(|op| op.as_str() == needle)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Startup validation failure for configured grants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unrecognized operation grant '{grant}' (known operations: {known})")]
    UnknownGrant { grant: String, known: String },
}

/// Fail-closed, case-insensitive whitelist of operation strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionCatalog {
    grants: HashSet<String>,
}

impl PermissionCatalog {
    /// Build a catalog from configured grant strings. Grants are normalised
    /// to lowercase; blank entries are dropped.
    pub fn from_grants<I, S>(grants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let grants = grants
            .into_iter()
            .map(|g| g.as_ref().trim().to_ascii_lowercase())
            .filter(|g| !g.is_empty())
            .collect();
        Self { grants }
    }

    /// Catalog granting every recognised operation. Development and test
    /// default.
    pub fn allow_all() -> Self {
        Self::from_grants(Operation::ALL.iter().map(|op| op.as_str()))
    }

    /// Case-insensitive membership test. Blank input and unknown strings
    /// deny.
    pub fn permits(&self, operation: &str) -> bool {
        let needle = operation.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.grants.contains(&needle)
    }

    /// Startup typo check: every configured grant must name a recognised
    /// [`Operation`].
    pub fn verify_known(&self) -> Result<(), CatalogError> {
        for grant in &self.grants {
            if Operation::parse(grant).is_none() {
                return Err(CatalogError::UnknownGrant {
                    grant: grant.clone(),
                    known: Operation::ALL
                        .iter()
                        .map(|op| op.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = PermissionCatalog::from_grants(["Read:Letter", "AI:QUERY"]);
        assert!(catalog.permits("read:letter"));
        assert!(catalog.permits("READ:LETTER"));
        assert!(catalog.permits("ai:query"));
    }

    #[test]
    fn test_unknown_operation_denies() {
        let catalog = PermissionCatalog::allow_all();
        assert!(!catalog.permits("drop:table"));
        assert!(!catalog.permits(""));
        assert!(!catalog.permits("  "));
    }

    #[test]
    fn test_empty_catalog_denies_everything() {
        let catalog = PermissionCatalog::from_grants(Vec::<String>::new());
        for op in Operation::ALL {
            assert!(!catalog.permits(op.as_str()));
        }
    }

    #[test]
    fn test_verify_known_accepts_recognised_grants() {
        assert!(PermissionCatalog::allow_all().verify_known().is_ok());
    }

    #[test]
    fn test_verify_known_rejects_typo() {
        let catalog = PermissionCatalog::from_grants(["read:lettre"]);
        assert!(matches!(
            catalog.verify_known(),
            Err(CatalogError::UnknownGrant { grant, .. }) if grant == "read:lettre"
        ));
    }

    #[test]
    fn test_operation_parse_round_trip() {
        for op in Operation::ALL {
            assert_eq!(Operation::parse(op.as_str()), Some(op));
            assert_eq!(Operation::parse(&op.as_str().to_uppercase()), Some(op));
        }
        assert_eq!(Operation::parse("no:such"), None);
    }
}
