// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Coordinator behaviour: per-profile failure isolation, aggregation and
//! the startup health check.

use std::sync::Arc;

use vesta_assistant_core::application::coordinator::{
    CoordinatorError, ProfileCoordinator, REQUIRED_CAPABILITIES,
};
use vesta_assistant_core::application::pipeline::SecureCallError;
use vesta_assistant_core::application::scope::ScopeFactory;
use vesta_assistant_core::domain::capabilities::CapabilityError;
use vesta_assistant_core::domain::config::AssistantConfig;
use vesta_assistant_core::domain::profile::ChildProfile;
use vesta_assistant_core::infrastructure::audit_log::InMemoryAuditLog;
use vesta_assistant_core::infrastructure::event_bus::EventBus;
use vesta_assistant_core::infrastructure::offline::{
    OfflineAssistantModel, OfflineLetterStore, OfflinePortalClient,
};

fn coordinator() -> ProfileCoordinator {
    let factory = ScopeFactory::new(
        &AssistantConfig::default(),
        Arc::new(OfflineLetterStore::new()),
        Arc::new(OfflinePortalClient::new()),
        Arc::new(OfflineAssistantModel::new()),
        Arc::new(InMemoryAuditLog::new()),
        EventBus::with_default_capacity(),
    );
    ProfileCoordinator::new(Arc::new(factory))
}

fn family() -> Vec<ChildProfile> {
    vec![
        ChildProfile::new("Alice", "Example"),
        ChildProfile::new("Bob", "Example"),
        ChildProfile::new("Carol", "Example"),
    ]
}

#[tokio::test]
async fn test_execute_for_all_aggregates_per_profile_results() {
    let coordinator = coordinator();
    let results = coordinator
        .execute_for_all(&family(), |services| async move {
            Ok(services.context.current_child().unwrap().key())
        })
        .await;

    assert_eq!(results.len(), 3);
    for child in family() {
        let key = child.key();
        assert_eq!(results[&key].as_ref().unwrap(), &key);
    }
}

#[tokio::test]
async fn test_one_failing_profile_does_not_abort_siblings() {
    let coordinator = coordinator();
    let results = coordinator
        .execute_for_all(&family(), |services| async move {
            let key = services.context.current_child().unwrap().key();
            if key == "Bob Example" {
                return Err(SecureCallError::Capability(CapabilityError::Storage(
                    "bob's backend is down".to_string(),
                )));
            }
            Ok(key)
        })
        .await;

    assert!(results["Alice Example"].is_ok());
    assert!(results["Carol Example"].is_ok());
    assert!(matches!(
        results["Bob Example"],
        Err(CoordinatorError::Call(SecureCallError::Capability(_)))
    ));
}

#[tokio::test]
async fn test_panicking_profile_is_recorded_not_propagated() {
    let coordinator = coordinator();
    let results = coordinator
        .execute_for_all(&family(), |services| async move {
            let key = services.context.current_child().unwrap().key();
            if key == "Bob Example" {
                panic!("bob exploded");
            }
            Ok(key)
        })
        .await;

    assert_eq!(results.len(), 3);
    assert!(results["Alice Example"].is_ok());
    assert!(results["Carol Example"].is_ok());
    assert!(matches!(
        &results["Bob Example"],
        Err(CoordinatorError::Aborted(message)) if message.contains("bob exploded")
    ));
}

#[tokio::test]
async fn test_execute_in_scope_creates_runs_and_disposes() {
    let coordinator = coordinator();
    let alice = ChildProfile::new("Alice", "Example");

    let reply = coordinator
        .execute_in_scope(&alice, |services| async move {
            services.assistant.summarize("school letter body").await
        })
        .await
        .unwrap();
    assert!(reply.starts_with("Summary:"));
}

#[tokio::test]
async fn test_empty_profile_fails_its_own_entry_only() {
    let coordinator = coordinator();
    let profiles = vec![
        ChildProfile::new("Alice", "Example"),
        ChildProfile::new("", ""),
    ];
    let results = coordinator
        .execute_for_all(&profiles, |services| async move {
            Ok(services.context.current_child().unwrap().key())
        })
        .await;

    assert_eq!(results.len(), 2);
    assert!(results["Alice Example"].is_ok());
    assert!(matches!(
        results[" "],
        Err(CoordinatorError::Context(_))
    ));
}

#[tokio::test]
async fn test_health_check_reports_every_required_capability() {
    let coordinator = coordinator();
    let report = coordinator.health_check().await;

    assert_eq!(report.len(), REQUIRED_CAPABILITIES.len());
    for capability in REQUIRED_CAPABILITIES {
        assert_eq!(
            report.get(capability),
            Some(&true),
            "capability {capability} should be healthy with offline adapters"
        );
    }
}
