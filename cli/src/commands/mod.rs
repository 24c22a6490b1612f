// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! CLI command implementations. Every command builds the isolation core
//! against the offline in-memory adapters.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use vesta_assistant_core::application::coordinator::ProfileCoordinator;
use vesta_assistant_core::application::scope::ScopeFactory;
use vesta_assistant_core::domain::audit::AuditLog;
use vesta_assistant_core::domain::capabilities::{
    AssistantModel, Letter, LetterStore, PortalAuthClient, Reminder,
};
use vesta_assistant_core::domain::config::AssistantConfig;
use vesta_assistant_core::infrastructure::audit_log::InMemoryAuditLog;
use vesta_assistant_core::infrastructure::event_bus::EventBus;
use vesta_assistant_core::infrastructure::offline::{
    OfflineAssistantModel, OfflineLetterStore, OfflinePortalClient,
};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Load the configuration file and report validation results
    Validate,
}

pub fn run_config(config_path: &Path, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Validate => {
            let config = AssistantConfig::from_yaml_file(config_path)
                .with_context(|| format!("configuration {} is invalid", config_path.display()))?;
            println!("{} {}", "✓".green(), config_path.display());
            println!("  profiles:        {}", config.profiles.len());
            println!("  grants:          {}", config.permissions.grants.len());
            println!(
                "  rate limit:      {} per {:?} (default)",
                config.rate_limit.default_ceiling, config.rate_limit.window
            );
            for profile in &config.profiles {
                println!("  - {}", profile.key());
            }
            Ok(())
        }
    }
}

pub async fn run_health(config_path: &Path) -> Result<()> {
    let config = AssistantConfig::from_yaml_file(config_path)?;
    let (coordinator, _store) = offline_coordinator(&config);

    let report = coordinator.health_check().await;
    let mut failed = false;
    for (capability, healthy) in &report {
        if *healthy {
            println!("{} {}", "✓".green(), capability);
        } else {
            println!("{} {}", "✗".red(), capability);
            failed = true;
        }
    }
    if failed {
        bail!("health check failed");
    }
    Ok(())
}

pub async fn run_digest(config_path: &Path, date: Option<NaiveDate>) -> Result<()> {
    let config = AssistantConfig::from_yaml_file(config_path)?;
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    tracing::info!(profiles = config.profiles.len(), %date, "running offline digest");
    let (coordinator, store) = offline_coordinator(&config);

    // Offline mode: seed a sample letter per profile so the digest
    // exercises the full read → summarize → remind path.
    for profile in &config.profiles {
        store.seed_letter(
            profile,
            Letter {
                key: format!("letter-{date}"),
                date,
                subject: "Weekly newsletter".to_string(),
                body: format!(
                    "Dear parents of {}, please remember the field trip on Friday \
                     and pack a lunch.",
                    profile.key()
                ),
            },
        );
    }

    let results = coordinator
        .execute_for_all(&config.profiles, move |services| async move {
            match services.letters.read_letter(date).await? {
                Some(letter) => {
                    let summary = services.assistant.summarize(&letter.body).await?;
                    services
                        .letters
                        .write_reminder(Reminder {
                            key: format!("digest-{date}"),
                            due: Utc::now(),
                            message: summary.clone(),
                        })
                        .await?;
                    Ok(Some(summary))
                }
                None => Ok(None),
            }
        })
        .await;

    let mut keys: Vec<&String> = results.keys().collect();
    keys.sort();
    let mut failures = 0usize;
    for key in keys {
        match &results[key] {
            Ok(Some(summary)) => {
                println!("{} {}", key.green().bold(), date);
                println!("    {summary}");
            }
            Ok(None) => {
                println!("{} {} {}", key.yellow().bold(), date, "(no letter)".dimmed());
            }
            Err(error) => {
                failures += 1;
                println!("{} {} {}", key.red().bold(), date, error);
            }
        }
    }
    if failures > 0 {
        bail!("digest failed for {failures} profile(s)");
    }
    Ok(())
}

/// Wire the isolation core against the offline adapters.
fn offline_coordinator(config: &AssistantConfig) -> (ProfileCoordinator, Arc<OfflineLetterStore>) {
    let store = Arc::new(OfflineLetterStore::new());
    let letter_store: Arc<dyn LetterStore> = store.clone();
    let portal: Arc<dyn PortalAuthClient> = Arc::new(OfflinePortalClient::new());
    let model: Arc<dyn AssistantModel> = Arc::new(OfflineAssistantModel::new());
    let audit: Arc<dyn AuditLog> = Arc::new(InMemoryAuditLog::new());
    let events = EventBus::with_default_capacity();

    let factory = ScopeFactory::new(config, letter_store, portal, model, audit, events);
    (ProfileCoordinator::new(Arc::new(factory)), store)
}
