// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
// Event Bus Implementation - Pub/Sub for Domain Events
//
// Provides in-memory event streaming using tokio broadcast channels.
// Enables real-time event streaming to the CLI and other observers. Events
// are best-effort notifications; the audit trail is the durable record.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::{PolicyEvent, ScopeEvent};

/// Unified domain event type for the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantEvent {
    Scope(ScopeEvent),
    Policy(PolicyEvent),
}

impl AssistantEvent {
    fn profile(&self) -> &str {
        match self {
            AssistantEvent::Scope(event) => event.profile(),
            AssistantEvent::Policy(event) => event.profile(),
        }
    }
}

/// Event bus for publishing and subscribing to domain events.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AssistantEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity. Capacity
    /// determines how many events can be buffered before old ones drop.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Event bus with the default capacity (1000).
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    pub fn publish_scope_event(&self, event: ScopeEvent) {
        self.publish(AssistantEvent::Scope(event));
    }

    pub fn publish_policy_event(&self, event: PolicyEvent) {
        self.publish(AssistantEvent::Policy(event));
    }

    fn publish(&self, event: AssistantEvent) {
        debug!("Publishing event: {:?}", event);
        // send() returns the number of receivers; zero subscribers is fine.
        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all domain events.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to events for a single profile (by natural key).
    pub fn subscribe_profile(&self, profile_key: impl Into<String>) -> ProfileEventReceiver {
        ProfileEventReceiver {
            receiver: self.sender.subscribe(),
            profile_key: profile_key.into(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Receiver for all domain events.
pub struct EventReceiver {
    receiver: broadcast::Receiver<AssistantEvent>,
}

impl EventReceiver {
    /// Receive the next event (waits until one is available).
    pub async fn recv(&mut self) -> Result<AssistantEvent, EventBusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => EventBusError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }

    /// Try to receive an event without waiting.
    pub fn try_recv(&mut self) -> Result<AssistantEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver filtered to a single profile's events.
pub struct ProfileEventReceiver {
    receiver: broadcast::Receiver<AssistantEvent>,
    profile_key: String,
}

impl ProfileEventReceiver {
    /// Receive the next event attributed to the subscribed profile; events
    /// for other profiles are skipped.
    pub async fn recv(&mut self) -> Result<AssistantEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(|e| match e {
                broadcast::error::RecvError::Closed => EventBusError::Closed,
                broadcast::error::RecvError::Lagged(n) => {
                    warn!("Event receiver lagged by {} events", n);
                    EventBusError::Lagged(n)
                }
            })?;
            if event.profile() == self.profile_key {
                return Ok(event);
            }
        }
    }
}

/// Errors that can occur when receiving events.
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::context::ScopeId;
    use chrono::Utc;

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new(10);
        let mut receiver = bus.subscribe();

        let scope_id = ScopeId::new();
        bus.publish_scope_event(ScopeEvent::ScopeCreated {
            scope_id,
            profile: "Alice Example".to_string(),
            created_at: Utc::now(),
        });

        match receiver.recv().await.unwrap() {
            AssistantEvent::Scope(ScopeEvent::ScopeCreated { scope_id: id, .. }) => {
                assert_eq!(id, scope_id);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_profile_filtering() {
        let bus = EventBus::new(10);
        let mut receiver = bus.subscribe_profile("Alice Example");

        bus.publish_policy_event(PolicyEvent::PermissionDenied {
            profile: "Bob Example".to_string(),
            operation: "delete:data".to_string(),
            denied_at: Utc::now(),
        });
        bus.publish_policy_event(PolicyEvent::PermissionDenied {
            profile: "Alice Example".to_string(),
            operation: "delete:data".to_string(),
            denied_at: Utc::now(),
        });

        let event = receiver.recv().await.unwrap();
        match event {
            AssistantEvent::Policy(PolicyEvent::PermissionDenied { profile, .. }) => {
                assert_eq!(profile, "Alice Example");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_try_recv_on_idle_bus_reports_empty() {
        let bus = EventBus::new(4);
        let mut receiver = bus.subscribe();
        assert!(matches!(receiver.try_recv(), Err(EventBusError::Empty)));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut receiver1 = bus.subscribe();
        let mut receiver2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish_scope_event(ScopeEvent::ScopeDisposed {
            scope_id: ScopeId::new(),
            profile: "Alice Example".to_string(),
            disposed_at: Utc::now(),
        });

        let _ = receiver1.recv().await.unwrap();
        let _ = receiver2.recv().await.unwrap();
    }
}
