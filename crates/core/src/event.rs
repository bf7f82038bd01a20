//! Domain event system: decoupled observation of what the assistant does.
//!
//! Events are published when something interesting happens in the system.
//! Observers (the CLI, tests, future dashboards) subscribe without the
//! orchestrator knowing about them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// One (credential, model) attempt failed
    AttemptFailed {
        conversation_id: String,
        model: String,
        attempt: usize,
        quota: bool,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// The model produced the final answer for a turn
    ResponseGenerated {
        conversation_id: String,
        model: String,
        attempts: usize,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A case was handed to the team
    CaseTriaged {
        conversation_id: String,
        client_name: String,
        timestamp: DateTime<Utc>,
    },

    /// A knowledge fact was stored
    KnowledgeSaved {
        category: String,
        timestamp: DateTime<Utc>,
    },

    /// Every attempt for a turn failed
    CascadeExhausted {
        conversation_id: String,
        attempts: usize,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::ToolExecuted {
            tool_name: "save_knowledge".into(),
            success: true,
            duration_ms: 3,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ToolExecuted {
                tool_name, success, ..
            } => {
                assert_eq!(tool_name, "save_knowledge");
                assert!(success);
            }
            _ => panic!("Expected ToolExecuted event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::CascadeExhausted {
            conversation_id: "c1".into(),
            attempts: 6,
            timestamp: Utc::now(),
        });
    }
}
