//! In-memory backends: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use casewise_core::error::MemoryError;
use casewise_core::knowledge::{KnowledgeFact, KnowledgeStore};
use casewise_core::message::{ConversationId, Turn};
use casewise_core::transcript::TranscriptStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// An append-only fact log kept in a Vec.
pub struct InMemoryKnowledge {
    facts: Arc<RwLock<Vec<KnowledgeFact>>>,
}

impl InMemoryKnowledge {
    pub fn new() -> Self {
        Self {
            facts: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryKnowledge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledge {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, mut fact: KnowledgeFact) -> Result<String, MemoryError> {
        if fact.id.is_empty() {
            fact.id = Uuid::new_v4().to_string();
        }
        let id = fact.id.clone();
        self.facts.write().await.push(fact);
        Ok(id)
    }

    async fn all(&self) -> Result<Vec<KnowledgeFact>, MemoryError> {
        Ok(self.facts.read().await.clone())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.facts.read().await.len())
    }
}

/// Per-conversation turn logs kept in a map.
pub struct InMemoryTranscript {
    logs: Arc<RwLock<HashMap<ConversationId, Vec<Turn>>>>,
}

impl InMemoryTranscript {
    pub fn new() -> Self {
        Self {
            logs: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryTranscript {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscript {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, conversation_id: &ConversationId, turn: Turn) -> Result<(), MemoryError> {
        self.logs
            .write()
            .await
            .entry(conversation_id.clone())
            .or_default()
            .push(turn);
        Ok(())
    }

    async fn load(&self, conversation_id: &ConversationId) -> Result<Vec<Turn>, MemoryError> {
        Ok(self
            .logs
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casewise_core::knowledge::FactCategory;
    use casewise_core::message::Role;

    #[tokio::test]
    async fn facts_come_back_in_insertion_order() {
        let store = InMemoryKnowledge::new();
        store
            .append(KnowledgeFact::new("first", FactCategory::Preference))
            .await
            .unwrap();
        store
            .append(KnowledgeFact::new("second", FactCategory::Vocabulary))
            .await
            .unwrap();

        let facts = store.all().await.unwrap();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].content, "first");
        assert_eq!(facts[1].category, FactCategory::Vocabulary);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn append_assigns_missing_id() {
        let store = InMemoryKnowledge::new();
        let mut fact = KnowledgeFact::new("x", FactCategory::Correction);
        fact.id.clear();
        let id = store.append(fact).await.unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn transcripts_are_isolated_per_conversation() {
        let store = InMemoryTranscript::new();
        let a = ConversationId::from("a");
        let b = ConversationId::from("b");
        store.append(&a, Turn::user("oi")).await.unwrap();
        store.append(&a, Turn::system("triage")).await.unwrap();
        store.append(&b, Turn::user("bom dia")).await.unwrap();

        let log_a = store.load(&a).await.unwrap();
        assert_eq!(log_a.len(), 2);
        assert_eq!(log_a[1].role, Role::System);
        assert_eq!(store.load(&b).await.unwrap().len(), 1);
        assert!(store.load(&ConversationId::from("c")).await.unwrap().is_empty());
    }
}
