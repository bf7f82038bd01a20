//! Knowledge facts: durable rules the assistant learns from staff.
//!
//! Facts are append-only. Every stored fact is injected into every later
//! prompt, oldest first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MemoryError;

/// What kind of lesson a fact records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCategory {
    Preference,
    LegalRule,
    Correction,
    Vocabulary,
}

impl FactCategory {
    pub const ALL: [FactCategory; 4] = [
        FactCategory::Preference,
        FactCategory::LegalRule,
        FactCategory::Correction,
        FactCategory::Vocabulary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FactCategory::Preference => "preference",
            FactCategory::LegalRule => "legal_rule",
            FactCategory::Correction => "correction",
            FactCategory::Vocabulary => "vocabulary",
        }
    }
}

impl std::fmt::Display for FactCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FactCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FactCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| {
                format!("unknown category '{s}', expected one of: preference, legal_rule, correction, vocabulary")
            })
    }
}

/// One learned rule or preference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeFact {
    pub id: String,
    pub content: String,
    pub category: FactCategory,
    pub created_at: DateTime<Utc>,
}

impl KnowledgeFact {
    pub fn new(content: impl Into<String>, category: FactCategory) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            category,
            created_at: Utc::now(),
        }
    }
}

/// Append-only fact log.
///
/// Implementations: in-memory (tests, ephemeral runs) and JSONL file.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// The backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Append a fact. Returns its ID.
    async fn append(&self, fact: KnowledgeFact) -> Result<String, MemoryError>;

    /// Every fact, ordered by creation (oldest first).
    async fn all(&self) -> Result<Vec<KnowledgeFact>, MemoryError>;

    /// Number of stored facts.
    async fn count(&self) -> Result<usize, MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_and_displays() {
        for category in FactCategory::ALL {
            let parsed: FactCategory = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert!("opinion".parse::<FactCategory>().is_err());
    }

    #[test]
    fn category_serializes_snake_case() {
        let fact = KnowledgeFact::new("Use 'BPC' not 'LOAS'", FactCategory::LegalRule);
        let json = serde_json::to_string(&fact).unwrap();
        assert!(json.contains("\"legal_rule\""));
    }
}
