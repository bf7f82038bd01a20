//! File-based backends: persistent JSON-lines storage.
//!
//! Each line is one JSON-encoded record. Both logs are append-only, so writes
//! open the file in append mode instead of rewriting it, and a crash can at
//! worst leave one truncated trailing line (skipped on load).
//!
//! Default locations: `~/.casewise/knowledge.jsonl` and
//! `~/.casewise/transcripts/<conversation>.jsonl`.

use async_trait::async_trait;
use casewise_core::error::MemoryError;
use casewise_core::knowledge::{KnowledgeFact, KnowledgeStore};
use casewise_core::message::{ConversationId, Turn};
use casewise_core::transcript::TranscriptStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Read every decodable record from a JSONL file. Missing file = empty.
fn load_jsonl<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<T>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping corrupted record");
                None
            }
        })
        .collect()
}

/// Append one record as a line, creating parent directories as needed.
fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> Result<(), MemoryError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| MemoryError::Storage(format!("Failed to create directory: {e}")))?;
    }

    let mut line = serde_json::to_string(record)
        .map_err(|e| MemoryError::Serialization(e.to_string()))?;
    line.push('\n');

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| MemoryError::Storage(format!("Failed to open {}: {e}", path.display())))?;
    file.write_all(line.as_bytes())
        .map_err(|e| MemoryError::Storage(format!("Failed to write {}: {e}", path.display())))?;
    Ok(())
}

/// A file-backed fact log.
///
/// Facts are loaded into memory on creation; appends go to disk first and
/// are only visible once durable.
pub struct FileKnowledge {
    path: PathBuf,
    facts: Arc<RwLock<Vec<KnowledgeFact>>>,
}

impl FileKnowledge {
    pub fn new(path: PathBuf) -> Self {
        let facts: Vec<KnowledgeFact> = load_jsonl(&path);
        debug!(path = %path.display(), count = facts.len(), "Knowledge log loaded");
        Self {
            path,
            facts: Arc::new(RwLock::new(facts)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KnowledgeStore for FileKnowledge {
    fn name(&self) -> &str {
        "file"
    }

    async fn append(&self, mut fact: KnowledgeFact) -> Result<String, MemoryError> {
        if fact.id.is_empty() {
            fact.id = Uuid::new_v4().to_string();
        }
        let id = fact.id.clone();
        let mut facts = self.facts.write().await;
        append_jsonl(&self.path, &fact)?;
        facts.push(fact);
        Ok(id)
    }

    async fn all(&self) -> Result<Vec<KnowledgeFact>, MemoryError> {
        let mut facts = self.facts.read().await.clone();
        // Stable: equal timestamps keep file order
        facts.sort_by_key(|f| f.created_at);
        Ok(facts)
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.facts.read().await.len())
    }
}

/// One JSONL file per conversation under a directory.
pub struct FileTranscript {
    dir: PathBuf,
}

impl FileTranscript {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// File for a conversation. IDs are reduced to a filesystem-safe alphabet.
    fn path_for(&self, conversation_id: &ConversationId) -> PathBuf {
        let safe: String = conversation_id
            .0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.jsonl"))
    }
}

#[async_trait]
impl TranscriptStore for FileTranscript {
    fn name(&self) -> &str {
        "file"
    }

    async fn append(&self, conversation_id: &ConversationId, turn: Turn) -> Result<(), MemoryError> {
        append_jsonl(&self.path_for(conversation_id), &turn)
    }

    async fn load(&self, conversation_id: &ConversationId) -> Result<Vec<Turn>, MemoryError> {
        Ok(load_jsonl(&self.path_for(conversation_id)))
    }
}
