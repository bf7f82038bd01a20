//! # Casewise Core
//!
//! Domain types, traits, and error definitions for the Casewise intake
//! assistant. This crate has **no transport dependencies**: it defines the
//! model that the provider, storage, notification and agent crates implement
//! against.
//!
//! ## Layout
//!
//! - [`credential`] and [`cascade`] decide *who* pays for a request and
//!   *which* model serves it.
//! - [`message`], [`session`] and [`knowledge`] describe what the model sees.
//! - [`tool`], [`notify`] and [`transcript`] describe what the model can do.
//! - [`provider`] is the seam to the remote language model.

pub mod cascade;
pub mod credential;
pub mod error;
pub mod event;
pub mod knowledge;
pub mod message;
pub mod notify;
pub mod provider;
pub mod session;
pub mod tool;
pub mod transcript;

// Re-export key types at crate root for ergonomics
pub use cascade::{AttemptPlan, ModelCascade};
pub use credential::{Credential, CredentialPool};
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use knowledge::{FactCategory, KnowledgeFact, KnowledgeStore};
pub use message::{ConversationId, MediaAttachment, Role, Turn, TurnContent};
pub use notify::{Notifier, TriageReport, Urgency};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use session::{ClientClassification, SessionContext};
pub use tool::{Tool, ToolCall, ToolContext, ToolRegistry, ToolResult};
pub use transcript::TranscriptStore;
