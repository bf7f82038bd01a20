//! Provider trait: the abstraction over language-model backends.
//!
//! A request is self-contained: it carries the credential, the system
//! instruction, the tool schemas and every content block the model should
//! see. Multi-step exchanges (user turn, tool call, tool result) are built by
//! appending [`Content`] blocks and sending the whole list again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::error::ProviderError;
use crate::tool::ToolCall;

/// Sampling temperature used for conversation turns.
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Speaker of a content block on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRole {
    User,
    Model,
}

/// One piece of a content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        mime_type: String,
        data: String,
    },
    FunctionCall {
        name: String,
        args: serde_json::Value,
    },
    FunctionResponse {
        name: String,
        response: serde_json::Value,
    },
}

/// An ordered group of parts from one speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: ContentRole,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: ContentRole::User,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: ContentRole::Model,
            parts: vec![Part::Text { text: text.into() }],
        }
    }
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A single request to the backend.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Account to bill
    pub credential: Credential,

    /// Model identifier (e.g., "gemini-2.5-flash")
    pub model: String,

    /// System instruction text
    pub system_instruction: String,

    /// Conversation content, oldest first
    pub contents: Vec<Content>,

    /// Tools the model may call
    pub tools: Vec<ToolDefinition>,

    /// Sampling temperature
    pub temperature: f32,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    /// Concatenated text parts, if any
    pub text: Option<String>,

    /// Function calls, in the order emitted
    pub tool_calls: Vec<ToolCall>,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded
    pub model: String,
}

impl ProviderResponse {
    /// Text with surrounding whitespace removed, or `None` if blank.
    pub fn visible_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Neither visible text nor a function call: nothing to act on.
    pub fn is_empty(&self) -> bool {
        self.visible_text().is_none() && self.tool_calls.is_empty()
    }

    /// The model's side of the exchange, for replaying in a follow-up.
    ///
    /// Only `answered` calls are replayed: every function call sent back
    /// must be paired with a function response.
    pub fn to_content(&self, answered: &[&ToolCall]) -> Content {
        let mut parts = Vec::new();
        if let Some(text) = self.visible_text() {
            parts.push(Part::Text {
                text: text.to_string(),
            });
        }
        for call in answered {
            parts.push(Part::FunctionCall {
                name: call.name.clone(),
                args: call.arguments.clone(),
            });
        }
        Content {
            role: ContentRole::Model,
            parts,
        }
    }
}

/// The core Provider trait.
///
/// The orchestrator calls `complete()` once per attempt and once per tool
/// follow-up, without knowing which backend is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}
