//! Turn and conversation domain types.
//!
//! These are the value objects that flow through the whole system:
//! the caller records a turn, the orchestrator shows a window of turns to the
//! model, and the transcript keeps every turn forever.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The language model
    Model,
    /// Operator-facing notes (triage reports). Never shown to the model.
    System,
}

/// Inline binary media, base64 encoded, with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    /// MIME type, e.g. `image/jpeg` or `audio/webm`
    pub mime_type: String,

    /// Base64 payload
    pub data_base64: String,
}

impl MediaAttachment {
    pub fn new(mime_type: impl Into<String>, data_base64: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data_base64: data_base64.into(),
        }
    }

    /// Text stand-in used when this media is part of older history.
    pub fn placeholder(&self) -> String {
        format!("[media attachment: {}]", self.mime_type)
    }
}

/// The payload of a new user turn: text, one attachment, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaAttachment>,
}

impl TurnContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            media: None,
        }
    }

    pub fn with_media(mut self, media: MediaAttachment) -> Self {
        self.media = Some(media);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(|t| t.trim().is_empty()) && self.media.is_none()
    }

    /// Freeze this content into a user turn for the durable log.
    pub fn into_user_turn(self) -> Turn {
        let mut turn = Turn::user(self.text.unwrap_or_default());
        turn.media = self.media;
        turn
    }
}

/// A single immutable entry in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn ID
    pub id: String,

    /// Who produced this turn
    pub role: Role,

    /// The text content (may be empty for media-only turns)
    #[serde(default)]
    pub text: String,

    /// Optional attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaAttachment>,

    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn with_role(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            media: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role(Role::User, text)
    }

    /// Create a new model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self::with_role(Role::Model, text)
    }

    /// Create a new operator-only system turn.
    pub fn system(text: impl Into<String>) -> Self {
        Self::with_role(Role::System, text)
    }

    /// The text the model sees for this turn when it is part of past history.
    pub fn history_text(&self) -> String {
        match &self.media {
            None => self.text.clone(),
            Some(media) if self.text.trim().is_empty() => media.placeholder(),
            Some(media) => format!("{} {}", media.placeholder(), self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = Turn::user("Olá");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.text, "Olá");
        assert!(turn.media.is_none());
    }

    #[test]
    fn history_text_replaces_media() {
        let mut turn = Turn::user("");
        turn.media = Some(MediaAttachment::new("audio/webm", "AAAA"));
        assert_eq!(turn.history_text(), "[media attachment: audio/webm]");

        turn.text = "meu laudo".into();
        assert_eq!(
            turn.history_text(),
            "[media attachment: audio/webm] meu laudo"
        );
        assert!(!turn.history_text().contains("AAAA"));
    }

    #[test]
    fn empty_turn_content() {
        assert!(TurnContent::default().is_empty());
        assert!(TurnContent::text("   ").is_empty());
        assert!(!TurnContent::text("oi").is_empty());
        let media_only =
            TurnContent::default().with_media(MediaAttachment::new("image/png", "iVBOR"));
        assert!(!media_only.is_empty());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::system("report")).unwrap();
        assert!(json.contains("\"role\":\"system\""));
    }

    #[test]
    fn turn_content_into_user_turn_keeps_media() {
        let turn = TurnContent::text("segue foto")
            .with_media(MediaAttachment::new("image/jpeg", "/9j/"))
            .into_user_turn();
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.text, "segue foto");
        assert_eq!(turn.media.unwrap().mime_type, "image/jpeg");
    }
}
