//! Ephemeral per-conversation context owned by the calling layer.

use serde::{Deserialize, Serialize};

/// Whether the client has been seen before.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientClassification {
    #[default]
    New,
    Returning,
}

/// Facts about the current conversation that are not knowledge facts.
///
/// The orchestrator only reads this; the caller updates it (for example
/// when a tool side effect marks the case as triaged).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default)]
    pub classification: ClientClassification,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_status: Option<String>,
}

impl SessionContext {
    pub fn returning() -> Self {
        Self {
            classification: ClientClassification::Returning,
            ..Self::default()
        }
    }

    /// Record that the team has been told about this case.
    pub fn mark_triaged(&mut self, client_name: &str) {
        if !client_name.trim().is_empty() {
            self.client_name = Some(client_name.trim().to_string());
        }
        self.case_status = Some(format!(
            "triaged: the team has been notified about {}",
            self.client_name.as_deref().unwrap_or("this client")
        ));
    }

    pub fn is_triaged(&self) -> bool {
        self.case_status
            .as_deref()
            .is_some_and(|s| s.starts_with("triaged"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_new_client() {
        let ctx = SessionContext::default();
        assert_eq!(ctx.classification, ClientClassification::New);
        assert!(!ctx.is_triaged());
    }

    #[test]
    fn mark_triaged_sets_name_and_status() {
        let mut ctx = SessionContext::returning();
        ctx.mark_triaged("Maria Souza");
        assert!(ctx.is_triaged());
        assert_eq!(ctx.client_name.as_deref(), Some("Maria Souza"));
        assert!(ctx.case_status.unwrap().contains("Maria Souza"));
    }
}
