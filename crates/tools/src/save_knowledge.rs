//! `save_knowledge`: lets staff teach the assistant during a conversation.
//!
//! Saved facts go to the append-only knowledge log and are injected into
//! every later prompt.

use async_trait::async_trait;
use casewise_core::error::ToolError;
use casewise_core::event::{DomainEvent, EventBus};
use casewise_core::knowledge::{FactCategory, KnowledgeFact, KnowledgeStore};
use casewise_core::tool::{Tool, ToolContext, ToolResult};
use std::sync::Arc;
use tracing::info;

pub struct SaveKnowledgeTool {
    store: Arc<dyn KnowledgeStore>,
    events: Option<Arc<EventBus>>,
}

impl SaveKnowledgeTool {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self {
            store,
            events: None,
        }
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }
}

#[async_trait]
impl Tool for SaveKnowledgeTool {
    fn name(&self) -> &str {
        "save_knowledge"
    }

    fn description(&self) -> &str {
        "Save a rule, preference, correction or term you were taught so it applies to \
         all future conversations. Use it when staff explicitly tell you to remember something."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        let categories: Vec<&str> = FactCategory::ALL.iter().map(|c| c.as_str()).collect();
        serde_json::json!({
            "type": "object",
            "properties": {
                "fact": {
                    "type": "string",
                    "description": "The knowledge to remember, as a self-contained sentence"
                },
                "category": {
                    "type": "string",
                    "enum": categories,
                    "description": "What kind of knowledge this is"
                }
            },
            "required": ["fact", "category"]
        })
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let fact = arguments["fact"]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'fact' argument".into()))?;
        let category: FactCategory = arguments["category"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'category' argument".into()))?
            .parse()
            .map_err(ToolError::InvalidArguments)?;

        let id = self
            .store
            .append(KnowledgeFact::new(fact, category))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "save_knowledge".into(),
                reason: e.to_string(),
            })?;

        if let Some(bus) = &self.events {
            bus.publish(DomainEvent::KnowledgeSaved {
                category: category.to_string(),
                timestamp: chrono::Utc::now(),
            });
        }

        info!(conversation_id = %ctx.conversation_id, %category, fact_id = %id, "Knowledge saved");

        Ok(ToolResult::ok(format!("Saved as {category}: {fact}"))
            .with_data(serde_json::json!({ "id": id, "category": category.as_str() }))
            .with_side_effect())
    }
}
