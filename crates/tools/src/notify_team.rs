//! `notify_team`: hands a triaged case to human staff.
//!
//! The model calls this once it has gathered enough to brief a lawyer.
//! Delivery goes through the configured [`Notifier`]; on success a System
//! turn summarizing the report is appended to the conversation transcript,
//! where operators see it and the client does not.
//!
//! Models sometimes emit the call twice for one triage event, so repeats
//! within [`NOTIFY_DEBOUNCE`] of the last successful delivery for the same
//! conversation are no-ops. The slot is claimed before delivery starts, so
//! overlapping turns of one conversation cannot both deliver; a failed
//! delivery gives the claim back.

use async_trait::async_trait;
use casewise_core::error::ToolError;
use casewise_core::event::{DomainEvent, EventBus};
use casewise_core::message::{ConversationId, Turn};
use casewise_core::notify::{Notifier, TriageReport, Urgency};
use casewise_core::tool::{Tool, ToolContext, ToolResult};
use casewise_core::transcript::TranscriptStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Minimum spacing between two deliveries for one conversation.
pub const NOTIFY_DEBOUNCE: Duration = Duration::from_secs(5);

pub struct NotifyTeamTool {
    notifier: Arc<dyn Notifier>,
    transcript: Arc<dyn TranscriptStore>,
    recipients: Vec<String>,
    events: Option<Arc<EventBus>>,
    last_delivery: Mutex<HashMap<ConversationId, Slot>>,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    InFlight,
    DeliveredAt(Instant),
}

impl NotifyTeamTool {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        transcript: Arc<dyn TranscriptStore>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            notifier,
            transcript,
            recipients,
            events: None,
            last_delivery: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Reserve the delivery slot for a conversation.
    ///
    /// On success returns the previous slot state, to be restored if the
    /// delivery fails. Otherwise returns the message for the model.
    fn claim(&self, conversation_id: &ConversationId) -> Result<Option<Slot>, &'static str> {
        let mut map = self
            .last_delivery
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = map.get(conversation_id).copied();
        match previous {
            Some(Slot::InFlight) => Err("The team is already being notified about this case."),
            Some(Slot::DeliveredAt(at)) if at.elapsed() < NOTIFY_DEBOUNCE => {
                Err("The team was already notified about this case moments ago.")
            }
            _ => {
                map.insert(conversation_id.clone(), Slot::InFlight);
                Ok(previous)
            }
        }
    }

    fn settle(&self, conversation_id: &ConversationId, slot: Option<Slot>) {
        let mut map = self
            .last_delivery
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot {
            Some(slot) => map.insert(conversation_id.clone(), slot),
            None => map.remove(conversation_id),
        };
    }
}

fn required_str<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

fn optional_str(arguments: &serde_json::Value, key: &str) -> Option<String> {
    arguments[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[async_trait]
impl Tool for NotifyTeamTool {
    fn name(&self) -> &str {
        "notify_team"
    }

    fn description(&self) -> &str {
        "Notify the legal team that a client case is ready for review. Call this once, \
         after you have collected the client's name, the benefit involved and a summary \
         of the situation."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "clientName": {
                    "type": "string",
                    "description": "The client's name"
                },
                "benefitType": {
                    "type": "string",
                    "description": "The benefit or legal matter involved (e.g. BPC/LOAS, retirement, sick pay)"
                },
                "summary": {
                    "type": "string",
                    "description": "A short summary of the client's situation"
                },
                "missingDocs": {
                    "type": "string",
                    "description": "Documents the client still needs to provide"
                },
                "urgency": {
                    "type": "string",
                    "enum": ["HIGH", "MEDIUM", "LOW"],
                    "description": "How quickly the team should look at the case"
                },
                "analysis": {
                    "type": "string",
                    "description": "Your preliminary assessment of the case"
                }
            },
            "required": ["clientName", "benefitType", "summary", "urgency"]
        })
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        arguments: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let client_name = required_str(&arguments, "clientName")?;
        let benefit_type = required_str(&arguments, "benefitType")?;
        let summary = required_str(&arguments, "summary")?;
        let urgency: Urgency = required_str(&arguments, "urgency")?
            .parse()
            .map_err(ToolError::InvalidArguments)?;

        let previous = match self.claim(&ctx.conversation_id) {
            Ok(previous) => previous,
            Err(message) => {
                info!(conversation_id = %ctx.conversation_id, "Duplicate notify_team call ignored");
                return Ok(ToolResult::ok(message));
            }
        };

        let report = TriageReport {
            conversation_id: ctx.conversation_id.clone(),
            client_name: client_name.to_string(),
            benefit_type: benefit_type.to_string(),
            summary: summary.to_string(),
            missing_docs: optional_str(&arguments, "missingDocs"),
            urgency,
            analysis: optional_str(&arguments, "analysis"),
            recipients: self.recipients.clone(),
            created_at: chrono::Utc::now(),
        };

        if let Err(e) = self.notifier.deliver(&report).await {
            self.settle(&ctx.conversation_id, previous);
            warn!(
                conversation_id = %ctx.conversation_id,
                notifier = self.notifier.name(),
                error = %e,
                "Triage notification failed"
            );
            return Ok(ToolResult::failed(format!(
                "Could not notify the team: {e}"
            )));
        }

        self.settle(&ctx.conversation_id, Some(Slot::DeliveredAt(Instant::now())));

        if let Err(e) = self
            .transcript
            .append(&ctx.conversation_id, Turn::system(report.transcript_note()))
            .await
        {
            warn!(conversation_id = %ctx.conversation_id, error = %e, "Failed to record triage note");
        }

        if let Some(bus) = &self.events {
            bus.publish(DomainEvent::CaseTriaged {
                conversation_id: ctx.conversation_id.to_string(),
                client_name: report.client_name.clone(),
                timestamp: report.created_at,
            });
        }

        info!(
            conversation_id = %ctx.conversation_id,
            client = %report.client_name,
            urgency = urgency.as_str(),
            "Case handed to the team"
        );

        let data = serde_json::to_value(&report)
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "notify_team".into(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult::ok(format!(
            "The team has been notified about {}.",
            report.client_name
        ))
        .with_data(data)
        .with_side_effect())
    }
}
