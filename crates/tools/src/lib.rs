//! Model-invocable tools for Casewise.
//!
//! Two tools are exposed to the model:
//! - `notify_team` hands a triaged case to human staff
//! - `save_knowledge` records a rule or preference taught during a session
//!
//! Both report `side_effect = true` on success so the orchestrator can tell
//! its caller what happened.

pub mod notify_team;
pub mod save_knowledge;

pub use notify_team::{NOTIFY_DEBOUNCE, NotifyTeamTool};
pub use save_knowledge::SaveKnowledgeTool;

use casewise_core::event::EventBus;
use casewise_core::knowledge::KnowledgeStore;
use casewise_core::notify::Notifier;
use casewise_core::tool::ToolRegistry;
use casewise_core::transcript::TranscriptStore;
use std::sync::Arc;

/// Create the registry with both tools, `notify_team` first.
pub fn default_registry(
    knowledge: Arc<dyn KnowledgeStore>,
    transcript: Arc<dyn TranscriptStore>,
    notifier: Arc<dyn Notifier>,
    recipients: Vec<String>,
    events: Option<Arc<EventBus>>,
) -> ToolRegistry {
    let mut notify = NotifyTeamTool::new(notifier, transcript, recipients);
    let mut save = SaveKnowledgeTool::new(knowledge);
    if let Some(bus) = events {
        notify = notify.with_events(bus.clone());
        save = save.with_events(bus);
    }

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(notify));
    registry.register(Box::new(save));
    registry
}
