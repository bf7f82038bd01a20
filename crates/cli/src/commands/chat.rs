//! `casewise chat`: Single-message or interactive conversation.
//!
//! This is the caller layer around the orchestrator: it owns the durable
//! transcript and the session context. The user turn is always recorded;
//! a model turn only when the orchestrator produced an answer.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use base64::Engine;
use casewise_agent::{ConverseRequest, Orchestrator, Reply};
use casewise_config::AppConfig;
use casewise_core::cascade::ModelCascade;
use casewise_core::event::EventBus;
use casewise_core::knowledge::KnowledgeStore;
use casewise_core::message::{ConversationId, MediaAttachment, Turn, TurnContent};
use casewise_core::session::SessionContext;
use casewise_core::transcript::TranscriptStore;
use casewise_memory::{FileKnowledge, FileTranscript};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

pub struct ChatArgs {
    pub message: Option<String>,
    pub conversation: Option<String>,
    pub returning: bool,
    pub name: Option<String>,
    pub media: Option<PathBuf>,
    pub api_key: Option<String>,
}

pub async fn run(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let persona = config.persona()?;
    let pool = config.credential_pool(args.api_key.as_deref());
    debug!(credentials = ?pool.ordered(), models = ?config.models, "Credential pool loaded");

    if pool.is_empty() {
        eprintln!();
        eprintln!("  WARNING: No API key configured. Replies will be the fixed setup message.");
        eprintln!("  Set GEMINI_API_KEY or add api_keys to:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
    }

    let knowledge: Arc<dyn KnowledgeStore> =
        Arc::new(FileKnowledge::new(config.storage.knowledge_path()));
    let transcript: Arc<dyn TranscriptStore> =
        Arc::new(FileTranscript::new(config.storage.transcript_dir()));
    let notifier = casewise_channels::build_from_config(&config.notify)?;
    let event_bus = Arc::new(EventBus::default());

    let tools = Arc::new(casewise_tools::default_registry(
        knowledge.clone(),
        transcript.clone(),
        notifier,
        config.notify.recipients.clone(),
        Some(event_bus.clone()),
    ));
    let provider = Arc::new(casewise_providers::build_from_config(&config));
    let orchestrator = Orchestrator::new(
        provider,
        pool,
        ModelCascade::new(config.models.iter().cloned()),
        tools,
        knowledge,
        event_bus,
    )
    .with_temperature(config.temperature)
    .with_max_facts(config.max_facts_in_prompt);

    let conversation_id = args
        .conversation
        .as_deref()
        .map(ConversationId::from)
        .unwrap_or_default();
    let mut session = if args.returning {
        SessionContext::returning()
    } else {
        SessionContext::default()
    };
    session.client_name = args.name;
    let session = Mutex::new(session);

    let mut media = args.media.as_deref().map(load_media).transpose()?;

    let chat = Chat {
        orchestrator: &orchestrator,
        transcript: transcript.as_ref(),
        conversation_id: &conversation_id,
        persona: &persona,
        session: &session,
    };

    if let Some(msg) = args.message {
        let reply = chat.take_turn(turn_content(msg, media.take())).await?;
        print_reply(&reply);
        return Ok(());
    }

    println!();
    println!("  Casewise — Interactive Mode");
    println!("  Conversation: {conversation_id}");
    println!("  Models:       {}", config.models.join(" → "));
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line == "exit" || line == "quit" {
            break;
        }
        if line.is_empty() && media.is_none() {
            prompt()?;
            continue;
        }
        let reply = chat.take_turn(turn_content(line, media.take())).await?;
        print_reply(&reply);
        prompt()?;
    }

    info!(%conversation_id, "Chat ended");
    Ok(())
}

/// One conversation as seen by the caller layer.
struct Chat<'a> {
    orchestrator: &'a Orchestrator,
    transcript: &'a dyn TranscriptStore,
    conversation_id: &'a ConversationId,
    persona: &'a str,
    session: &'a Mutex<SessionContext>,
}

impl Chat<'_> {
    async fn take_turn(&self, content: TurnContent) -> Result<Reply, Box<dyn std::error::Error>> {
        let history = self.transcript.load(self.conversation_id).await?;
        self.transcript
            .append(self.conversation_id, content.clone().into_user_turn())
            .await?;

        let session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        let request = ConverseRequest {
            conversation_id: self.conversation_id,
            history: &history,
            turn: &content,
            persona: self.persona,
            session: &session,
        };

        let on_side_effect = |tool: &str, arguments: &serde_json::Value| {
            if tool == "notify_team" {
                let client = arguments["clientName"].as_str().unwrap_or_default();
                self.session
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .mark_triaged(client);
                eprintln!("  [team notified about {client}]");
            } else if tool == "save_knowledge" {
                eprintln!("  [knowledge saved]");
            }
        };

        let reply = self.orchestrator.converse(&request, &on_side_effect).await;

        if reply.is_model_turn() {
            if let Some(text) = reply.text() {
                self.transcript
                    .append(self.conversation_id, Turn::model(text))
                    .await?;
            }
        }
        Ok(reply)
    }
}

fn turn_content(text: String, media: Option<MediaAttachment>) -> TurnContent {
    let mut content = TurnContent::text(text);
    if let Some(media) = media {
        content = content.with_media(media);
    }
    content
}

fn print_reply(reply: &Reply) {
    if let Some(text) = reply.text() {
        println!("\n  Casewise > {text}\n");
    }
}

fn prompt() -> std::io::Result<()> {
    use std::io::Write;
    print!("  You > ");
    std::io::stdout().flush()
}

/// Read a file as a base64 attachment, guessing the MIME type from its extension.
fn load_media(path: &Path) -> Result<MediaAttachment, Box<dyn std::error::Error>> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(MediaAttachment::new(
        mime_for(path),
        base64::engine::general_purpose::STANDARD.encode(bytes),
    ))
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "ogg" | "opus" => "audio/ogg",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for(Path::new("laudo.PDF")), "application/pdf");
        assert_eq!(mime_for(Path::new("foto.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("audio.opus")), "audio/ogg");
        assert_eq!(mime_for(Path::new("README")), "application/octet-stream");
    }

    #[test]
    fn media_is_base64_encoded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doc.png");
        std::fs::write(&path, b"hi").unwrap();

        let media = load_media(&path).unwrap();
        assert_eq!(media.mime_type, "image/png");
        assert_eq!(media.data_base64, "aGk=");
    }

    #[test]
    fn missing_media_file_is_an_error() {
        assert!(load_media(Path::new("/nonexistent/laudo.pdf")).is_err());
    }
}
