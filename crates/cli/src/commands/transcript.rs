//! `casewise transcript`: Show a stored conversation.
//!
//! Operator-only System turns (triage notes) are shown tagged `[operator]`.

use casewise_config::AppConfig;
use casewise_core::message::{ConversationId, Role, Turn};
use casewise_core::transcript::TranscriptStore;
use casewise_memory::FileTranscript;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum TranscriptAction {
    /// Print every turn of a conversation
    Show {
        /// Conversation ID
        id: String,
    },
}

pub async fn run(action: TranscriptAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = FileTranscript::new(config.storage.transcript_dir());

    match action {
        TranscriptAction::Show { id } => {
            let turns = store.load(&ConversationId::from(&id)).await?;
            if turns.is_empty() {
                println!("No transcript for conversation {id}.");
                return Ok(());
            }
            for turn in &turns {
                println!("{}", render_turn(turn));
            }
        }
    }

    Ok(())
}

fn render_turn(turn: &Turn) -> String {
    let speaker = match turn.role {
        Role::User => "client",
        Role::Model => "assistant",
        Role::System => "[operator]",
    };
    let time = turn.timestamp.format("%Y-%m-%d %H:%M:%S");
    match &turn.media {
        Some(media) => format!("{time}  {speaker}: {} {}", media.placeholder(), turn.text),
        None => format!("{time}  {speaker}: {}", turn.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casewise_core::message::MediaAttachment;

    #[test]
    fn system_turns_are_tagged_operator() {
        let line = render_turn(&Turn::system("[TRIAGE HIGH] Maria | BPC"));
        assert!(line.contains("[operator]: [TRIAGE HIGH] Maria"));
    }

    #[test]
    fn media_turns_show_placeholder() {
        let mut turn = Turn::user("segue");
        turn.media = Some(MediaAttachment::new("image/png", "AAAA"));
        assert!(render_turn(&turn).ends_with("client: [media attachment: image/png] segue"));
    }
}
