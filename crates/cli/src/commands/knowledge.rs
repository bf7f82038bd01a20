//! `casewise knowledge`: List or add learned rules.

use casewise_config::AppConfig;
use casewise_core::knowledge::{FactCategory, KnowledgeFact, KnowledgeStore};
use casewise_memory::FileKnowledge;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum KnowledgeAction {
    /// Show every stored fact, oldest first
    List,

    /// Store a new fact
    Add {
        /// preference, legal_rule, correction or vocabulary
        #[arg(short, long)]
        category: FactCategory,

        /// The fact itself
        text: String,
    },
}

pub async fn run(action: KnowledgeAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = FileKnowledge::new(config.storage.knowledge_path());

    match action {
        KnowledgeAction::List => {
            let facts = store.all().await?;
            if facts.is_empty() {
                println!("No knowledge stored yet ({}).", store.path().display());
                return Ok(());
            }
            for fact in &facts {
                println!("{}", render_fact(fact));
            }
            println!("\n{} fact(s)", facts.len());
        }
        KnowledgeAction::Add { category, text } => {
            let text = text.trim();
            if text.is_empty() {
                return Err("fact text must not be empty".into());
            }
            let id = store.append(KnowledgeFact::new(text, category)).await?;
            println!("✅ Saved {category} fact {id}");
        }
    }

    Ok(())
}

fn render_fact(fact: &KnowledgeFact) -> String {
    format!(
        "{}  [{}] {}",
        fact.created_at.format("%Y-%m-%d %H:%M"),
        fact.category,
        fact.content
    )
}
