//! System instruction composition.
//!
//! The instruction is the persona followed by context blocks, each a
//! `## Heading` with its body, separated by blank lines. Only the
//! "Current context" block is mandatory; the others are left out entirely
//! when they have nothing to say.

use casewise_core::knowledge::KnowledgeFact;
use casewise_core::session::{ClientClassification, SessionContext};

/// Build the system instruction for one turn.
///
/// Facts are rendered in the order given (the store returns them oldest
/// first). There is no size cap here; callers that want one trim `facts`.
pub fn compose(persona: &str, session: &SessionContext, facts: &[KnowledgeFact]) -> String {
    let mut sections = vec![persona.trim().to_string()];

    sections.push(section("Current context", &current_context(session)));

    if !facts.is_empty() {
        let rules = facts
            .iter()
            .map(|f| format!("- [{}] {}", f.category, f.content.trim()))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(section("Learned rules", &rules));
    }

    if let Some(summary) = non_blank(session.known_summary.as_deref()) {
        sections.push(section("Known case summary", summary));
    }

    if let Some(status) = non_blank(session.case_status.as_deref()) {
        sections.push(section("Case status", status));
    }

    sections.join("\n\n")
}

fn current_context(session: &SessionContext) -> String {
    let mut line = match session.classification {
        ClientClassification::Returning => "This is a returning client.".to_string(),
        ClientClassification::New => "This is a new client.".to_string(),
    };
    if let Some(name) = non_blank(session.client_name.as_deref()) {
        line.push_str(&format!(" Client name: {name}."));
    }
    line
}

fn section(heading: &str, body: &str) -> String {
    format!("## {heading}\n{body}")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
