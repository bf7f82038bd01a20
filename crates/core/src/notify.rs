//! Notifier trait: delivery of triage reports to human staff.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::message::ConversationId;

/// How quickly staff should look at a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::High => "HIGH",
            Urgency::Medium => "MEDIUM",
            Urgency::Low => "LOW",
        }
    }
}

impl std::str::FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Ok(Urgency::High),
            "MEDIUM" => Ok(Urgency::Medium),
            "LOW" => Ok(Urgency::Low),
            other => Err(format!("unknown urgency '{other}', expected HIGH, MEDIUM or LOW")),
        }
    }
}

/// A structured case hand-off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageReport {
    pub conversation_id: ConversationId,
    pub client_name: String,
    pub benefit_type: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_docs: Option<String>,
    pub urgency: Urgency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TriageReport {
    /// Operator-facing summary, used as the synthetic transcript entry.
    pub fn transcript_note(&self) -> String {
        let mut note = format!(
            "[TRIAGE {}] {} | {}\n{}",
            self.urgency.as_str(),
            self.client_name,
            self.benefit_type,
            self.summary
        );
        if let Some(docs) = &self.missing_docs {
            note.push_str(&format!("\nMissing documents: {docs}"));
        }
        if let Some(analysis) = &self.analysis {
            note.push_str(&format!("\nAnalysis: {analysis}"));
        }
        note
    }
}

/// A delivery channel for triage reports (webhook, log, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver a report. Completes only when delivery finished or failed.
    async fn deliver(&self, report: &TriageReport) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> TriageReport {
        TriageReport {
            conversation_id: ConversationId::from("c1"),
            client_name: "João".into(),
            benefit_type: "aposentadoria por invalidez".into(),
            summary: "Laudo recente, pedido negado".into(),
            missing_docs: Some("CNIS".into()),
            urgency: Urgency::High,
            analysis: None,
            recipients: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn urgency_parses_case_insensitively() {
        assert_eq!("high".parse::<Urgency>().unwrap(), Urgency::High);
        assert_eq!(" Low ".parse::<Urgency>().unwrap(), Urgency::Low);
        assert!("urgent".parse::<Urgency>().is_err());
    }

    #[test]
    fn transcript_note_includes_optional_fields() {
        let note = report().transcript_note();
        assert!(note.starts_with("[TRIAGE HIGH] João"));
        assert!(note.contains("Missing documents: CNIS"));
        assert!(!note.contains("Analysis:"));
    }

    #[test]
    fn urgency_serializes_uppercase() {
        let json = serde_json::to_string(&report()).unwrap();
        assert!(json.contains("\"HIGH\""));
    }
}
