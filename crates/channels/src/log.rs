//! Log-only notifier: writes triage reports to the tracing output.
//!
//! The default for local runs where no staff endpoint exists.

use async_trait::async_trait;
use casewise_core::error::NotifyError;
use casewise_core::notify::{Notifier, TriageReport};
use tracing::info;

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, report: &TriageReport) -> Result<(), NotifyError> {
        info!(
            conversation_id = %report.conversation_id,
            client = %report.client_name,
            benefit = %report.benefit_type,
            urgency = report.urgency.as_str(),
            recipients = ?report.recipients,
            "Triage report"
        );
        Ok(())
    }
}
