//! Webhook notifier.
//!
//! POSTs each triage report as JSON to a staff endpoint (chat bot, ticketing
//! system, mail relay). When a shared secret is configured the body is signed
//! with HMAC-SHA256 and the hex digest sent as
//! `X-Casewise-Signature: sha256=<hex>`, so the receiver can verify origin.

use async_trait::async_trait;
use casewise_core::error::NotifyError;
use casewise_core::notify::{Notifier, TriageReport};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Casewise-Signature";

pub struct WebhookNotifier {
    url: String,
    shared_secret: Option<String>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, shared_secret: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self {
            url: url.into(),
            shared_secret: shared_secret.filter(|s| !s.is_empty()),
            client,
        }
    }

    /// `sha256=<hex>` signature of `payload`, or `None` without a secret.
    pub fn sign(&self, payload: &[u8]) -> Option<String> {
        let secret = self.shared_secret.as_ref()?;
        // HMAC accepts keys of any length, so this never fails in practice.
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(payload);
        Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, report: &TriageReport) -> Result<(), NotifyError> {
        let body = serde_json::to_vec(report).map_err(|e| NotifyError::DeliveryFailed {
            target: self.url.clone(),
            reason: format!("failed to encode report: {e}"),
        })?;

        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(signature) = self.sign(&body) {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| NotifyError::DeliveryFailed {
                target: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::DeliveryFailed {
                target: self.url.clone(),
                reason: format!("endpoint returned {status}"),
            });
        }

        debug!(url = %self.url, client = %report.client_name, "Triage report delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casewise_core::message::ConversationId;
    use casewise_core::notify::Urgency;

    #[test]
    fn no_secret_means_no_signature() {
        let notifier = WebhookNotifier::new("https://hooks.example.org", None);
        assert!(notifier.sign(b"{}").is_none());

        let notifier = WebhookNotifier::new("https://hooks.example.org", Some(String::new()));
        assert!(notifier.sign(b"{}").is_none());
    }

    #[test]
    fn signature_is_verifiable_hmac() {
        let notifier = WebhookNotifier::new("https://hooks.example.org", Some("s3cret".into()));
        let payload = br#"{"client_name":"Ana"}"#;
        let signature = notifier.sign(payload).unwrap();
        let hex_digest = signature.strip_prefix("sha256=").unwrap();
        assert_eq!(hex_digest.len(), 64);

        let mut mac = HmacSha256::new_from_slice(b"s3cret").unwrap();
        mac.update(payload);
        assert!(mac.verify_slice(&hex::decode(hex_digest).unwrap()).is_ok());
    }

    #[test]
    fn different_payloads_sign_differently() {
        let notifier = WebhookNotifier::new("https://hooks.example.org", Some("k".into()));
        assert_ne!(notifier.sign(b"a"), notifier.sign(b"b"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_delivery_failure() {
        // Port 9 (discard) on localhost is closed on test machines.
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/triage", None);
        let report = TriageReport {
            conversation_id: ConversationId::from("c1"),
            client_name: "Ana".into(),
            benefit_type: "BPC".into(),
            summary: "s".into(),
            missing_docs: None,
            urgency: Urgency::Low,
            analysis: None,
            recipients: vec![],
            created_at: chrono::Utc::now(),
        };
        let err = notifier.deliver(&report).await.unwrap_err();
        assert!(matches!(err, NotifyError::DeliveryFailed { .. }));
    }
}
