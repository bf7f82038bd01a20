//! Staff notification channels for Casewise.
//!
//! Every channel implements `casewise_core::Notifier`. The configured one is
//! picked by [`build_from_config`].

pub mod log;
pub mod webhook;

pub use log::LogNotifier;
pub use webhook::WebhookNotifier;

use casewise_config::{NotifierKind, NotifyConfig};
use casewise_core::error::NotifyError;
use casewise_core::notify::Notifier;
use std::sync::Arc;

/// Build the notifier selected in configuration.
pub fn build_from_config(config: &NotifyConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match config.kind {
        NotifierKind::Log => Ok(Arc::new(LogNotifier)),
        NotifierKind::Webhook => {
            let url = config.webhook_url.clone().ok_or_else(|| {
                NotifyError::NotConfigured("notify.webhook_url is not set".into())
            })?;
            Ok(Arc::new(WebhookNotifier::new(url, config.shared_secret.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_log_notifier() {
        let notifier = build_from_config(&NotifyConfig::default()).unwrap();
        assert_eq!(notifier.name(), "log");
    }

    #[test]
    fn webhook_without_url_is_not_configured() {
        let config = NotifyConfig {
            kind: NotifierKind::Webhook,
            ..NotifyConfig::default()
        };
        assert!(matches!(
            build_from_config(&config),
            Err(NotifyError::NotConfigured(_))
        ));
    }

    #[test]
    fn webhook_config_builds_webhook_notifier() {
        let config = NotifyConfig {
            kind: NotifierKind::Webhook,
            webhook_url: Some("https://hooks.example.org/triage".into()),
            ..NotifyConfig::default()
        };
        assert_eq!(build_from_config(&config).unwrap().name(), "webhook");
    }
}
