//! Error types for the Casewise domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Casewise operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Notification errors ---
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of a single request against the language-model backend.
///
/// The orchestrator only distinguishes two classes: quota exhaustion, which
/// is account-wide, and everything else, which is tied to one model.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether this failure signals an exhausted account quota.
    ///
    /// Some backends report quota exhaustion with a generic status and a
    /// marker in the body, so the message is inspected as well.
    pub fn is_quota(&self) -> bool {
        match self {
            ProviderError::QuotaExceeded(_) => true,
            ProviderError::Api {
                status_code,
                message,
            } => *status_code == 429 || mentions_quota(message),
            _ => false,
        }
    }
}

fn mentions_quota(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("resource_exhausted") || lower.contains("quota")
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notifier not configured: {0}")]
    NotConfigured(String),

    #[error("Notification delivery failed to {target}: {reason}")]
    DeliveryFailed { target: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::Api {
            status_code: 503,
            message: "Service Unavailable".into(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("Service Unavailable"));
    }

    #[test]
    fn quota_classification() {
        assert!(ProviderError::QuotaExceeded("daily limit".into()).is_quota());
        assert!(
            ProviderError::Api {
                status_code: 429,
                message: "Too many requests".into(),
            }
            .is_quota()
        );
        assert!(
            ProviderError::Api {
                status_code: 400,
                message: "RESOURCE_EXHAUSTED: project quota".into(),
            }
            .is_quota()
        );
        assert!(!ProviderError::Timeout("20s".into()).is_quota());
        assert!(!ProviderError::Network("reset".into()).is_quota());
        assert!(
            !ProviderError::Api {
                status_code: 500,
                message: "Internal".into(),
            }
            .is_quota()
        );
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::ExecutionFailed {
            tool_name: "notify_team".into(),
            reason: "webhook unreachable".into(),
        });
        assert!(err.to_string().contains("notify_team"));
        assert!(err.to_string().contains("webhook"));
    }
}
