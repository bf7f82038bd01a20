//! Shared test helpers for orchestrator tests.

use casewise_core::error::ProviderError;
use casewise_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use casewise_core::tool::ToolCall;
use std::collections::VecDeque;
use std::sync::Mutex;

/// What the scripted provider does on one call.
pub enum Step {
    Respond(ProviderResponse),
    Fail(ProviderError),
    /// Never answer; only a timeout ends the call.
    Hang,
}

/// A mock provider that plays a script, one step per `complete` call,
/// and records every request it receives.
///
/// Panics if more calls are made than steps provided.
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// (credential, model) of every request, in order.
    pub fn attempts(&self) -> Vec<(String, String)> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.credential.expose().to_string(), r.model.clone()))
            .collect()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let step = {
            self.requests.lock().unwrap().push(request.clone());
            let mut steps = self.steps.lock().unwrap();
            steps.pop_front().unwrap_or_else(|| {
                panic!(
                    "ScriptedProvider: no more steps (call #{})",
                    self.requests.lock().unwrap().len()
                )
            })
        };

        match step {
            Step::Respond(response) => Ok(ProviderResponse {
                model: request.model,
                ..response
            }),
            Step::Fail(error) => Err(error),
            Step::Hang => std::future::pending().await,
        }
    }
}

/// A plain text response (no tool calls).
pub fn text(text: &str) -> Step {
    Step::Respond(ProviderResponse {
        text: Some(text.to_string()),
        tool_calls: vec![],
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: String::new(),
    })
}

/// A response carrying tool calls, with optional accompanying text.
pub fn calls(text: Option<&str>, calls: Vec<(&str, serde_json::Value)>) -> Step {
    Step::Respond(ProviderResponse {
        text: text.map(String::from),
        tool_calls: calls
            .into_iter()
            .enumerate()
            .map(|(i, (name, arguments))| ToolCall {
                id: format!("call_{i}"),
                name: name.to_string(),
                arguments,
            })
            .collect(),
        usage: None,
        model: String::new(),
    })
}

/// A successful response with neither text nor calls.
pub fn empty() -> Step {
    Step::Respond(ProviderResponse::default())
}

pub fn timeout() -> Step {
    Step::Fail(ProviderError::Timeout("deadline exceeded".into()))
}

pub fn quota() -> Step {
    Step::Fail(ProviderError::QuotaExceeded("RESOURCE_EXHAUSTED".into()))
}

pub fn server_error() -> Step {
    Step::Fail(ProviderError::Api {
        status_code: 503,
        message: "model overloaded".into(),
    })
}
