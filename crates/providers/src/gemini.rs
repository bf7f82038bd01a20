//! Gemini `generateContent` provider.
//!
//! Speaks the REST form of the Generative Language API:
//! `POST {base}/models/{model}:generateContent` with the key in the
//! `x-goog-api-key` header.
//!
//! Supports:
//! - System instruction and multi-turn contents
//! - Inline base64 media parts
//! - Function declarations, function calls and function responses
//!
//! Error classification follows the backend's conventions: HTTP 429 or a
//! `RESOURCE_EXHAUSTED` status in the error body is quota exhaustion, which
//! the orchestrator treats as account-wide.

use async_trait::async_trait;
use casewise_core::error::ProviderError;
use casewise_core::provider::*;
use casewise_core::tool::ToolCall;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A Gemini REST provider. The credential travels with each request.
pub struct GeminiProvider {
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Convert a request into the API body.
    fn to_api_request(request: &ProviderRequest) -> ApiRequest {
        ApiRequest {
            system_instruction: (!request.system_instruction.is_empty()).then(|| ApiContent {
                role: None,
                parts: vec![ApiPart::text(&request.system_instruction)],
            }),
            contents: request.contents.iter().map(Self::to_api_content).collect(),
            tools: if request.tools.is_empty() {
                Vec::new()
            } else {
                vec![ApiTool {
                    function_declarations: request
                        .tools
                        .iter()
                        .map(|t| ApiFunctionDeclaration {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.parameters.clone(),
                        })
                        .collect(),
                }]
            },
            generation_config: ApiGenerationConfig {
                temperature: request.temperature,
            },
        }
    }

    fn to_api_content(content: &Content) -> ApiContent {
        let role = match content.role {
            ContentRole::User => "user",
            ContentRole::Model => "model",
        };
        ApiContent {
            role: Some(role.into()),
            parts: content
                .parts
                .iter()
                .map(|part| match part {
                    Part::Text { text } => ApiPart::text(text),
                    Part::InlineData { mime_type, data } => ApiPart {
                        inline_data: Some(ApiInlineData {
                            mime_type: mime_type.clone(),
                            data: data.clone(),
                        }),
                        ..ApiPart::default()
                    },
                    Part::FunctionCall { name, args } => ApiPart {
                        function_call: Some(ApiFunctionCall {
                            name: name.clone(),
                            args: args.clone(),
                        }),
                        ..ApiPart::default()
                    },
                    Part::FunctionResponse { name, response } => ApiPart {
                        function_response: Some(ApiFunctionResponse {
                            name: name.clone(),
                            response: response.clone(),
                        }),
                        ..ApiPart::default()
                    },
                })
                .collect(),
        }
    }

    /// Turn a decoded body into a provider response.
    fn from_api_response(
        requested_model: &str,
        api: ApiResponse,
    ) -> Result<ProviderResponse, ProviderError> {
        let candidate = api.candidates.into_iter().next().ok_or_else(|| {
            let reason = api
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".into());
            ProviderError::MalformedResponse(format!("empty response: {reason}"))
        })?;

        let content = candidate.content.ok_or_else(|| {
            ProviderError::MalformedResponse(format!(
                "candidate without content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for (i, part) in content.parts.into_iter().enumerate() {
            if let Some(t) = part.text {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&t);
            }
            if let Some(fc) = part.function_call {
                tool_calls.push(ToolCall {
                    id: format!("gemini_call_{i}"),
                    name: fc.name,
                    arguments: fc.args,
                });
            }
        }

        if text.trim().is_empty() && tool_calls.is_empty() {
            return Err(ProviderError::MalformedResponse(format!(
                "candidate with neither text nor function calls (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        let usage = api.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(ProviderResponse {
            text: (!text.is_empty()).then_some(text),
            tool_calls,
            usage,
            model: api
                .model_version
                .unwrap_or_else(|| requested_model.to_string()),
        })
    }
}

/// Map a non-success HTTP status and body to a provider error.
fn classify_error(status: u16, body: &str) -> ProviderError {
    let api_error = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .map(|e| e.error);
    let message = api_error
        .as_ref()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());
    let exhausted = api_error
        .as_ref()
        .and_then(|e| e.status.as_deref())
        .is_some_and(|s| s == "RESOURCE_EXHAUSTED");

    match status {
        429 => ProviderError::QuotaExceeded(message),
        _ if exhausted => ProviderError::QuotaExceeded(message),
        401 | 403 => ProviderError::AuthenticationFailed(message),
        _ => ProviderError::Api {
            status_code: status,
            message,
        },
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = self.endpoint(&request.model);
        let body = Self::to_api_request(&request);

        debug!(
            model = %request.model,
            credential = %request.credential,
            contents = request.contents.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", request.credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, model = %request.model, "Gemini returned error");
            return Err(classify_error(status, &error_body));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        Self::from_api_response(&request.model, api_response)
    }
}

// --- Gemini API wire types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent>,
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<ApiInlineData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<ApiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<ApiFunctionResponse>,
}

impl ApiPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiTool {
    function_declarations: Vec<ApiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct ApiFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ApiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    usage_metadata: Option<ApiUsage>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    prompt_feedback: Option<ApiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use casewise_core::credential::Credential;

    fn request(contents: Vec<Content>) -> ProviderRequest {
        ProviderRequest {
            credential: Credential::new("AIzaSy-test-key-000000000000"),
            model: "gemini-2.5-flash".into(),
            system_instruction: "Seja breve.".into(),
            contents,
            tools: vec![ToolDefinition {
                name: "save_knowledge".into(),
                description: "Persist a fact".into(),
                parameters: serde_json::json!({"type": "object"}),
            }],
            temperature: 0.8,
        }
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let provider = GeminiProvider::new("https://example.test/v1beta/");
        assert_eq!(
            provider.endpoint("gemini-2.0-flash"),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn request_body_shape() {
        let user = Content {
            role: ContentRole::User,
            parts: vec![
                Part::Text {
                    text: "segue o laudo".into(),
                },
                Part::InlineData {
                    mime_type: "image/jpeg".into(),
                    data: "/9j/4AAQ".into(),
                },
            ],
        };
        let body = serde_json::to_value(GeminiProvider::to_api_request(&request(vec![
            Content::user_text("Oi"),
            Content::model_text("Olá!"),
            user,
        ])))
        .unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Seja breve.");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "save_knowledge"
        );
        let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.8).abs() < 1e-6);
        // Unset optional parts are not serialized
        assert!(body["contents"][0]["parts"][0].get("inlineData").is_none());
    }

    #[test]
    fn function_exchange_serializes() {
        let body = serde_json::to_value(GeminiProvider::to_api_request(&request(vec![
            Content {
                role: ContentRole::Model,
                parts: vec![Part::FunctionCall {
                    name: "save_knowledge".into(),
                    args: serde_json::json!({"fact": "x", "category": "preference"}),
                }],
            },
            Content {
                role: ContentRole::User,
                parts: vec![Part::FunctionResponse {
                    name: "save_knowledge".into(),
                    response: serde_json::json!({"success": true}),
                }],
            },
        ])))
        .unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["functionCall"]["args"]["fact"], "x");
        assert_eq!(
            body["contents"][1]["parts"][0]["functionResponse"]["response"]["success"],
            true
        );
    }

    #[test]
    fn parses_text_and_function_calls() {
        let api: ApiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Vou avisar a equipe."},
                        {"functionCall": {"name": "notify_team", "args": {"clientName": "Ana"}}}
                    ]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 12, "totalTokenCount": 132},
            "modelVersion": "gemini-2.5-flash-001"
        }))
        .unwrap();

        let resp = GeminiProvider::from_api_response("gemini-2.5-flash", api).unwrap();
        assert_eq!(resp.text.as_deref(), Some("Vou avisar a equipe."));
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].name, "notify_team");
        assert_eq!(resp.tool_calls[0].arguments["clientName"], "Ana");
        assert_eq!(resp.usage.unwrap().total_tokens, 132);
        assert_eq!(resp.model, "gemini-2.5-flash-001");
    }

    #[test]
    fn function_call_only_has_no_text() {
        let api: ApiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"functionCall": {"name": "save_knowledge", "args": {}}}
            ]}}]
        }))
        .unwrap();
        let resp = GeminiProvider::from_api_response("m", api).unwrap();
        assert!(resp.text.is_none());
        assert_eq!(resp.model, "m");
    }

    #[test]
    fn empty_candidates_are_malformed() {
        let api: ApiResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let err = GeminiProvider::from_api_response("m", api).unwrap_err();
        match err {
            ProviderError::MalformedResponse(msg) => assert!(msg.contains("SAFETY")),
            other => panic!("Expected MalformedResponse, got: {other:?}"),
        }
    }

    #[test]
    fn candidate_without_parts_is_malformed() {
        let api: ApiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"role": "model"}, "finishReason": "MAX_TOKENS"}]
        }))
        .unwrap();
        let err = GeminiProvider::from_api_response("m", api).unwrap_err();
        match err {
            ProviderError::MalformedResponse(msg) => assert!(msg.contains("MAX_TOKENS")),
            other => panic!("Expected MalformedResponse, got: {other:?}"),
        }
    }

    #[test]
    fn blank_text_only_is_malformed() {
        let api: ApiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "  \n"}]}}]
        }))
        .unwrap();
        let err = GeminiProvider::from_api_response("m", api).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
        assert!(!err.is_quota());
    }

    #[test]
    fn classify_quota_errors() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded for metric","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = classify_error(429, body);
        assert!(matches!(err, ProviderError::QuotaExceeded(ref m) if m.contains("Quota exceeded")));
        assert!(err.is_quota());

        // Some deployments surface exhaustion with a different status
        let err = classify_error(400, body);
        assert!(err.is_quota());
    }

    #[test]
    fn classify_other_errors() {
        assert!(matches!(
            classify_error(403, r#"{"error":{"message":"API key not valid","status":"PERMISSION_DENIED"}}"#),
            ProviderError::AuthenticationFailed(_)
        ));
        let err = classify_error(503, "upstream connect error");
        match &err {
            ProviderError::Api {
                status_code,
                message,
            } => {
                assert_eq!(*status_code, 503);
                assert_eq!(message, "upstream connect error");
            }
            other => panic!("Expected Api, got: {other:?}"),
        }
        assert!(!err.is_quota());
    }
}
