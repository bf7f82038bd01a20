//! The conversation orchestrator.
//!
//! `converse` turns one user message into one reply. It walks the
//! [`AttemptPlan`](casewise_core::cascade::AttemptPlan) strictly one attempt
//! at a time, racing each against [`ATTEMPT_TIMEOUT`]. A quota failure skips
//! the rest of that credential's models; any other failure moves on to the
//! next model. The first attempt that answers wins.
//!
//! Tool calls in an answer are executed in order and their results sent
//! back for a continuation. From the first executed tool on, the attempt is
//! committed: a failed continuation ends the turn with whatever the model
//! already said, and the cascade is not resumed, so a tool never fires twice
//! for one user message.
//!
//! Backend error detail never reaches the caller. It is logged and published
//! as [`DomainEvent::AttemptFailed`].

use std::sync::Arc;
use std::time::Duration;

use casewise_core::cascade::ModelCascade;
use casewise_core::credential::CredentialPool;
use casewise_core::error::ProviderError;
use casewise_core::event::{DomainEvent, EventBus};
use casewise_core::knowledge::{KnowledgeFact, KnowledgeStore};
use casewise_core::message::{ConversationId, Role, Turn, TurnContent};
use casewise_core::provider::{
    Content, ContentRole, DEFAULT_TEMPERATURE, Part, Provider, ProviderRequest, ProviderResponse,
};
use casewise_core::session::SessionContext;
use casewise_core::tool::{ToolCall, ToolContext, ToolRegistry, ToolResult};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::prompt::compose;

/// How many past turns the model sees.
pub const HISTORY_WINDOW: usize = 20;

/// Upper bound on one backend request, tool continuations included.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(20);

/// Tool executions allowed in a single turn.
pub const MAX_TOOL_CALLS_PER_TURN: usize = 8;

pub const NO_CREDENTIALS_MESSAGE: &str = "O atendimento automático ainda não está configurado. \
Por favor, entre em contato com o escritório por telefone.";

pub const FALLBACK_MESSAGE: &str = "Desculpe, estou com dificuldade para responder agora. \
Pode enviar sua mensagem de novo daqui a pouco?";

/// Invoked with `(tool_name, arguments)` whenever a tool reports a side effect.
pub type SideEffectFn<'a> = dyn Fn(&str, &serde_json::Value) + Send + Sync + 'a;

/// Everything `converse` needs about the turn being answered.
#[derive(Debug, Clone, Copy)]
pub struct ConverseRequest<'a> {
    pub conversation_id: &'a ConversationId,
    /// Prior turns, oldest first. May contain operator-only System turns.
    pub history: &'a [Turn],
    pub turn: &'a TurnContent,
    pub persona: &'a str,
    pub session: &'a SessionContext,
}

/// Outcome of one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The model answered with user-visible text.
    Answer(String),
    /// The model only called tools and said nothing.
    Silent,
    /// No credential is configured; nothing was sent.
    Unconfigured,
    /// Every (credential, model) attempt failed.
    Exhausted,
}

impl Reply {
    /// The text to show the user, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Answer(text) => Some(text),
            Reply::Silent => None,
            Reply::Unconfigured => Some(NO_CREDENTIALS_MESSAGE),
            Reply::Exhausted => Some(FALLBACK_MESSAGE),
        }
    }

    /// Whether the caller should append a model turn to the transcript.
    pub fn is_model_turn(&self) -> bool {
        matches!(self, Reply::Answer(_))
    }
}

pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    pool: CredentialPool,
    cascade: ModelCascade,
    tools: Arc<ToolRegistry>,
    knowledge: Arc<dyn KnowledgeStore>,
    event_bus: Arc<EventBus>,
    temperature: f32,
    max_facts: Option<usize>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        pool: CredentialPool,
        cascade: ModelCascade,
        tools: Arc<ToolRegistry>,
        knowledge: Arc<dyn KnowledgeStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            pool,
            cascade,
            tools,
            knowledge,
            event_bus,
            temperature: DEFAULT_TEMPERATURE,
            max_facts: None,
        }
    }

    /// Inject only the most recent `limit` facts into the prompt.
    pub fn with_max_facts(mut self, limit: Option<usize>) -> Self {
        self.max_facts = limit;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Answer one user turn. Never fails: errors become [`Reply::Exhausted`].
    pub async fn converse(
        &self,
        request: &ConverseRequest<'_>,
        on_side_effect: &SideEffectFn<'_>,
    ) -> Reply {
        let conversation_id = request.conversation_id;

        if self.pool.is_empty() {
            warn!(%conversation_id, "No credentials configured");
            return Reply::Unconfigured;
        }
        if request.turn.is_empty() {
            debug!(%conversation_id, "Empty turn, nothing to send");
            return Reply::Silent;
        }

        let facts = self.load_facts().await;
        let system_instruction = compose(request.persona, request.session, &facts);
        let contents = model_view(request.history, request.turn);
        let tools = self.tools.definitions();

        let mut plan = self.cascade.plan(self.pool.shuffled());
        let mut attempts = 0;

        while let Some(attempt) = plan.next() {
            attempts = attempt.number;
            let provider_request = ProviderRequest {
                credential: attempt.credential.clone(),
                model: attempt.model.clone(),
                system_instruction: system_instruction.clone(),
                contents: contents.clone(),
                tools: tools.clone(),
                temperature: self.temperature,
            };

            let outcome = self.send(provider_request.clone()).await.and_then(|response| {
                if response.is_empty() {
                    Err(ProviderError::MalformedResponse(
                        "response with neither text nor function calls".into(),
                    ))
                } else {
                    Ok(response)
                }
            });

            match outcome {
                Ok(response) => {
                    info!(
                        %conversation_id,
                        credential = %attempt.credential,
                        model = %attempt.model,
                        attempt = attempt.number,
                        "Model answered"
                    );
                    let (reply, tokens_used) = self
                        .follow_through(conversation_id, provider_request, response, on_side_effect)
                        .await;
                    self.event_bus.publish(DomainEvent::ResponseGenerated {
                        conversation_id: conversation_id.to_string(),
                        model: attempt.model,
                        attempts,
                        tokens_used,
                        timestamp: Utc::now(),
                    });
                    return reply;
                }
                Err(e) => {
                    let quota = e.is_quota();
                    warn!(
                        %conversation_id,
                        credential = %attempt.credential,
                        model = %attempt.model,
                        attempt = attempt.number,
                        quota,
                        error = %e,
                        "Attempt failed"
                    );
                    self.event_bus.publish(DomainEvent::AttemptFailed {
                        conversation_id: conversation_id.to_string(),
                        model: attempt.model,
                        attempt: attempts,
                        quota,
                        error_message: e.to_string(),
                        timestamp: Utc::now(),
                    });
                    if quota {
                        plan.abandon_credential();
                    }
                }
            }
        }

        error!(%conversation_id, attempts, "Every credential and model failed");
        self.event_bus.publish(DomainEvent::CascadeExhausted {
            conversation_id: conversation_id.to_string(),
            attempts,
            timestamp: Utc::now(),
        });
        Reply::Exhausted
    }

    async fn load_facts(&self) -> Vec<KnowledgeFact> {
        let mut facts = match self.knowledge.all().await {
            Ok(facts) => facts,
            Err(e) => {
                warn!(error = %e, "Knowledge unavailable, composing without learned rules");
                return Vec::new();
            }
        };

        if let Some(limit) = self.max_facts {
            if facts.len() > limit {
                let left_out = facts.len() - limit;
                warn!(left_out, limit, "Knowledge exceeds the prompt limit, oldest facts left out");
                facts.drain(..left_out);
            }
        }
        facts
    }

    /// One backend request, raced against the attempt timeout. A response
    /// arriving after the deadline is dropped with the future.
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        match tokio::time::timeout(ATTEMPT_TIMEOUT, self.provider.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "no response within {}s",
                ATTEMPT_TIMEOUT.as_secs()
            ))),
        }
    }

    /// Run the tool loop on a successful answer. Returns the reply and the
    /// tokens spent on the whole exchange.
    async fn follow_through(
        &self,
        conversation_id: &ConversationId,
        mut request: ProviderRequest,
        first: ProviderResponse,
        on_side_effect: &SideEffectFn<'_>,
    ) -> (Reply, u32) {
        let ctx = ToolContext::new(conversation_id.clone());
        let mut tokens = tokens_of(&first);
        let mut last_text = first.visible_text().map(String::from);
        let mut response = first;
        let mut executed = 0;

        loop {
            let mut answered: Vec<&ToolCall> = Vec::new();
            let mut results = Vec::new();

            for call in &response.tool_calls {
                if self.tools.get(&call.name).is_none() {
                    warn!(%conversation_id, tool = %call.name, "Ignoring call to unregistered tool");
                    continue;
                }
                if executed >= MAX_TOOL_CALLS_PER_TURN {
                    warn!(
                        %conversation_id,
                        tool = %call.name,
                        limit = MAX_TOOL_CALLS_PER_TURN,
                        "Tool call limit reached, skipping"
                    );
                    continue;
                }
                executed += 1;
                let result = self.execute_tool(&ctx, call, on_side_effect).await;
                results.push(Part::FunctionResponse {
                    name: call.name.clone(),
                    response: result.to_response(),
                });
                answered.push(call);
            }

            if results.is_empty() {
                break;
            }

            request.contents.push(response.to_content(&answered));
            request.contents.push(Content {
                role: ContentRole::User,
                parts: results,
            });

            match self.send(request.clone()).await {
                Ok(next) => {
                    tokens += tokens_of(&next);
                    if let Some(text) = next.visible_text() {
                        last_text = Some(text.to_string());
                    }
                    response = next;
                }
                Err(e) => {
                    warn!(
                        %conversation_id,
                        model = %request.model,
                        error = %e,
                        "Tool continuation failed, keeping what the model already said"
                    );
                    break;
                }
            }
        }

        let reply = match last_text {
            Some(text) => Reply::Answer(text),
            None => Reply::Silent,
        };
        (reply, tokens)
    }

    async fn execute_tool(
        &self,
        ctx: &ToolContext,
        call: &ToolCall,
        on_side_effect: &SideEffectFn<'_>,
    ) -> ToolResult {
        let started = std::time::Instant::now();
        let result = match self.tools.execute(ctx, call).await {
            Ok(result) => result,
            Err(e) => {
                warn!(conversation_id = %ctx.conversation_id, tool = %call.name, error = %e, "Tool failed");
                ToolResult::failed(e.to_string())
            }
        };

        debug!(
            tool = %call.name,
            success = result.success,
            side_effect = result.side_effect,
            "Tool executed"
        );
        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: call.name.clone(),
            success: result.success,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });

        if result.side_effect {
            on_side_effect(&call.name, &call.arguments);
        }
        result
    }
}

fn tokens_of(response: &ProviderResponse) -> u32 {
    response.usage.as_ref().map_or(0, |u| u.total_tokens)
}

/// The conversation as the model sees it: recent non-System turns, older
/// media reduced to placeholders, and the new turn with its attachment.
fn model_view(history: &[Turn], turn: &TurnContent) -> Vec<Content> {
    let visible: Vec<&Turn> = history.iter().filter(|t| t.role != Role::System).collect();
    let start = visible.len().saturating_sub(HISTORY_WINDOW);

    let mut contents: Vec<Content> = visible[start..]
        .iter()
        .filter_map(|t| {
            let text = t.history_text();
            if text.trim().is_empty() {
                return None;
            }
            Some(match t.role {
                Role::Model => Content::model_text(text),
                _ => Content::user_text(text),
            })
        })
        .collect();

    let mut parts = Vec::new();
    if let Some(media) = &turn.media {
        parts.push(Part::InlineData {
            mime_type: media.mime_type.clone(),
            data: media.data_base64.clone(),
        });
    }
    if let Some(text) = turn.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        parts.push(Part::Text {
            text: text.to_string(),
        });
    }
    contents.push(Content {
        role: ContentRole::User,
        parts,
    });
    contents
}
